use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{BookMutation, BookRepository, RepositoryError};
use crate::modules::books::models::{Book, BookId, NewBook};

/// Process-local repository backed by an ordered map.
#[derive(Default)]
pub struct InMemoryBookRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.state.lock().await.books.values().cloned().collect())
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.state.lock().await.books.get(&id).cloned())
    }

    async fn save(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let book = Book {
            id: state.last_id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
        };
        state.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn modify(
        &self,
        id: BookId,
        mutation: BookMutation,
    ) -> Result<Option<Book>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(book) = state.books.get_mut(&id) else {
            return Ok(None);
        };

        mutation(book);
        book.id = id;
        Ok(Some(book.clone()))
    }

    async fn delete_by_id(&self, id: BookId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.books.remove(&id).is_some())
    }
}
