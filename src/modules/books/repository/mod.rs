//! Persistence seam for books.

mod memory;
mod sqlite;

pub use memory::InMemoryBookRepository;
pub use sqlite::SqliteBookRepository;

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Book, BookId, NewBook};

/// Change applied to a stored book inside [`BookRepository::modify`].
pub type BookMutation = Box<dyn FnOnce(&mut Book) + Send>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError>;

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError>;

    /// Persist a new book and return it with its assigned id.
    async fn save(&self, book: NewBook) -> Result<Book, RepositoryError>;

    /// Look up `id` and apply `mutation` to it as one atomic unit.
    ///
    /// Returns `None`, without side effects, when no book has that id. The
    /// id itself is never changed, whatever the mutation does to it.
    async fn modify(
        &self,
        id: BookId,
        mutation: BookMutation,
    ) -> Result<Option<Book>, RepositoryError>;

    /// Remove the book with `id`, returning whether a book was removed.
    /// Removing an absent id succeeds.
    async fn delete_by_id(&self, id: BookId) -> Result<bool, RepositoryError>;
}

/// Behaviour every repository implementation must share.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    fn new_book(title: &str, isbn: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Duke".to_string(),
            isbn: isbn.to_string(),
        }
    }

    pub async fn save_assigns_fresh_ids(repo: &dyn BookRepository) {
        let first = repo.save(new_book("Java 8", "1232")).await.unwrap();
        let second = repo.save(new_book("Java EE 8", "42")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.title, "Java 8");
        assert_eq!(repo.find_by_id(first.id).await.unwrap(), Some(first.clone()));

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains(&second));
    }

    pub async fn ids_are_not_reused_after_delete(repo: &dyn BookRepository) {
        let first = repo.save(new_book("Java 8", "1232")).await.unwrap();
        repo.delete_by_id(first.id).await.unwrap();
        let second = repo.save(new_book("Java 8", "1232")).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    pub async fn modify_updates_in_place(repo: &dyn BookRepository) {
        let saved = repo.save(new_book("Java 8", "1232")).await.unwrap();

        let modified = repo
            .modify(
                saved.id,
                Box::new(|book: &mut Book| {
                    book.title = "Java 88".to_string();
                    book.id = 999;
                }),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(modified.id, saved.id);
        assert_eq!(modified.title, "Java 88");
        assert_eq!(repo.find_by_id(saved.id).await.unwrap(), Some(modified));
        assert_eq!(repo.find_by_id(999).await.unwrap(), None);
    }

    pub async fn modify_absent_is_none(repo: &dyn BookRepository) {
        let result = repo
            .modify(42, Box::new(|book: &mut Book| book.title.clear()))
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    pub async fn delete_is_idempotent(repo: &dyn BookRepository) {
        let saved = repo.save(new_book("Java 8", "1232")).await.unwrap();

        assert!(repo.delete_by_id(saved.id).await.unwrap());
        assert!(!repo.delete_by_id(saved.id).await.unwrap());
        assert!(!repo.delete_by_id(12345).await.unwrap());

        assert_eq!(repo.find_by_id(saved.id).await.unwrap(), None);
    }

    /// Many read-modify-write calls racing over a few books: every call
    /// succeeds and none of them loses another's change.
    pub async fn concurrent_modifications_are_serialised(repo: Arc<dyn BookRepository>) {
        const BOOKS: usize = 8;
        const WRITES_PER_BOOK: usize = 20;

        let mut ids = Vec::with_capacity(BOOKS);
        for n in 0..BOOKS {
            let saved = repo.save(new_book("Java 8", &n.to_string())).await.unwrap();
            ids.push(saved.id);
        }

        let mut writes = JoinSet::new();
        for n in 0..BOOKS * WRITES_PER_BOOK {
            let repo = repo.clone();
            let id = ids[n % BOOKS];
            writes.spawn(async move {
                repo.modify(
                    id,
                    Box::new(move |book: &mut Book| {
                        book.title = format!("edition {n}");
                        book.author.push('+');
                    }),
                )
                .await
            });
        }

        while let Some(joined) = writes.join_next().await {
            let modified = joined.unwrap().unwrap();
            assert!(modified.is_some());
        }

        for (slot, id) in ids.iter().enumerate() {
            let book = repo.find_by_id(*id).await.unwrap().unwrap();
            assert_eq!(book.author, format!("Duke{}", "+".repeat(WRITES_PER_BOOK)));

            let written: Vec<String> = (0..BOOKS * WRITES_PER_BOOK)
                .filter(|n| n % BOOKS == slot)
                .map(|n| format!("edition {n}"))
                .collect();
            assert!(written.contains(&book.title), "unexpected title {}", book.title);
        }
    }
}
