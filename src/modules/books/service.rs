use std::sync::Arc;

use garde::Validate;
use libris_http::error::AppError;
use serde_json::json;
use thiserror::Error;

use super::models::{Book, BookId, BookRequest, NewBook};
use super::repository::{BookRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum BookError {
    #[error("invalid book request: {0}")]
    Validation(#[from] garde::Report),

    #[error("Book with id: '{0}' not found")]
    NotFound(BookId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        let message = err.to_string();
        match err {
            BookError::Validation(report) => {
                let details = report
                    .iter()
                    .map(|(path, error)| json!({"field": path.to_string(), "error": error.message()}))
                    .collect();
                AppError::validation(details, "invalid book request")
            }
            BookError::NotFound(_) => AppError::not_found(message),
            BookError::Repository(e) => AppError::Internal(e.into()),
        }
    }
}

/// Create/read/update/delete orchestration over a [`BookRepository`].
#[derive(Clone)]
pub struct BookService {
    repository: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        Self { repository }
    }

    /// Validate and store a new book, returning its assigned id.
    pub async fn create_new_book(&self, request: BookRequest) -> Result<BookId, BookError> {
        request.validate()?;

        let book = self.repository.save(NewBook::from(request)).await?;
        tracing::info!(book_id = book.id, "book created");
        Ok(book.id)
    }

    pub async fn get_all_books(&self) -> Result<Vec<Book>, BookError> {
        Ok(self.repository.find_all().await?)
    }

    pub async fn get_book_by_id(&self, id: BookId) -> Result<Book, BookError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(BookError::NotFound(id))
    }

    /// Replace title, author and ISBN of an existing book.
    ///
    /// Lookup and write happen in one repository transaction.
    pub async fn update_book(&self, id: BookId, request: BookRequest) -> Result<Book, BookError> {
        request.validate()?;

        let book = self
            .repository
            .modify(id, Box::new(move |book: &mut Book| book.apply(request)))
            .await?
            .ok_or(BookError::NotFound(id))?;

        tracing::info!(book_id = id, "book updated");
        Ok(book)
    }

    /// Remove a book. Absent ids are a no-op.
    pub async fn delete_book_by_id(&self, id: BookId) -> Result<(), BookError> {
        if self.repository.delete_by_id(id).await? {
            tracing::info!(book_id = id, "book deleted");
        } else {
            tracing::debug!(book_id = id, "delete of absent book ignored");
        }
        Ok(())
    }
}
