use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{BookMutation, BookRepository, RepositoryError};
use crate::modules::books::models::{Book, BookId, NewBook};

/// Repository over the `books` table.
#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn find_all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn find_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let book =
            sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(book)
    }

    async fn save(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let saved = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author, isbn) VALUES (?, ?, ?)
             RETURNING id, title, author, isbn",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn modify(
        &self,
        id: BookId,
        mutation: BookMutation,
    ) -> Result<Option<Book>, RepositoryError> {
        // Take the write lock before reading, so concurrent writers queue on
        // the busy timeout instead of failing to upgrade a read lock.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let Some(mut book) =
            sqlx::query_as::<_, Book>("SELECT id, title, author, isbn FROM books WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
            // dropping the transaction rolls it back
            return Ok(None);
        };

        mutation(&mut book);
        book.id = id;

        sqlx::query("UPDATE books SET title = ?, author = ?, isbn = ? WHERE id = ?")
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(book))
    }

    async fn delete_by_id(&self, id: BookId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
