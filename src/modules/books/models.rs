use garde::Validate;
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key of a book.
pub type BookId = i64;

/// Persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Identifier assigned by the store on first save; never changes
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl Book {
    /// Overwrite the mutable fields with the ones carried by `request`.
    pub fn apply(&mut self, request: BookRequest) {
        self.title = request.title;
        self.author = request.author;
        self.isbn = request.isbn;
    }
}

/// Book fields ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
}

impl From<BookRequest> for NewBook {
    fn from(request: BookRequest) -> Self {
        Self {
            title: request.title,
            author: request.author,
            isbn: request.isbn,
        }
    }
}

/// Incoming payload for creating or replacing a book.
///
/// Missing members deserialize as empty strings so they surface as
/// validation failures rather than decoding errors. Unknown members,
/// including `id`, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BookRequest {
    #[garde(length(chars, min = 1))]
    pub title: String,
    #[garde(length(chars, min = 1, max = 20))]
    pub isbn: String,
    #[garde(length(chars, min = 1))]
    pub author: String,
}

impl BookRequest {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            isbn: isbn.into(),
            author: author.into(),
        }
    }
}
