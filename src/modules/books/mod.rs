pub mod models;
pub mod repository;
pub mod routes;
pub mod service;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;

pub use service::{BookError, BookService};

use repository::SqliteBookRepository;

/// Book catalogue module: CRUD endpoints over the `books` table.
pub struct BooksModule {
    service: BookService,
}

impl BooksModule {
    pub fn new(service: BookService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        schema_migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Table creation for the books module.
pub(crate) fn schema_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_create_books",
        up: r#"
            CREATE TABLE IF NOT EXISTS books (
                id     INTEGER PRIMARY KEY AUTOINCREMENT,
                title  TEXT NOT NULL CHECK (title <> ''),
                author TEXT NOT NULL CHECK (author <> ''),
                isbn   TEXT NOT NULL CHECK (isbn <> '' AND length(isbn) <= 20)
            );
            "#,
    }]
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn book_body(schema: &str) -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": format!("#/components/schemas/{schema}") }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let id_parameter = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    });
    let book_response = |description: &str| {
        json!({
            "description": description,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        })
    };

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "List of books",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/Book" }
                                    }
                                }
                            }
                        },
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": book_body("BookRequest"),
                    "responses": {
                        "201": {
                            "description": "Book created; `Location` points at it",
                            "headers": {
                                "Location": { "schema": { "type": "string" } }
                            }
                        },
                        "400": error_response("Invalid book request"),
                        "500": error_response("Internal server error")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "responses": {
                        "200": book_response("The book"),
                        "404": error_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's title, author and ISBN",
                    "tags": ["Books"],
                    "parameters": [id_parameter.clone()],
                    "requestBody": book_body("BookRequest"),
                    "responses": {
                        "200": book_response("The updated book"),
                        "400": error_response("Invalid book request"),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter],
                    "responses": {
                        "204": { "description": "Deleted, or already absent" }
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "isbn": { "type": "string", "maxLength": 20 }
                    },
                    "required": ["id", "title", "author", "isbn"]
                },
                "BookRequest": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "isbn": { "type": "string", "minLength": 1, "maxLength": 20 }
                    },
                    "required": ["title", "author", "isbn"]
                }
            }
        }
    })
}

/// Create the books module backed by the given pool
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    let repository = Arc::new(SqliteBookRepository::new(pool));
    Arc::new(BooksModule::new(BookService::new(repository)))
}
