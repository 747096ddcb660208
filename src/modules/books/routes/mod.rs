//! HTTP handlers for `/api/books`.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        OriginalUri, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use libris_http::error::AppError;

use super::models::{Book, BookId, BookRequest};
use super::service::BookService;

/// Routes relative to the module mount point.
pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .with_state(service)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(service): State<BookService>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(service.get_all_books().await?))
}

/// Responds `201 Created` with a `Location` pointing at the new book.
async fn create_book(
    State(service): State<BookService>,
    OriginalUri(uri): OriginalUri,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let id = service.create_new_book(request).await?;

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]))
}

async fn get_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    Ok(Json(service.get_book_by_id(id).await?))
}

async fn update_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
    payload: Result<Json<BookRequest>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    Ok(Json(service.update_book(id, request).await?))
}

async fn delete_book(
    State(service): State<BookService>,
    id: Result<Path<BookId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    service.delete_book_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
