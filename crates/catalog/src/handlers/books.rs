//! Book listing and management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use lendstack_common::{
    auth::{AuthContext, SCOPE_MANAGE_CATALOG},
    db::{models::Book, BookChanges, BookDetail, NewBook, Repository},
    errors::{AppError, Result},
    metrics,
    pagination::{Page, PageQuery},
};

/// Book fields exposed in listings
#[derive(Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_id: Option<Uuid>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author_id: book.author_id,
            language_id: book.language_id,
        }
    }
}

/// Book detail with author, genres, language and per-copy loan state
#[derive(Serialize)]
pub struct BookDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: BookAuthor,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub copies: Vec<CopyResponse>,
}

#[derive(Serialize)]
pub struct BookAuthor {
    pub id: Uuid,
    pub display_name: String,
}

#[derive(Serialize)]
pub struct CopyResponse {
    pub id: Uuid,
    pub imprint: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
}

impl From<BookDetail> for BookDetailResponse {
    fn from(detail: BookDetail) -> Self {
        Self {
            id: detail.book.id,
            title: detail.book.title,
            summary: detail.book.summary,
            isbn: detail.book.isbn,
            author: BookAuthor {
                id: detail.author.id,
                display_name: detail.author.display_name(),
            },
            genres: detail.genres.into_iter().map(|g| g.name).collect(),
            language: detail.language.map(|l| l.name),
            copies: detail
                .copies
                .into_iter()
                .map(|c| CopyResponse {
                    id: c.id,
                    imprint: c.imprint,
                    status: c.status,
                    due_back: c.due_back,
                })
                .collect(),
        }
    }
}

/// Fields of the book create form, enumerated explicitly
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 1000))]
    pub summary: String,

    #[validate(length(min = 1, max = 13))]
    pub isbn: String,

    pub author_id: Uuid,

    pub language_id: Option<Uuid>,

    #[serde(default)]
    pub genre_ids: Vec<Uuid>,
}

/// Fields of the book edit form. The ISBN is immutable once assigned and
/// cannot be submitted here.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 1000))]
    pub summary: String,

    pub author_id: Uuid,

    pub language_id: Option<Uuid>,

    #[serde(default)]
    pub genre_ids: Vec<Uuid>,
}

/// List all books, ten per page
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookResponse>>> {
    let repo = Repository::new(state.db.clone());
    let page_size = state.config.catalog.page_size;

    let (books, total) = repo.list_books(query.page_index(), page_size).await?;

    let page = Page::new(books, query.page(), page_size, total).map(BookResponse::from);
    Ok(Json(page))
}

/// Book detail page
pub async fn book_detail(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookDetailResponse>> {
    let repo = Repository::new(state.db.clone());

    let detail = repo
        .book_detail(book_id)
        .await?
        .ok_or_else(|| AppError::BookNotFound {
            id: book_id.to_string(),
        })?;

    Ok(Json(detail.into()))
}

/// Catalogue a new book
pub async fn create_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>)> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let book = repo
        .create_book(NewBook {
            title: request.title,
            summary: request.summary,
            isbn: request.isbn,
            author_id: request.author_id,
            language_id: request.language_id,
            genre_ids: request.genre_ids,
        })
        .await?;

    metrics::record_catalog_write("book", "create");
    tracing::info!(book_id = %book.id, user = %auth.username, "Book catalogued");

    Ok((StatusCode::CREATED, Json(book.into())))
}

/// Update a book
pub async fn update_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<Uuid>,
    Json(request): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let book = repo
        .update_book(
            book_id,
            BookChanges {
                title: request.title,
                summary: request.summary,
                author_id: request.author_id,
                language_id: request.language_id,
                genre_ids: request.genre_ids,
            },
        )
        .await?;

    metrics::record_catalog_write("book", "update");

    Ok(Json(book.into()))
}

/// Delete a book and its copies
pub async fn delete_book(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_book(book_id).await?;
    if !deleted {
        return Err(AppError::BookNotFound {
            id: book_id.to_string(),
        });
    }

    metrics::record_catalog_write("book", "delete");
    tracing::info!(book_id = %book_id, user = %auth.username, "Book deleted");

    Ok(StatusCode::NO_CONTENT)
}
