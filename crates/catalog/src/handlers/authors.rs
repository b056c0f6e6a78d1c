//! Author listing and management handlers

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
    db::{models::Author, Repository},
    errors::{AppError, Result},
    metrics,
    pagination::{Page, PageQuery},
};

/// Author fields exposed to clients
#[derive(Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<NaiveDate>,
}

impl From<Author> for AuthorResponse {
    fn from(author: Author) -> Self {
        Self {
            display_name: author.display_name(),
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
        }
    }
}

/// Author detail with their books
#[derive(Serialize)]
pub struct AuthorDetailResponse {
    #[serde(flatten)]
    pub author: AuthorResponse,
    pub books: Vec<AuthorBook>,
}

#[derive(Serialize)]
pub struct AuthorBook {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
}

/// Fields of the author create/update form, enumerated explicitly
#[derive(Debug, Deserialize, Validate)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100))]
    pub last_name: String,

    pub date_of_birth: Option<NaiveDate>,

    pub date_of_death: Option<NaiveDate>,
}

/// List all authors, ten per page
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<AuthorResponse>>> {
    let repo = Repository::new(state.db.clone());
    let page_size = state.config.catalog.page_size;

    let (authors, total) = repo.list_authors(query.page_index(), page_size).await?;

    let page = Page::new(authors, query.page(), page_size, total).map(AuthorResponse::from);
    Ok(Json(page))
}

/// Author detail page
pub async fn author_detail(
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> Result<Json<AuthorDetailResponse>> {
    let repo = Repository::new(state.db.clone());

    let author = repo
        .find_author_by_id(author_id)
        .await?
        .ok_or_else(|| AppError::AuthorNotFound {
            id: author_id.to_string(),
        })?;

    let books = repo
        .books_by_author(author_id)
        .await?
        .into_iter()
        .map(|b| AuthorBook {
            id: b.id,
            title: b.title,
            summary: b.summary,
        })
        .collect();

    Ok(Json(AuthorDetailResponse {
        author: author.into(),
        books,
    }))
}

/// Create an author
pub async fn create_author(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(form): Json<AuthorForm>,
) -> Result<(StatusCode, Json<AuthorResponse>)> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    form.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let author = repo
        .create_author(
            form.first_name,
            form.last_name,
            form.date_of_birth,
            form.date_of_death,
        )
        .await?;

    metrics::record_catalog_write("author", "create");
    tracing::info!(author_id = %author.id, user = %auth.username, "Author created");

    Ok((StatusCode::CREATED, Json(author.into())))
}

/// Update an author
pub async fn update_author(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(author_id): Path<Uuid>,
    Json(form): Json<AuthorForm>,
) -> Result<Json<AuthorResponse>> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    form.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let author = repo
        .update_author(
            author_id,
            form.first_name,
            form.last_name,
            form.date_of_birth,
            form.date_of_death,
        )
        .await?;

    metrics::record_catalog_write("author", "update");

    Ok(Json(author.into()))
}

/// Delete an author. Refused with 409 while the author still owns books.
pub async fn delete_author(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(author_id): Path<Uuid>,
) -> Result<StatusCode> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    let repo = Repository::new(state.db.clone());

    let deleted = repo.delete_author(author_id).await?;
    if !deleted {
        return Err(AppError::AuthorNotFound {
            id: author_id.to_string(),
        });
    }

    metrics::record_catalog_write("author", "delete");
    tracing::info!(author_id = %author_id, user = %auth.username, "Author deleted");

    Ok(StatusCode::NO_CONTENT)
}
