//! Catalog landing page handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use lendstack_common::{
    db::{CatalogCounts, Repository},
    errors::Result,
};

/// Landing page summary
#[derive(Serialize)]
pub struct IndexResponse {
    pub num_books: u64,
    pub num_copies: u64,
    pub num_copies_available: u64,
    pub num_authors: u64,
}

impl From<CatalogCounts> for IndexResponse {
    fn from(counts: CatalogCounts) -> Self {
        Self {
            num_books: counts.books,
            num_copies: counts.copies,
            num_copies_available: counts.copies_available,
            num_authors: counts.authors,
        }
    }
}

/// Counts of the main catalog objects
pub async fn index(State(state): State<AppState>) -> Result<Json<IndexResponse>> {
    let repo = Repository::new(state.db.clone());
    let counts = repo.catalog_counts().await?;
    Ok(Json(counts.into()))
}
