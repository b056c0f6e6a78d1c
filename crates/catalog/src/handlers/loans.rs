//! Loan handlers: the caller's borrowed copies, copy administration, and
//! the librarian renewal workflow.
//!
//! The renewal endpoints mirror a form exchange: a rejected submission is a
//! 200 response that redisplays the form with the offending field's message
//! attached, while an accepted one persists the new due date and redirects
//! to the catalog landing page.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use lendstack_common::{
    auth::{AuthContext, SCOPE_MANAGE_CATALOG, SCOPE_MANAGE_LOANS},
    db::{
        models::{BookInstance, LoanStatus},
        CopyChanges, NewCopy, Repository,
    },
    errors::{AppError, Result},
    loans::{proposed_renewal_date, validate_renewal_date, RENEWAL_DATE_FIELD},
    metrics,
    pagination::{Page, PageQuery},
};

/// Where an accepted renewal sends the librarian
const RENEWAL_SUCCESS_PATH: &str = "/catalog/";

/// One borrowed copy in the "my books" listing
#[derive(Serialize)]
pub struct BorrowedCopy {
    pub id: Uuid,
    pub book_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_title: Option<String>,
    pub imprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
    pub status: String,
}

/// Copy summary shown above the renewal form
#[derive(Serialize)]
pub struct CopySummary {
    pub id: Uuid,
    pub book_id: Uuid,
    pub imprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
    pub status: String,
}

impl From<BookInstance> for CopySummary {
    fn from(copy: BookInstance) -> Self {
        Self {
            id: copy.id,
            book_id: copy.book_id,
            imprint: copy.imprint,
            due_back: copy.due_back,
            status: copy.status,
        }
    }
}

/// The renewal form as redisplayed to the caller
#[derive(Serialize)]
pub struct RenewForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// Renewal form response, for both the initial display and a rejection
#[derive(Serialize)]
pub struct RenewFormResponse {
    pub book_instance: CopySummary,
    pub form: RenewForm,
}

/// Renewal submission
#[derive(Debug, Deserialize)]
pub struct RenewRequest {
    /// Candidate due date; absent means the field was left blank
    pub renewal_date: Option<NaiveDate>,
}

/// Fields of the copy create form
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCopyRequest {
    pub book_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub imprint: String,

    #[serde(default = "default_copy_status")]
    pub status: LoanStatus,

    pub due_back: Option<NaiveDate>,

    pub borrower_id: Option<Uuid>,
}

fn default_copy_status() -> LoanStatus {
    LoanStatus::Maintenance
}

/// Fields of the administrative copy edit form
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCopyRequest {
    #[validate(length(min = 1, max = 200))]
    pub imprint: String,

    pub status: LoanStatus,

    pub due_back: Option<NaiveDate>,

    pub borrower_id: Option<Uuid>,
}

/// Outcome of checking one renewal submission against the window rule
fn check_submission(
    today: NaiveDate,
    candidate: Option<NaiveDate>,
) -> std::result::Result<NaiveDate, String> {
    let Some(candidate) = candidate else {
        return Err("This field is required.".to_string());
    };

    validate_renewal_date(today, candidate)
        .map(|_| candidate)
        .map_err(|e| e.to_string())
}

fn form_with_error(
    copy: BookInstance,
    submitted: Option<NaiveDate>,
    message: String,
) -> RenewFormResponse {
    let mut errors = BTreeMap::new();
    errors.insert(RENEWAL_DATE_FIELD.to_string(), message);

    RenewFormResponse {
        book_instance: copy.into(),
        form: RenewForm {
            renewal_date: submitted,
            errors,
        },
    }
}

/// Copies the caller currently has on loan, soonest due first
pub async fn my_borrowed_books(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BorrowedCopy>>> {
    let repo = Repository::new(state.db.clone());
    let page_size = state.config.catalog.page_size;

    let (loans, total) = repo
        .loans_for_borrower(auth.user_id, query.page_index(), page_size)
        .await?;

    let page = Page::new(loans, query.page(), page_size, total).map(|(copy, book)| BorrowedCopy {
        id: copy.id,
        book_id: copy.book_id,
        book_title: book.map(|b| b.title),
        imprint: copy.imprint,
        due_back: copy.due_back,
        status: copy.status,
    });

    Ok(Json(page))
}

/// Display the renewal form, prefilled three weeks out
pub async fn renew_form(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(copy_id): Path<Uuid>,
) -> Result<Json<RenewFormResponse>> {
    // Capability check comes before the existence check, so an unprivileged
    // caller learns nothing about which copy ids exist
    auth.require_scope(SCOPE_MANAGE_LOANS)?;

    let repo = Repository::new(state.db.clone());
    let copy = repo
        .find_copy_by_id(copy_id)
        .await?
        .ok_or_else(|| AppError::CopyNotFound {
            id: copy_id.to_string(),
        })?;

    let today = chrono::Utc::now().date_naive();

    Ok(Json(RenewFormResponse {
        book_instance: copy.into(),
        form: RenewForm {
            renewal_date: Some(proposed_renewal_date(today)),
            errors: BTreeMap::new(),
        },
    }))
}

/// Process a renewal submission
pub async fn renew_copy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(copy_id): Path<Uuid>,
    Json(request): Json<RenewRequest>,
) -> Result<Response> {
    auth.require_scope(SCOPE_MANAGE_LOANS)?;

    let repo = Repository::new(state.db.clone());
    let copy = repo
        .find_copy_by_id(copy_id)
        .await?
        .ok_or_else(|| AppError::CopyNotFound {
            id: copy_id.to_string(),
        })?;

    let today = chrono::Utc::now().date_naive();

    match check_submission(today, request.renewal_date) {
        Ok(due_back) => {
            repo.renew_copy(copy_id, due_back).await?;

            metrics::record_renewal("accepted");
            tracing::info!(
                copy_id = %copy_id,
                due_back = %due_back,
                librarian = %auth.username,
                "Loan renewed"
            );

            Ok((StatusCode::FOUND, [(header::LOCATION, RENEWAL_SUCCESS_PATH)]).into_response())
        }
        Err(message) => {
            // The record stays untouched; the form comes back with the
            // message attached to the date field
            metrics::record_renewal("rejected");
            tracing::info!(copy_id = %copy_id, error = %message, "Renewal rejected");

            let body = form_with_error(copy, request.renewal_date, message);
            Ok((StatusCode::OK, Json(body)).into_response())
        }
    }
}

/// Register a new copy of a book
pub async fn create_copy(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateCopyRequest>,
) -> Result<(StatusCode, Json<CopySummary>)> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let copy = repo
        .create_copy(NewCopy {
            book_id: request.book_id,
            imprint: request.imprint,
            status: request.status,
            due_back: request.due_back,
            borrower_id: request.borrower_id,
        })
        .await?;

    metrics::record_catalog_write("copy", "create");
    tracing::info!(copy_id = %copy.id, user = %auth.username, "Copy registered");

    Ok((StatusCode::CREATED, Json(copy.into())))
}

/// Administrative edit of a copy's loan state
pub async fn update_copy(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(copy_id): Path<Uuid>,
    Json(request): Json<UpdateCopyRequest>,
) -> Result<Json<CopySummary>> {
    auth.require_scope(SCOPE_MANAGE_CATALOG)?;

    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());
    let copy = repo
        .update_copy(
            copy_id,
            CopyChanges {
                imprint: request.imprint,
                status: request.status,
                due_back: request.due_back,
                borrower_id: request.borrower_id,
            },
        )
        .await?;

    metrics::record_catalog_write("copy", "update");

    Ok(Json(copy.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    }

    #[test]
    fn test_missing_date_is_a_field_error() {
        let outcome = check_submission(today(), None);
        assert_eq!(outcome, Err("This field is required.".to_string()));
    }

    #[test]
    fn test_past_date_keeps_exact_message() {
        let candidate = today().checked_sub_days(Days::new(7)).unwrap();
        let outcome = check_submission(today(), Some(candidate));
        assert_eq!(outcome, Err("Invalid date - renewal in past".to_string()));
    }

    #[test]
    fn test_five_weeks_ahead_keeps_exact_message() {
        let candidate = today().checked_add_days(Days::new(35)).unwrap();
        let outcome = check_submission(today(), Some(candidate));
        assert_eq!(
            outcome,
            Err("Invalid date - renewal more than 4 weeks ahead".to_string())
        );
    }

    #[test]
    fn test_two_weeks_ahead_accepted() {
        let candidate = today().checked_add_days(Days::new(14)).unwrap();
        assert_eq!(check_submission(today(), Some(candidate)), Ok(candidate));
    }

    #[test]
    fn test_resubmitting_accepted_date_accepted_again() {
        let candidate = today().checked_add_days(Days::new(21)).unwrap();
        assert_eq!(check_submission(today(), Some(candidate)), Ok(candidate));
        assert_eq!(check_submission(today(), Some(candidate)), Ok(candidate));
    }

    #[test]
    fn test_error_attaches_to_renewal_date_field() {
        let copy = BookInstance {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            imprint: "Unlikely Imprint, 2016".to_string(),
            due_back: Some(today()),
            borrower_id: Some(Uuid::new_v4()),
            status: String::from(LoanStatus::OnLoan),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        };

        let submitted = today().checked_sub_days(Days::new(1)).unwrap();
        let response = form_with_error(
            copy,
            Some(submitted),
            "Invalid date - renewal in past".to_string(),
        );

        assert_eq!(response.form.renewal_date, Some(submitted));
        assert_eq!(
            response.form.errors.get(RENEWAL_DATE_FIELD).map(String::as_str),
            Some("Invalid date - renewal in past")
        );

        // The wire form carries the message under the field name, and a
        // clean form carries no "errors" key at all
        let rejected = serde_json::to_value(&response).unwrap();
        assert_eq!(
            rejected["form"]["errors"][RENEWAL_DATE_FIELD],
            "Invalid date - renewal in past"
        );

        let clean = serde_json::to_value(RenewForm {
            renewal_date: Some(submitted),
            errors: BTreeMap::new(),
        })
        .unwrap();
        assert!(clean.get("errors").is_none());
    }
}
