//! Book instance entity - one lend-able physical copy of a book
//!
//! Primary keys are random UUIDs rather than sequential ids so loan records
//! cannot be enumerated through the renewal URL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Loan status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "maintenance" => LoanStatus::Maintenance,
            "on_loan" => LoanStatus::OnLoan,
            "available" => LoanStatus::Available,
            "reserved" => LoanStatus::Reserved,
            _ => LoanStatus::Maintenance,
        }
    }
}

impl From<LoanStatus> for String {
    fn from(status: LoanStatus) -> Self {
        match status {
            LoanStatus::Maintenance => "maintenance".to_string(),
            LoanStatus::OnLoan => "on_loan".to_string(),
            LoanStatus::Available => "available".to_string(),
            LoanStatus::Reserved => "reserved".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book_instances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub book_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub imprint: String,

    /// Null means the copy is not out on loan
    pub due_back: Option<Date>,

    pub borrower_id: Option<Uuid>,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the loan status as an enum
    pub fn loan_status(&self) -> LoanStatus {
        LoanStatus::from(self.status.clone())
    }

    /// Whether the copy is currently out on loan
    pub fn is_on_loan(&self) -> bool {
        self.loan_status() == LoanStatus::OnLoan
    }

    /// Whether the borrower/status pairing is consistent:
    /// a borrower is set exactly when the copy is on loan
    pub fn loan_state_consistent(&self) -> bool {
        self.borrower_id.is_some() == self.is_on_loan()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id"
    )]
    Book,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BorrowerId",
        to = "super::user::Column::Id"
    )]
    Borrower,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Borrower.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn copy(status: LoanStatus, borrower: Option<Uuid>) -> Model {
        let now = Utc::now();
        Model {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            imprint: "Unlikely Imprint, 2016".to_string(),
            due_back: None,
            borrower_id: borrower,
            status: String::from(status),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(LoanStatus::from(String::from(status)), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_maintenance() {
        assert_eq!(
            LoanStatus::from("lost?".to_string()),
            LoanStatus::Maintenance
        );
    }

    #[test]
    fn test_loan_state_consistency() {
        assert!(copy(LoanStatus::OnLoan, Some(Uuid::new_v4())).loan_state_consistent());
        assert!(copy(LoanStatus::Available, None).loan_state_consistent());
        assert!(!copy(LoanStatus::Available, Some(Uuid::new_v4())).loan_state_consistent());
        assert!(!copy(LoanStatus::OnLoan, None).loan_state_consistent());
    }
}
