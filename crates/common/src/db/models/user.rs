//! Library member / staff account entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::auth::{SCOPE_MANAGE_CATALOG, SCOPE_MANAGE_LOANS};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub username: String,

    #[serde(skip_serializing)]
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,

    /// Librarian capability: mark copies returned, manage renewals
    pub can_mark_returned: bool,

    /// Staff capability: author/book/copy management forms
    pub can_manage_catalog: bool,

    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Scopes carried in this user's session tokens
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes = Vec::new();
        if self.can_mark_returned {
            scopes.push(SCOPE_MANAGE_LOANS.to_string());
        }
        if self.can_manage_catalog {
            scopes.push(SCOPE_MANAGE_CATALOG.to_string());
        }
        scopes
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_instance::Entity")]
    BorrowedCopies,
}

impl Related<super::book_instance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BorrowedCopies.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_scopes_follow_capabilities() {
        let now = Utc::now();
        let user = Model {
            id: Uuid::new_v4(),
            username: "librarian".to_string(),
            password_hash: "x".to_string(),
            can_mark_returned: true,
            can_manage_catalog: false,
            is_active: true,
            created_at: now.into(),
        };

        assert_eq!(user.scopes(), vec![SCOPE_MANAGE_LOANS.to_string()]);

        let member = Model {
            can_mark_returned: false,
            ..user
        };
        assert!(member.scopes().is_empty());
    }
}
