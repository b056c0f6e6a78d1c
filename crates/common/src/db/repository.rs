//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling. Every mutating operation writes at most one
//! logical record (plus join rows for a book's genres); nothing here spans
//! multiple aggregates, so the database's own row locking is all the
//! coordination the service needs.

use crate::auth;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counts shown on the catalog landing page
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub books: u64,
    pub copies: u64,
    pub copies_available: u64,
    pub authors: u64,
}

/// A book joined with everything its detail page needs
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub book: Book,
    pub author: Author,
    pub genres: Vec<Genre>,
    pub language: Option<Language>,
    pub copies: Vec<BookInstance>,
}

/// Fields accepted when cataloguing a new book
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Uuid,
    pub language_id: Option<Uuid>,
    pub genre_ids: Vec<Uuid>,
}

/// Fields accepted when editing a book. The ISBN is immutable and is
/// deliberately absent.
#[derive(Debug, Clone)]
pub struct BookChanges {
    pub title: String,
    pub summary: String,
    pub author_id: Uuid,
    pub language_id: Option<Uuid>,
    pub genre_ids: Vec<Uuid>,
}

/// Fields accepted when registering a new copy
#[derive(Debug, Clone)]
pub struct NewCopy {
    pub book_id: Uuid,
    pub imprint: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<Uuid>,
}

/// Fields accepted on an administrative copy edit
#[derive(Debug, Clone)]
pub struct CopyChanges {
    pub imprint: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<Uuid>,
}

/// Copies one user currently has out, soonest due first. Kept as a plain
/// select so the filter and ordering can be checked without a connection.
fn borrower_loans_query(borrower_id: Uuid) -> Select<BookInstanceEntity> {
    BookInstanceEntity::find()
        .filter(BookInstanceColumn::BorrowerId.eq(borrower_id))
        .filter(BookInstanceColumn::Status.eq(String::from(LoanStatus::OnLoan)))
        .order_by_asc(BookInstanceColumn::DueBack)
}

/// A borrower is recorded exactly when the copy is out on loan.
fn ensure_loan_state(status: LoanStatus, borrower_id: Option<Uuid>) -> Result<()> {
    match (status, borrower_id) {
        (LoanStatus::OnLoan, None) => Err(AppError::Validation {
            message: "A copy on loan must have a borrower".to_string(),
            field: Some("borrower_id".to_string()),
        }),
        (status, Some(_)) if status != LoanStatus::OnLoan => Err(AppError::Validation {
            message: "A borrower may only be set while the copy is on loan".to_string(),
            field: Some("borrower_id".to_string()),
        }),
        _ => Ok(()),
    }
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Catalog Landing
    // ========================================================================

    /// Counts of the main catalog objects for the landing page
    pub async fn catalog_counts(&self) -> Result<CatalogCounts> {
        let conn = self.read_conn();

        let books = BookEntity::find().count(conn).await?;
        let copies = BookInstanceEntity::find().count(conn).await?;
        let copies_available = BookInstanceEntity::find()
            .filter(BookInstanceColumn::Status.eq(String::from(LoanStatus::Available)))
            .count(conn)
            .await?;
        let authors = AuthorEntity::find().count(conn).await?;

        Ok(CatalogCounts {
            books,
            copies,
            copies_available,
            authors,
        })
    }

    // ========================================================================
    // Book Operations
    // ========================================================================

    /// List books with pagination
    pub async fn list_books(&self, page_index: u64, page_size: u64) -> Result<(Vec<Book>, u64)> {
        let paginator = BookEntity::find()
            .order_by_asc(BookColumn::Title)
            .paginate(self.read_conn(), page_size);

        let total = paginator.num_items().await?;
        let books = paginator.fetch_page(page_index).await?;

        Ok((books, total))
    }

    /// Find book by ID
    pub async fn find_book_by_id(&self, id: Uuid) -> Result<Option<Book>> {
        BookEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Load a book together with its author, genres, language and copies
    pub async fn book_detail(&self, id: Uuid) -> Result<Option<BookDetail>> {
        let conn = self.read_conn();

        let Some(book) = BookEntity::find_by_id(id).one(conn).await? else {
            return Ok(None);
        };

        let author = AuthorEntity::find_by_id(book.author_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::Internal {
                message: format!("Book {} references missing author {}", book.id, book.author_id),
            })?;

        let genres = book.find_related(GenreEntity).all(conn).await?;

        let language = match book.language_id {
            Some(lang_id) => LanguageEntity::find_by_id(lang_id).one(conn).await?,
            None => None,
        };

        let copies = BookInstanceEntity::find()
            .filter(BookInstanceColumn::BookId.eq(book.id))
            .order_by_asc(BookInstanceColumn::DueBack)
            .all(conn)
            .await?;

        Ok(Some(BookDetail {
            book,
            author,
            genres,
            language,
            copies,
        }))
    }

    /// Catalogue a new book and its genre links
    pub async fn create_book(&self, new: NewBook) -> Result<Book> {
        // Referenced records must exist before anything is written
        self.require_author(new.author_id).await?;
        if let Some(lang_id) = new.language_id {
            self.require_language(lang_id).await?;
        }
        self.require_genres(&new.genre_ids).await?;

        let now = chrono::Utc::now();
        let book_id = Uuid::new_v4();

        let txn = self.write_conn().begin().await?;

        let book = BookActiveModel {
            id: Set(book_id),
            title: Set(new.title),
            summary: Set(new.summary),
            isbn: Set(new.isbn),
            author_id: Set(new.author_id),
            language_id: Set(new.language_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let book = book.insert(&txn).await?;

        for genre_id in new.genre_ids {
            let link = BookGenreActiveModel {
                book_id: Set(book_id),
                genre_id: Set(genre_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(book)
    }

    /// Apply an edit to an existing book. Replaces the genre set wholesale.
    pub async fn update_book(&self, id: Uuid, changes: BookChanges) -> Result<Book> {
        self.require_author(changes.author_id).await?;
        if let Some(lang_id) = changes.language_id {
            self.require_language(lang_id).await?;
        }
        self.require_genres(&changes.genre_ids).await?;

        let existing = BookEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::BookNotFound { id: id.to_string() })?;

        let txn = self.write_conn().begin().await?;

        let mut book: BookActiveModel = existing.into();
        book.title = Set(changes.title);
        book.summary = Set(changes.summary);
        book.author_id = Set(changes.author_id);
        book.language_id = Set(changes.language_id);
        book.updated_at = Set(chrono::Utc::now().into());
        let book = book.update(&txn).await?;

        BookGenreEntity::delete_many()
            .filter(BookGenreColumn::BookId.eq(id))
            .exec(&txn)
            .await?;

        for genre_id in changes.genre_ids {
            let link = BookGenreActiveModel {
                book_id: Set(id),
                genre_id: Set(genre_id),
            };
            link.insert(&txn).await?;
        }

        txn.commit().await?;

        Ok(book)
    }

    /// Remove a book along with its genre links and copies
    pub async fn delete_book(&self, id: Uuid) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        BookGenreEntity::delete_many()
            .filter(BookGenreColumn::BookId.eq(id))
            .exec(&txn)
            .await?;

        BookInstanceEntity::delete_many()
            .filter(BookInstanceColumn::BookId.eq(id))
            .exec(&txn)
            .await?;

        let result = BookEntity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Author Operations
    // ========================================================================

    /// List authors with pagination
    pub async fn list_authors(
        &self,
        page_index: u64,
        page_size: u64,
    ) -> Result<(Vec<Author>, u64)> {
        let paginator = AuthorEntity::find()
            .order_by_asc(AuthorColumn::LastName)
            .order_by_asc(AuthorColumn::FirstName)
            .paginate(self.read_conn(), page_size);

        let total = paginator.num_items().await?;
        let authors = paginator.fetch_page(page_index).await?;

        Ok((authors, total))
    }

    /// Find author by ID
    pub async fn find_author_by_id(&self, id: Uuid) -> Result<Option<Author>> {
        AuthorEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Books owned by one author, for the author detail page
    pub async fn books_by_author(&self, author_id: Uuid) -> Result<Vec<Book>> {
        BookEntity::find()
            .filter(BookColumn::AuthorId.eq(author_id))
            .order_by_asc(BookColumn::Title)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a new author
    pub async fn create_author(
        &self,
        first_name: String,
        last_name: String,
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> Result<Author> {
        let now = chrono::Utc::now();

        let author = AuthorActiveModel {
            id: Set(Uuid::new_v4()),
            first_name: Set(first_name),
            last_name: Set(last_name),
            date_of_birth: Set(date_of_birth),
            date_of_death: Set(date_of_death),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        author.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Apply an edit to an existing author
    pub async fn update_author(
        &self,
        id: Uuid,
        first_name: String,
        last_name: String,
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> Result<Author> {
        let existing = AuthorEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::AuthorNotFound { id: id.to_string() })?;

        let mut author: AuthorActiveModel = existing.into();
        author.first_name = Set(first_name);
        author.last_name = Set(last_name);
        author.date_of_birth = Set(date_of_birth);
        author.date_of_death = Set(date_of_death);
        author.updated_at = Set(chrono::Utc::now().into());

        author.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Remove an author. Refused while any of their books remain catalogued.
    pub async fn delete_author(&self, id: Uuid) -> Result<bool> {
        let book_count = BookEntity::find()
            .filter(BookColumn::AuthorId.eq(id))
            .count(self.read_conn())
            .await?;

        if book_count > 0 {
            return Err(AppError::AuthorHasBooks {
                id: id.to_string(),
                book_count,
            });
        }

        let result = AuthorEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Copy & Loan Operations
    // ========================================================================

    /// Find a copy by ID
    pub async fn find_copy_by_id(&self, id: Uuid) -> Result<Option<BookInstance>> {
        BookInstanceEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Copies borrowed by one user and currently on loan, soonest due first
    pub async fn loans_for_borrower(
        &self,
        borrower_id: Uuid,
        page_index: u64,
        page_size: u64,
    ) -> Result<(Vec<(BookInstance, Option<Book>)>, u64)> {
        let paginator = borrower_loans_query(borrower_id)
            .find_also_related(BookEntity)
            .paginate(self.read_conn(), page_size);

        let total = paginator.num_items().await?;
        let loans = paginator.fetch_page(page_index).await?;

        Ok((loans, total))
    }

    /// Write an accepted renewal date back to the copy.
    ///
    /// Exactly one record is touched and only its due-back date (plus the
    /// bookkeeping timestamp) changes. Validation happens before this call.
    pub async fn renew_copy(&self, id: Uuid, due_back: NaiveDate) -> Result<BookInstance> {
        let existing = BookInstanceEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::CopyNotFound { id: id.to_string() })?;

        let mut copy: BookInstanceActiveModel = existing.into();
        copy.due_back = Set(Some(due_back));
        copy.updated_at = Set(chrono::Utc::now().into());

        copy.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Register a new copy of a book
    pub async fn create_copy(&self, new: NewCopy) -> Result<BookInstance> {
        ensure_loan_state(new.status, new.borrower_id)?;

        self.find_book_by_id(new.book_id)
            .await?
            .ok_or_else(|| AppError::BookNotFound {
                id: new.book_id.to_string(),
            })?;

        let now = chrono::Utc::now();

        let copy = BookInstanceActiveModel {
            id: Set(Uuid::new_v4()),
            book_id: Set(new.book_id),
            imprint: Set(new.imprint),
            due_back: Set(new.due_back),
            borrower_id: Set(new.borrower_id),
            status: Set(String::from(new.status)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        copy.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Administrative edit of a copy (loan status, borrower, imprint)
    pub async fn update_copy(&self, id: Uuid, changes: CopyChanges) -> Result<BookInstance> {
        ensure_loan_state(changes.status, changes.borrower_id)?;

        let existing = BookInstanceEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::CopyNotFound { id: id.to_string() })?;

        let mut copy: BookInstanceActiveModel = existing.into();
        copy.imprint = Set(changes.imprint);
        copy.status = Set(String::from(changes.status));
        copy.due_back = Set(changes.due_back);
        copy.borrower_id = Set(changes.borrower_id);
        copy.updated_at = Set(chrono::Utc::now().into());

        copy.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Genre & Language Operations
    // ========================================================================

    /// All genres, for management form dropdowns
    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        GenreEntity::find()
            .order_by_asc(GenreColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// All languages, for management form dropdowns
    pub async fn list_languages(&self) -> Result<Vec<Language>> {
        LanguageEntity::find()
            .order_by_asc(LanguageColumn::Name)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Find an active user by username, for login
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .filter(UserColumn::IsActive.eq(true))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a user account
    pub async fn create_user(
        &self,
        username: String,
        password: &str,
        can_mark_returned: bool,
        can_manage_catalog: bool,
    ) -> Result<User> {
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            password_hash: Set(auth::hash_password(password)),
            can_mark_returned: Set(can_mark_returned),
            can_manage_catalog: Set(can_manage_catalog),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        };

        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Referential checks
    // ========================================================================

    async fn require_author(&self, id: Uuid) -> Result<()> {
        self.find_author_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::AuthorNotFound { id: id.to_string() })
    }

    async fn require_language(&self, id: Uuid) -> Result<()> {
        LanguageEntity::find_by_id(id)
            .one(self.read_conn())
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound {
                resource_type: "language".to_string(),
                id: id.to_string(),
            })
    }

    async fn require_genres(&self, ids: &[Uuid]) -> Result<()> {
        for &id in ids {
            GenreEntity::find_by_id(id)
                .one(self.read_conn())
                .await?
                .map(|_| ())
                .ok_or_else(|| AppError::NotFound {
                    resource_type: "genre".to_string(),
                    id: id.to_string(),
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn test_borrower_loans_query_shape() {
        let borrower_id = Uuid::new_v4();
        let sql = borrower_loans_query(borrower_id)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(&format!(r#""book_instance"."borrower_id" = '{}'"#, borrower_id)));
        assert!(sql.contains(r#""book_instance"."status" = 'on_loan'"#));
        assert!(sql.contains(r#"ORDER BY "book_instance"."due_back" ASC"#));
    }

    #[test]
    fn test_loan_state_guard() {
        let borrower = Some(Uuid::new_v4());

        assert!(ensure_loan_state(LoanStatus::OnLoan, borrower).is_ok());
        assert!(ensure_loan_state(LoanStatus::Available, None).is_ok());
        assert!(ensure_loan_state(LoanStatus::Maintenance, None).is_ok());

        assert!(matches!(
            ensure_loan_state(LoanStatus::OnLoan, None),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            ensure_loan_state(LoanStatus::Available, borrower),
            Err(AppError::Validation { .. })
        ));
        assert!(matches!(
            ensure_loan_state(LoanStatus::Reserved, borrower),
            Err(AppError::Validation { .. })
        ));
    }
}
