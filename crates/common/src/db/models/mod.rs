//! SeaORM entity models
//!
//! Database entities for the Lendstack catalog

mod author;
mod book;
mod book_genre;
mod book_instance;
mod genre;
mod language;
mod user;

pub use author::{
    ActiveModel as AuthorActiveModel, Column as AuthorColumn, Entity as AuthorEntity,
    Model as Author,
};

pub use book::{
    ActiveModel as BookActiveModel, Column as BookColumn, Entity as BookEntity, Model as Book,
};

pub use book_genre::{
    ActiveModel as BookGenreActiveModel, Column as BookGenreColumn, Entity as BookGenreEntity,
    Model as BookGenre,
};

pub use book_instance::{
    ActiveModel as BookInstanceActiveModel, Column as BookInstanceColumn,
    Entity as BookInstanceEntity, LoanStatus, Model as BookInstance,
};

pub use genre::{
    ActiveModel as GenreActiveModel, Column as GenreColumn, Entity as GenreEntity, Model as Genre,
};

pub use language::{
    ActiveModel as LanguageActiveModel, Column as LanguageColumn, Entity as LanguageEntity,
    Model as Language,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};
