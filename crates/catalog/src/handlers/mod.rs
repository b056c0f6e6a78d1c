//! HTTP request handlers

pub mod accounts;
pub mod authors;
pub mod books;
pub mod health;
pub mod index;
pub mod loans;
