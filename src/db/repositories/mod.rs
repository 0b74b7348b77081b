pub mod episode;
pub mod file;
pub mod genre;
pub mod message;
pub mod pagination;
pub mod parser;
pub mod title;
pub mod user;

pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, paginate};

/// Whether `err` was caused by a unique constraint in the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<sea_orm::DbErr>().is_some_and(|db_err| {
            matches!(
                db_err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            )
        })
    })
}
