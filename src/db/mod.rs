pub mod entities;
pub mod models;
pub mod schema;
pub mod services;

use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// True when `err` is the store rejecting a duplicate key.
///
/// Join rows rely on their composite primary keys, so this is how a second
/// insert of the same pair (possibly from a concurrent request) surfaces.
pub fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(database_error)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(database_error))) => {
            database_error.is_unique_violation()
        }
        _ => matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))),
    }
}

#[cfg(test)]
pub(crate) mod test_support;
