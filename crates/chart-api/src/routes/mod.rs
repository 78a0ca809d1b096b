//! # Route Modules
//!
//! Each module defines an Axum Router for one API surface area.
//! Routers are assembled in `lib.rs` into the application.

pub mod compliance;
pub mod datasets;
pub mod templates;

use std::fmt::Display;

use crate::error::AppError;

/// Map the outcome of a database update or delete onto the API error.
///
/// `Ok(false)` means no row matched: the record is gone from the database
/// even if memory still holds it, so the caller answers 404 and leaves the
/// store alone.
pub(crate) fn row_written(
    result: Result<bool, sqlx::Error>,
    resource: &'static str,
    id: impl Display,
) -> Result<(), AppError> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::warn!(resource, id = %id, "no database row matched");
            Err(AppError::NotFound(format!("{resource} {id} not found")))
        }
        Err(e) => {
            tracing::error!(resource, id = %id, error = %e, "database write failed");
            Err(AppError::Internal(format!("{resource} persist failed")))
        }
    }
}
