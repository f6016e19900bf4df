use crate::error::AppError;

/// Unrouted paths still pass through the gate before landing here.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
