/*
 * Responsibility
 * - /api/user/new, /api/user/login の handler (gate の bypass 対象)
 * - body を DTO に decode → AccountDirectory に委譲 → 結果をそのまま JSON で返す
 */
use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use crate::{api::dto::users::AccountRequest, error::AppError, state::AppState};

fn decode(body: &Bytes) -> Result<AccountRequest, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "invalid account request body");
        AppError::InvalidRequest
    })
}

pub async fn create_account(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let req = decode(&body)?;
    Ok(Json(state.accounts.create_account(req).await))
}

pub async fn authenticate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let req = decode(&body)?;
    Ok(Json(state.accounts.authenticate(&req.email, &req.password).await))
}
