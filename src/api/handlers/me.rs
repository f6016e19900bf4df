use axum::Json;
use serde::Serialize;

use crate::api::extractors::AuthCtxExtractor;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub status: bool,
    pub message: &'static str,
    pub user: String,
}

/// Echo back the identity the gate attached to this request.
pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        status: true,
        message: "authenticated",
        user: ctx.user,
    })
}
