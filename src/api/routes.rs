/*
 * Responsibility
 * - /api 配下の URL 構造を定義
 * - 認証 gate は app.rs で Router 全体に掛ける (ここでは掛けない)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::handlers::{
    fallback::not_found,
    me::me,
    users::{authenticate, create_account},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/new", post(create_account))
        .route("/user/login", post(authenticate))
        .route("/me", get(me))
        .fallback(not_found)
}
