//! Authentication gate middleware → AuthCtx を extensions に入れる
//!
//! - bypass 対象の path はそのまま通す (AuthCtx は入れない)
//! - それ以外は `Authorization: Bearer <jwt>` を検証し、sub を `AuthCtx.user` として格納する
//! - 失敗時は AppError (401/403 + JSON body) で short-circuit する

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::Admission;
use crate::state::AppState;

/// Router 全体に認証 gate を掛ける。
///
/// 例：
/// ```ignore
/// let router = Router::new().nest("/api", api::routes());
/// let router = middleware::auth::access::apply(router, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // nest された後でも bypass list は外側から見た path で比較する
    match state.gate.evaluate(original_uri.path(), req.headers())? {
        Admission::Bypassed => Ok(next.run(req).await),
        Admission::Authenticated(auth_ctx) => {
            tracing::debug!(user = %auth_ctx.user, "request authenticated");

            // middleware → extractor への受け渡し
            req.extensions_mut().insert(auth_ctx);

            Ok(next.run(req).await)
        }
    }
}
