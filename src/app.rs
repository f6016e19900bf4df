/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (認証 gate / CORS / HTTP layers)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    services::{accounts::DisabledAccounts, auth::build_auth_gate},
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,contacts_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    tracing::debug!(?config, "loaded configuration");

    // Account storage is owned by a separate service; nothing is wired in here.
    let state = AppState::new(build_auth_gate(&config), Arc::new(DisabledAccounts));
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api", api::routes())
        .fallback(api::handlers::fallback::not_found);

    // gate is innermost so CORS preflight and request ids are handled before it
    let router = middleware::auth::access::apply(router, state.clone()).with_state(state);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use http_body_util::BodyExt;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::api::dto::users::AccountRequest;
    use crate::error::{MALFORMED_TOKEN_CHALLENGE, MISSING_TOKEN_CHALLENGE};
    use crate::services::accounts::AccountDirectory;
    use crate::services::auth::token::IdentityClaims;

    const SECRET: &str = "router-test-secret";

    /// Records what the handlers forwarded, and answers with a canned body.
    #[derive(Default)]
    struct RecordingAccounts {
        logins: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AccountDirectory for RecordingAccounts {
        async fn create_account(&self, payload: AccountRequest) -> Value {
            json!({ "status": true, "message": "Account has been created", "email": payload.email })
        }

        async fn authenticate(&self, email: &str, _password: &str) -> Value {
            self.logins.lock().unwrap().push(email.to_string());
            json!({ "status": true, "message": "Logged In", "token": "opaque" })
        }
    }

    fn test_config() -> Config {
        Config::from_source(|key| match key {
            "TOKEN_PASSWORD" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn test_app_with(accounts: Arc<dyn AccountDirectory>) -> Router {
        let config = test_config();
        let state = AppState::new(build_auth_gate(&config), accounts);
        build_router(state, &config)
    }

    fn test_app() -> Router {
        test_app_with(Arc::new(RecordingAccounts::default()))
    }

    fn token(sub: &str, secret: &str, nbf_offset: Option<i64>) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = IdentityClaims {
            sub: sub.to_string(),
            exp: Some((now + 600) as u64),
            iat: Some(now as u64),
            nbf: nbf_offset.map(|o| (now + o) as u64),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_401_with_challenge() {
        let response = test_app().oneshot(get("/api/me", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            MISSING_TOKEN_CHALLENGE
        );
        assert_eq!(
            body_json(response).await,
            json!({ "status": false, "message": "missing auth token" })
        );
    }

    #[tokio::test]
    async fn unrouted_path_is_still_gated() {
        let response = test_app()
            .oneshot(get("/api/unknown", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            MISSING_TOKEN_CHALLENGE
        );

        let bearer = format!("Bearer {}", token("42", SECRET, None));
        let response = test_app()
            .oneshot(get("/api/unknown", Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({ "status": false, "message": "not found" })
        );
    }

    #[tokio::test]
    async fn one_part_header_is_401_malformed() {
        let response = test_app()
            .oneshot(get("/api/me", Some("Bearer")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            MALFORMED_TOKEN_CHALLENGE
        );
        assert_eq!(
            body_json(response).await,
            json!({ "status": false, "message": "Invalid/Malformed auth token" })
        );
    }

    #[tokio::test]
    async fn unparseable_token_is_401_malformed() {
        let response = test_app()
            .oneshot(get("/api/me", Some("Bearer not-a-jwt")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["message"],
            "Invalid/Malformed auth token"
        );
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_401_not_403() {
        let bearer = format!("Bearer {}", token("42", "someone-elses-secret", None));
        let response = test_app()
            .oneshot(get("/api/me", Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn not_yet_valid_token_is_403() {
        let bearer = format!("Bearer {}", token("42", SECRET, Some(3600)));
        let response = test_app()
            .oneshot(get("/api/me", Some(&bearer)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(
            body_json(response).await,
            json!({ "status": false, "message": "Token is not valid" })
        );
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_subject() {
        let bearer = format!("Bearer {}", token("user-123", SECRET, None));
        let app = test_app();

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(get("/api/me", Some(&bearer)))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                body_json(response).await,
                json!({ "status": true, "message": "authenticated", "user": "user-123" })
            );
        }
    }

    #[tokio::test]
    async fn bypassed_paths_forward_regardless_of_header() {
        let accounts = Arc::new(RecordingAccounts::default());
        let app = test_app_with(accounts.clone());

        let mut req = post_json(
            "/api/user/login",
            r#"{"email":"a@example.com","password":"pw"}"#,
        );
        req.headers_mut()
            .insert(header::AUTHORIZATION, "complete garbage here".parse().unwrap());

        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["token"], "opaque");
        assert_eq!(*accounts.logins.lock().unwrap(), vec!["a@example.com"]);

        let response = app
            .oneshot(post_json(
                "/api/user/new",
                r#"{"email":"b@example.com","password":"pw"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "b@example.com");
    }

    #[tokio::test]
    async fn bypassed_route_gets_no_identity() {
        let config = Config::from_source(|key| match key {
            "TOKEN_PASSWORD" => Some(SECRET.to_string()),
            "AUTH_BYPASS_PATHS" => Some("/api/me".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::new(build_auth_gate(&config), Arc::new(DisabledAccounts));
        let app = build_router(state, &config);

        // Even a valid token is ignored on a bypassed path, so the extractor finds nothing.
        let bearer = format!("Bearer {}", token("user-123", SECRET, None));
        let response = app.oneshot(get("/api/me", Some(&bearer))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_account_body_is_400() {
        let response = test_app()
            .oneshot(post_json("/api/user/new", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "status": false, "message": "Invalid request" })
        );
    }

    #[tokio::test]
    async fn disabled_accounts_report_unavailable() {
        let response = test_app_with(Arc::new(DisabledAccounts))
            .oneshot(post_json(
                "/api/user/login",
                r#"{"email":"a@example.com","password":"pw"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], false);
    }

    #[tokio::test]
    async fn request_id_is_propagated_on_denials() {
        let response = test_app().oneshot(get("/api/me", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response
                .headers()
                .contains_key(middleware::http::REQUEST_ID_HEADER)
        );
    }
}
