//! Authentication gate: the ordered decision chain run for every request.
//!
//! 1. bypass check (exact path match)
//! 2. `Authorization` header extraction
//! 3. `<scheme> <token>` format check
//! 4. token parse + signature verification
//! 5. validity flag check
//!
//! Each step either yields the value the next step needs or a terminal `AppError`.

use std::collections::HashSet;

use axum::http::{HeaderMap, header};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::token::{ParsedToken, TokenVerifier};

/// Request paths that skip authentication entirely. Matching is exact and method-agnostic.
#[derive(Debug, Clone, Default)]
pub struct BypassList {
    paths: HashSet<String>,
}

impl BypassList {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// Outcome of a gate evaluation that lets the request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Path is on the bypass list; no identity is attached.
    Bypassed,
    Authenticated(AuthCtx),
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    bypass: BypassList,
    verifier: TokenVerifier,
    require_bearer_scheme: bool,
}

impl AuthGate {
    pub fn new(bypass: BypassList, verifier: TokenVerifier, require_bearer_scheme: bool) -> Self {
        Self {
            bypass,
            verifier,
            require_bearer_scheme,
        }
    }

    pub fn evaluate(&self, path: &str, headers: &HeaderMap) -> Result<Admission, AppError> {
        if self.bypass.contains(path) {
            return Ok(Admission::Bypassed);
        }

        let value = extract_authorization(headers)?;
        let token = split_bearer(value, self.require_bearer_scheme)?;
        let parsed = self.parse_token(token)?;
        let ctx = accept_valid(parsed)?;

        Ok(Admission::Authenticated(ctx))
    }

    fn parse_token(&self, token: &str) -> Result<ParsedToken, AppError> {
        self.verifier.parse(token).map_err(|err| {
            tracing::warn!(error = %err, "access token verification failed");
            AppError::MalformedAuthToken
        })
    }
}

fn extract_authorization(headers: &HeaderMap) -> Result<&str, AppError> {
    let Some(raw) = headers.get(header::AUTHORIZATION) else {
        return Err(AppError::MissingAuthToken);
    };
    if raw.is_empty() {
        return Err(AppError::MissingAuthToken);
    }

    // Present but not visible ASCII: cannot be a recognisable bearer credential.
    raw.to_str().map_err(|_| AppError::MalformedAuthToken)
}

fn split_bearer(value: &str, require_bearer_scheme: bool) -> Result<&str, AppError> {
    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        tracing::warn!("authorization header is not `<scheme> <token>`");
        return Err(AppError::MalformedAuthToken);
    };

    if require_bearer_scheme && !scheme.eq_ignore_ascii_case("Bearer") {
        tracing::warn!(scheme = %scheme, "unsupported authorization scheme");
        return Err(AppError::MalformedAuthToken);
    }

    Ok(token)
}

fn accept_valid(parsed: ParsedToken) -> Result<AuthCtx, AppError> {
    if !parsed.is_valid() {
        tracing::warn!(reason = ?parsed.invalidity(), "access token rejected");
        return Err(AppError::InvalidToken);
    }

    Ok(AuthCtx::new(parsed.claims.sub))
}
