/// Factory: build `AuthGate` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AuthGate, BypassList, token::TokenVerifier};

pub fn build_auth_gate(config: &Config) -> Arc<AuthGate> {
    let verifier = TokenVerifier::new(
        config.token_password.as_bytes(),
        config.token_algorithm,
        config.token_leeway_seconds,
    );

    let bypass = BypassList::new(config.auth_bypass_paths.iter().cloned());

    Arc::new(AuthGate::new(
        bypass,
        verifier,
        config.auth_require_bearer_scheme,
    ))
}
