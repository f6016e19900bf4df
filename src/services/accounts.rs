//! Account/login collaborator interface.
//!
//! Account storage and token minting live outside this service. The gate never calls
//! this trait; the `/api/user/*` handlers forward to it and serialize whatever it returns.
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::dto::users::AccountRequest;

/// Result values are written verbatim as the JSON response body.
///
/// Implementations must be shareable across concurrent requests (`Arc<dyn AccountDirectory>`).
#[async_trait]
pub trait AccountDirectory: Send + Sync + 'static {
    // Register a new account; on success the body typically carries the issued token.
    async fn create_account(&self, payload: AccountRequest) -> Value;

    // Check credentials; on success the body typically carries the issued token.
    async fn authenticate(&self, email: &str, password: &str) -> Value;
}

/// Placeholder used when no account backend is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledAccounts;

impl DisabledAccounts {
    fn unavailable() -> Value {
        json!({ "status": false, "message": "account service unavailable" })
    }
}

#[async_trait]
impl AccountDirectory for DisabledAccounts {
    async fn create_account(&self, _payload: AccountRequest) -> Value {
        Self::unavailable()
    }

    async fn authenticate(&self, _email: &str, _password: &str) -> Value {
        Self::unavailable()
    }
}
