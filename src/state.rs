/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - gate: AuthGate (起動時に構築、以後 immutable)
 *   - accounts: account/login collaborator
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{accounts::AccountDirectory, auth::AuthGate};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub accounts: Arc<dyn AccountDirectory>,
}

impl AppState {
    pub fn new(gate: Arc<AuthGate>, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { gate, accounts }
    }
}
