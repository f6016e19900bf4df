/*
 * Responsibility
 * - /api/user/{new,login} の request DTO
 * - response は collaborator が返す JSON をそのまま返すので定義しない
 */
use serde::{Deserialize, Serialize};

#[derive(Clone, Deserialize, Serialize)]
pub struct AccountRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the password
        f.debug_struct("AccountRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
