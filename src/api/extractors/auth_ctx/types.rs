/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - gate が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - request ごとに生成され、request の終了とともに破棄される (共有しない)
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user` は token の subject をそのまま保持する (gate は中身を解釈しない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user: String,
}

impl AuthCtx {
    pub fn new(user: impl Into<String>) -> Self {
        Self { user: user.into() }
    }
}
