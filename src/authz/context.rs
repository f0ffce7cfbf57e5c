/*
 * Responsibility
 * - gate を通過したリクエストに付与されるコンテキスト (AuthCtx)
 * - gate が request extensions に insert し、handler は extractor 経由で受け取る
 */
use super::claims::{PrincipalRoles, TokenClaims};

#[derive(Debug, Clone, Default)]
pub struct AuthCtx {
    pub subject: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub roles: PrincipalRoles,
}

impl AuthCtx {
    pub fn new(claims: &TokenClaims, roles: PrincipalRoles) -> Self {
        Self {
            subject: claims.sub.clone(),
            username: claims.preferred_username.clone(),
            email: claims.email.clone(),
            roles,
        }
    }

    /// Best label for audit logs: username, then subject.
    pub fn actor(&self) -> &str {
        self.username
            .as_deref()
            .or(self.subject.as_deref())
            .unwrap_or("unknown")
    }
}
