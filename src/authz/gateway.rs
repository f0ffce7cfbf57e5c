/*
 * Responsibility
 * - 認証ゲートウェイ (外部コンポーネント) との境界
 * - request を受け取り、検証済み claims を返すか、失敗を返すだけ
 *
 * Notes
 * - 失敗の理由はログ用。gate 側ではすべて "unauthenticated" として扱う
 */
use async_trait::async_trait;
use axum::http::{HeaderMap, header, request::Parts};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("authentication backend unavailable: {0}")]
    Unavailable(String),
}

/// Confirms that a request carries a valid session/token.
///
/// On success the verified claims are returned as an opaque JSON object;
/// the claims extractor is responsible for interpreting them.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn authenticate(&self, parts: &Parts) -> Result<Value, AuthFailure>;
}

/// `Authorization: Bearer <token>`; empty tokens count as missing.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_present() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn bearer_token_missing_or_wrong_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer    ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
