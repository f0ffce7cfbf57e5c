/*
 * Responsibility
 * - upstream (identity admin API) が上位に伝える意味の定義
 * - HTTP status への変換は AppError 側の責務
 */
use thiserror::Error;

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream resource not found")]
    NotFound,
    #[error("upstream conflict: {0}")]
    Conflict(String),
    #[error("upstream responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream token error: {0}")]
    Token(String),
    #[error("upstream transport error")]
    Transport(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Map a non-success upstream response. `body` is the raw error payload.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = upstream_message(body);
        match status {
            404 => UpstreamError::NotFound,
            409 => UpstreamError::Conflict(message),
            _ => UpstreamError::Status { status, message },
        }
    }
}

// Keycloak uses `errorMessage` on admin endpoints and `error_description`
// (OAuth2 style) on the token endpoint.
fn upstream_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            ["errorMessage", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
