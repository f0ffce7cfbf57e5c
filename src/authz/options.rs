/*
 * Responsibility
 * - gate ごとの Protection Configuration (メッセージ、リダイレクト先、応答形式など)
 * - route 登録時に一度だけ作り、以後は Arc で read-only 共有
 */
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;

use super::denial::DenialRecord;

/// How denial responses are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Always JSON (API routes).
    Json,
    /// JSON when `Accept` asks for it, HTML otherwise.
    #[default]
    Negotiate,
    /// Always HTML (browser pages).
    Html,
}

/// Replaces the default denial responder entirely.
pub type DenialHandler = Arc<dyn Fn(DenialRecord) -> Response + Send + Sync>;

#[derive(Clone)]
pub struct ProtectionConfig {
    pub unauthorized_message: String,
    pub forbidden_message: String,
    /// Login target for unauthenticated callers. `None` renders a page instead.
    pub redirect_url: Option<String>,
    pub format: ResponseFormat,
    pub log_unauthorized: bool,
    /// Include required/held roles in default denial bodies.
    pub expose_role_details: bool,
    /// Upper bound on the authentication gateway call.
    pub auth_timeout: Duration,
    pub denial_handler: Option<DenialHandler>,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            unauthorized_message: "Access denied. Please log in to continue.".to_string(),
            forbidden_message: "You do not have permission to access this resource.".to_string(),
            redirect_url: Some("/login".to_string()),
            format: ResponseFormat::Negotiate,
            log_unauthorized: true,
            expose_role_details: false,
            auth_timeout: Duration::from_secs(10),
            denial_handler: None,
        }
    }
}

impl ProtectionConfig {
    pub fn json() -> Self {
        Self {
            format: ResponseFormat::Json,
            ..Self::default()
        }
    }

    pub fn with_messages(
        mut self,
        unauthorized: impl Into<String>,
        forbidden: impl Into<String>,
    ) -> Self {
        self.unauthorized_message = unauthorized.into();
        self.forbidden_message = forbidden.into();
        self
    }

    pub fn with_redirect(mut self, redirect_url: Option<String>) -> Self {
        self.redirect_url = redirect_url;
        self
    }

    pub fn with_timeout(mut self, auth_timeout: Duration) -> Self {
        self.auth_timeout = auth_timeout;
        self
    }

    pub fn with_role_details(mut self, expose: bool) -> Self {
        self.expose_role_details = expose;
        self
    }

    pub fn with_denial_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(DenialRecord) -> Response + Send + Sync + 'static,
    {
        self.denial_handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for ProtectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtectionConfig")
            .field("unauthorized_message", &self.unauthorized_message)
            .field("forbidden_message", &self.forbidden_message)
            .field("redirect_url", &self.redirect_url)
            .field("format", &self.format)
            .field("log_unauthorized", &self.log_unauthorized)
            .field("expose_role_details", &self.expose_role_details)
            .field("auth_timeout", &self.auth_timeout)
            .field("denial_handler", &self.denial_handler.is_some())
            .finish()
    }
}
