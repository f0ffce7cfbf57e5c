//! Denial records and the default denial responder.
//!
//! Responsibility:
//! - Classify a denial (authentication / authorization / evaluation)
//! - Capture request context for logs and custom handlers (`DenialRecord`)
//! - Render exactly one response: JSON body, HTML page, or login redirect
//!
//! Rules:
//! - 401 may redirect to the login target (HTML clients only).
//! - 403 never redirects; it always renders a forbidden page or JSON body.

use std::net::SocketAddr;

use axum::{
    Json,
    extract::{ConnectInfo, OriginalUri},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::claims::PrincipalRoles;
use super::options::{ProtectionConfig, ResponseFormat};
use super::requirement::{RoleDescriptor, RoleRequirement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No valid session/token.
    Authentication,
    /// Authenticated, but a required role is missing.
    Authorization,
    /// Claims extraction or policy evaluation failed unexpectedly.
    Evaluation,
}

impl DenialKind {
    pub fn status(self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization | Self::Evaluation => StatusCode::FORBIDDEN,
        }
    }

    pub fn classification(self) -> &'static str {
        match self {
            Self::Authentication => "unauthenticated",
            Self::Authorization | Self::Evaluation => "unauthorized",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::Evaluation => "EVALUATION_ERROR",
        }
    }
}

/// Everything known about a denied request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DenialRecord {
    pub kind: DenialKind,
    pub reason: String,
    pub path: String,
    pub method: String,
    pub required_roles: Vec<String>,
    pub principal_roles: Vec<String>,
    pub missing_roles: Vec<RoleDescriptor>,
    pub timestamp: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl DenialRecord {
    pub fn from_parts(
        kind: DenialKind,
        reason: impl Into<String>,
        parts: &Parts,
        requirement: &RoleRequirement,
        principal: Option<&PrincipalRoles>,
        missing: Vec<RoleDescriptor>,
    ) -> Self {
        Self {
            kind,
            reason: reason.into(),
            path: request_path(parts),
            method: parts.method.to_string(),
            required_roles: requirement.labels(),
            principal_roles: principal.map(PrincipalRoles::labels).unwrap_or_default(),
            missing_roles: missing,
            timestamp: Utc::now(),
            client_ip: client_ip(parts),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        }
    }
}

// Path as the client sent it (before any `nest` stripping), with query.
fn request_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or(&parts.uri);

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

pub fn wants_json(format: ResponseFormat, headers: &HeaderMap) -> bool {
    match format {
        ResponseFormat::Json => true,
        ResponseFormat::Html => false,
        ResponseFormat::Negotiate => headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("application/json")),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DenialBody<'a> {
    error: &'static str,
    message: &'a str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    login_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_roles: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_roles: Option<&'a [String]>,
}

/// Default denial responder.
pub fn respond(record: &DenialRecord, config: &ProtectionConfig, headers: &HeaderMap) -> Response {
    if wants_json(config.format, headers) {
        json_response(record, config)
    } else {
        html_response(record, config)
    }
}

fn message_for(kind: DenialKind, config: &ProtectionConfig) -> &str {
    match kind {
        DenialKind::Authentication => &config.unauthorized_message,
        DenialKind::Authorization | DenialKind::Evaluation => &config.forbidden_message,
    }
}

fn json_response(record: &DenialRecord, config: &ProtectionConfig) -> Response {
    let login_url = match record.kind {
        DenialKind::Authentication => config.redirect_url.as_deref(),
        _ => None,
    };
    let details = config.expose_role_details;

    let body = DenialBody {
        error: record.kind.classification(),
        message: message_for(record.kind, config),
        code: record.kind.code(),
        login_url,
        required_roles: details.then_some(record.required_roles.as_slice()),
        user_roles: details.then_some(record.principal_roles.as_slice()),
    };

    (record.kind.status(), Json(body)).into_response()
}

fn html_response(record: &DenialRecord, config: &ProtectionConfig) -> Response {
    let message = message_for(record.kind, config);

    match (record.kind, config.redirect_url.as_deref()) {
        (DenialKind::Authentication, Some(target)) => {
            (StatusCode::FOUND, [(header::LOCATION, login_location(target, &record.path))])
                .into_response()
        }
        (DenialKind::Authentication, None) => {
            let page = render_page(
                "Authentication Required",
                message,
                None,
                r#"<a href="/">Click here to log in</a>"#,
            );
            (StatusCode::UNAUTHORIZED, Html(page)).into_response()
        }
        (DenialKind::Authorization | DenialKind::Evaluation, _) => {
            let details = config.expose_role_details.then(|| role_details(record));
            let page = render_page(
                "Access Forbidden",
                message,
                details.as_deref(),
                r#"<p>Contact your administrator if you believe this is an error.</p>
        <a href="/">Return to Home</a>"#,
            );
            (StatusCode::FORBIDDEN, Html(page)).into_response()
        }
    }
}

/// `<target>?return=<encoded path>`; appends with `&` if the target has a query.
pub fn login_location(target: &str, return_path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(return_path.as_bytes()).collect();
    let sep = if target.contains('?') { '&' } else { '?' };
    format!("{target}{sep}return={encoded}")
}

fn role_details(record: &DenialRecord) -> String {
    let held = if record.principal_roles.is_empty() {
        "none".to_string()
    } else {
        escape_html(&record.principal_roles.join(", "))
    };
    format!(
        "<p>Required roles: <strong>{}</strong></p>\n        <p>Your current roles: <strong>{}</strong></p>",
        escape_html(&record.required_roles.join(", ")),
        held
    )
}

fn render_page(title: &str, message: &str, details: Option<&str>, footer: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>{title}</title></head>
  <body>
    <h1>{title}</h1>
    <p>{message}</p>
    {details}
    {footer}
  </body>
</html>
"#,
        title = escape_html(title),
        message = escape_html(message),
        details = details.unwrap_or_default(),
        footer = footer,
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
