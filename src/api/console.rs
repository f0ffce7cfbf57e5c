/*
 * Responsibility
 * - console 向け endpoint: /health, /login, /logout, /api/auth/status
 * - ブラウザ向けページ: / (admin role 必須), /profile (認証のみ)
 * - ページは web protection (negotiate, 未認証は /login へ redirect) で保護
 */
use axum::{
    Json, Router,
    extract::{Query, Request, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::v1::extractors::{AuthCtx, AuthCtxExtractor};
use crate::authz::denial::escape_html;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin_pages = Router::new()
        .route("/", get(landing))
        .route_layer(state.web.gate(state.admin_role.clone()));

    let user_pages = Router::new()
        .route("/profile", get(profile))
        .route_layer(state.web.authenticate());

    Router::new()
        .route("/health", get(health))
        .route("/login", get(login))
        .route("/logout", get(logout))
        .route("/api/auth/status", get(auth_status))
        .merge(admin_pages)
        .merge(user_pages)
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime": state.started_at.elapsed().as_secs(),
            "environment": state.console.environment,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "return")]
    pub return_to: Option<String>,
}

/// Only same-origin absolute paths are honored as return targets.
fn safe_return_path(raw: Option<&str>) -> &str {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response, AppError> {
    let console = &state.console;
    let redirect_uri = format!(
        "{}{}",
        console.public_base_url,
        safe_return_path(query.return_to.as_deref())
    );

    let url = url::Url::parse_with_params(
        &console.authorize_url,
        &[
            ("client_id", console.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid"),
        ],
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid authorize url");
        AppError::Internal
    })?;

    tracing::debug!(location = %url, "redirecting to identity provider login");
    Ok(found(url.as_str()))
}

pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let console = &state.console;
    let post_logout = format!("{}/", console.public_base_url);

    let url = url::Url::parse_with_params(
        &console.end_session_url,
        &[
            ("client_id", console.client_id.as_str()),
            ("post_logout_redirect_uri", post_logout.as_str()),
        ],
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid end-session url");
        AppError::Internal
    })?;

    Ok(found(url.as_str()))
}

/// Runs authentication only; never responds with a denial.
pub async fn auth_status(State(state): State<AppState>, request: Request) -> Json<Value> {
    let (parts, _body) = request.into_parts();

    match state.web.authenticate().admit(&parts).await {
        Ok(ctx) => Json(json!({
            "authenticated": true,
            "user": {
                "username": ctx.username,
                "email": ctx.email,
                "roles": ctx.roles.realm_roles().collect::<Vec<_>>(),
                "clientRoles": ctx.roles.resource_roles(),
            }
        })),
        Err(denial) => {
            tracing::debug!(reason = %denial.reason, "auth status: not authenticated");
            Json(json!({ "authenticated": false, "loginUrl": "/login" }))
        }
    }
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{body}\n<p><a href=\"/logout\">Log out</a></p>\n</body>\n</html>\n",
        title = escape_html(title),
    ))
}

fn role_list(ctx: &AuthCtx) -> String {
    let items: String = ctx
        .roles
        .labels()
        .iter()
        .map(|label| format!("<li>{}</li>", escape_html(label)))
        .collect();
    format!("<ul>{items}</ul>")
}

pub async fn landing(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Html<String> {
    let body = format!(
        "<p>Signed in as <strong>{}</strong>.</p>\n<p>Roles:</p>\n{}\n\
         <p>The admin API is served under <code>/api/v1/admin</code>.</p>",
        escape_html(ctx.actor()),
        role_list(&ctx)
    );
    page("Identity Administration", &body)
}

pub async fn profile(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Html<String> {
    let body = format!(
        "<dl>\n<dt>Username</dt><dd>{}</dd>\n<dt>Email</dt><dd>{}</dd>\n<dt>Subject</dt><dd>{}</dd>\n</dl>\n\
         <p>Roles:</p>\n{}",
        escape_html(ctx.username.as_deref().unwrap_or("-")),
        escape_html(ctx.email.as_deref().unwrap_or("-")),
        escape_html(ctx.subject.as_deref().unwrap_or("-")),
        role_list(&ctx)
    );
    page("Profile", &body)
}
