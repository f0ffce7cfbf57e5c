//! Keycloak admin REST client.
//!
//! - `<base>/admin/realms/<realm>/...` for all resources
//! - client-credentials token from `<base>/realms/<realm>/protocol/openid-connect/token`,
//!   cached in `TokenCache` and refreshed once on a 401
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::IdentityAdmin;
use super::error::{UpstreamError, UpstreamResult};
use super::model::{
    ClientQuery, ClientRepresentation, ClientSecretRepresentation, CredentialRepresentation,
    EventQuery, EventRepresentation, GroupRepresentation, RoleRepresentation, UserQuery,
    UserRepresentation, UserSessionRepresentation,
};
use super::token_cache::TokenCache;

#[derive(Clone)]
pub struct KeycloakAdminConfig {
    pub base_url: String,
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for KeycloakAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakAdminConfig")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Clone)]
pub struct KeycloakAdmin {
    http: Client,
    admin_base: Url,
    token_url: Url,
    client_id: String,
    client_secret: String,
    tokens: Arc<TokenCache>,
}

impl std::fmt::Debug for KeycloakAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print the client secret
        f.debug_struct("KeycloakAdmin")
            .field("admin_base", &self.admin_base.as_str())
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl KeycloakAdmin {
    pub fn new(config: KeycloakAdminConfig) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("failed to build http client: {}", e))?;
        Self::with_client(http, config)
    }

    pub fn with_client(http: Client, config: KeycloakAdminConfig) -> Result<Self, String> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| format!("invalid keycloak base url: {}", e))?;
        if base.cannot_be_a_base() {
            return Err("invalid keycloak base url: cannot be a base".to_string());
        }

        let admin_base = join(&base, &["admin", "realms", &config.realm]);
        let token_url = join(
            &base,
            &["realms", &config.realm, "protocol", "openid-connect", "token"],
        );

        Ok(Self {
            http,
            admin_base,
            token_url,
            client_id: config.client_id,
            client_secret: config.client_secret,
            tokens: Arc::new(TokenCache::default()),
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        join(&self.admin_base, segments)
    }

    async fn fetch_token(&self) -> UpstreamResult<(String, Duration)> {
        let resp = self
            .http
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = match UpstreamError::from_status(status, &body) {
                UpstreamError::Status { message, .. } | UpstreamError::Conflict(message) => message,
                other => other.to_string(),
            };
            return Err(UpstreamError::Token(format!("{status}: {message}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| UpstreamError::Token(format!("unreadable token response: {}", e)))?;

        Ok((
            token.access_token,
            Duration::from_secs(token.expires_in.unwrap_or(60)),
        ))
    }

    async fn token(&self) -> UpstreamResult<String> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }

    /// Send an authorized request; on 401 the cached token is dropped and the
    /// request is retried once with a fresh token.
    async fn send<F>(&self, build: F) -> UpstreamResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let token = self.token().await?;
        let resp = build().bearer_auth(&token).send().await?;

        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("admin token rejected upstream; refreshing");
            self.tokens.invalidate_if(&token).await;
            let token = self.token().await?;
            build().bearer_auth(&token).send().await?
        } else {
            resp
        };

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let err = UpstreamError::from_status(status, &body);
        tracing::warn!(status, error = %err, "admin api call failed");
        Err(err)
    }

    async fn get_json<T: DeserializeOwned + Send>(&self, url: Url) -> UpstreamResult<T> {
        let resp = self.send(|| self.http.get(url.clone())).await?;
        Ok(resp.json().await?)
    }

    /// Role mapping endpoints want full representations, not names.
    async fn realm_roles_by_name(&self, names: &[String]) -> UpstreamResult<Vec<RoleRepresentation>> {
        let mut roles = Vec::with_capacity(names.len());
        for name in names {
            roles.push(self.get_json(self.url(&["roles", name])).await?);
        }
        Ok(roles)
    }
}

fn join(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    // Checked in `with_client`: the base is always hierarchical.
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Id of a freshly created resource, taken from the `Location` header.
fn created_id(resp: &Response) -> UpstreamResult<Uuid> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|loc| loc.trim_end_matches('/').rsplit('/').next())
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| UpstreamError::Status {
            status: resp.status().as_u16(),
            message: "created resource without a usable Location header".to_string(),
        })
}

#[async_trait]
impl IdentityAdmin for KeycloakAdmin {
    async fn list_users(&self, query: &UserQuery) -> UpstreamResult<Vec<UserRepresentation>> {
        let url = self.url(&["users"]);
        let resp = self.send(|| self.http.get(url.clone()).query(query)).await?;
        Ok(resp.json().await?)
    }

    async fn get_user(&self, id: Uuid) -> UpstreamResult<UserRepresentation> {
        self.get_json(self.url(&["users", &id.to_string()])).await
    }

    async fn create_user(&self, user: &UserRepresentation) -> UpstreamResult<Uuid> {
        let url = self.url(&["users"]);
        let resp = self.send(|| self.http.post(url.clone()).json(user)).await?;
        created_id(&resp)
    }

    async fn update_user(&self, id: Uuid, user: &UserRepresentation) -> UpstreamResult<()> {
        let url = self.url(&["users", &id.to_string()]);
        self.send(|| self.http.put(url.clone()).json(user)).await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> UpstreamResult<()> {
        let url = self.url(&["users", &id.to_string()]);
        self.send(|| self.http.delete(url.clone())).await?;
        Ok(())
    }

    async fn reset_password(
        &self,
        id: Uuid,
        credential: &CredentialRepresentation,
    ) -> UpstreamResult<()> {
        let url = self.url(&["users", &id.to_string(), "reset-password"]);
        self.send(|| self.http.put(url.clone()).json(credential)).await?;
        Ok(())
    }

    async fn user_realm_roles(&self, id: Uuid) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.get_json(self.url(&["users", &id.to_string(), "role-mappings", "realm"]))
            .await
    }

    async fn assign_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()> {
        let roles = self.realm_roles_by_name(role_names).await?;
        let url = self.url(&["users", &id.to_string(), "role-mappings", "realm"]);
        self.send(|| self.http.post(url.clone()).json(&roles)).await?;
        Ok(())
    }

    async fn remove_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()> {
        let roles = self.realm_roles_by_name(role_names).await?;
        let url = self.url(&["users", &id.to_string(), "role-mappings", "realm"]);
        self.send(|| self.http.delete(url.clone()).json(&roles)).await?;
        Ok(())
    }

    async fn list_groups(&self) -> UpstreamResult<Vec<GroupRepresentation>> {
        self.get_json(self.url(&["groups"])).await
    }

    async fn create_group(&self, group: &GroupRepresentation) -> UpstreamResult<Uuid> {
        let url = self.url(&["groups"]);
        let resp = self.send(|| self.http.post(url.clone()).json(group)).await?;
        created_id(&resp)
    }

    async fn user_groups(&self, id: Uuid) -> UpstreamResult<Vec<GroupRepresentation>> {
        self.get_json(self.url(&["users", &id.to_string(), "groups"]))
            .await
    }

    async fn add_user_to_group(&self, id: Uuid, group: Uuid) -> UpstreamResult<()> {
        let url = self.url(&["users", &id.to_string(), "groups", &group.to_string()]);
        self.send(|| self.http.put(url.clone())).await?;
        Ok(())
    }

    async fn assign_client_roles(
        &self,
        id: Uuid,
        client: Uuid,
        roles: &[RoleRepresentation],
    ) -> UpstreamResult<()> {
        let url = self.url(&[
            "users",
            &id.to_string(),
            "role-mappings",
            "clients",
            &client.to_string(),
        ]);
        self.send(|| self.http.post(url.clone()).json(roles)).await?;
        Ok(())
    }

    async fn list_realm_roles(&self) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.get_json(self.url(&["roles"])).await
    }

    async fn create_realm_role(&self, role: &RoleRepresentation) -> UpstreamResult<()> {
        let url = self.url(&["roles"]);
        self.send(|| self.http.post(url.clone()).json(role)).await?;
        Ok(())
    }

    async fn list_client_roles(&self, client: Uuid) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.get_json(self.url(&["clients", &client.to_string(), "roles"]))
            .await
    }

    async fn create_client_role(
        &self,
        client: Uuid,
        role: &RoleRepresentation,
    ) -> UpstreamResult<()> {
        let url = self.url(&["clients", &client.to_string(), "roles"]);
        self.send(|| self.http.post(url.clone()).json(role)).await?;
        Ok(())
    }

    async fn list_clients(&self, query: &ClientQuery) -> UpstreamResult<Vec<ClientRepresentation>> {
        let url = self.url(&["clients"]);
        let resp = self.send(|| self.http.get(url.clone()).query(query)).await?;
        Ok(resp.json().await?)
    }

    async fn get_client(&self, id: Uuid) -> UpstreamResult<ClientRepresentation> {
        self.get_json(self.url(&["clients", &id.to_string()])).await
    }

    async fn create_client(&self, client: &ClientRepresentation) -> UpstreamResult<Uuid> {
        let url = self.url(&["clients"]);
        let resp = self.send(|| self.http.post(url.clone()).json(client)).await?;
        created_id(&resp)
    }

    async fn update_client(&self, id: Uuid, client: &ClientRepresentation) -> UpstreamResult<()> {
        let url = self.url(&["clients", &id.to_string()]);
        self.send(|| self.http.put(url.clone()).json(client)).await?;
        Ok(())
    }

    async fn delete_client(&self, id: Uuid) -> UpstreamResult<()> {
        let url = self.url(&["clients", &id.to_string()]);
        self.send(|| self.http.delete(url.clone())).await?;
        Ok(())
    }

    async fn client_secret(&self, id: Uuid) -> UpstreamResult<ClientSecretRepresentation> {
        self.get_json(self.url(&["clients", &id.to_string(), "client-secret"]))
            .await
    }

    async fn regenerate_client_secret(
        &self,
        id: Uuid,
    ) -> UpstreamResult<ClientSecretRepresentation> {
        let url = self.url(&["clients", &id.to_string(), "client-secret"]);
        let resp = self.send(|| self.http.post(url.clone())).await?;
        Ok(resp.json().await?)
    }

    async fn user_sessions(&self, id: Uuid) -> UpstreamResult<Vec<UserSessionRepresentation>> {
        self.get_json(self.url(&["users", &id.to_string(), "sessions"]))
            .await
    }

    async fn logout_user(&self, id: Uuid) -> UpstreamResult<()> {
        let url = self.url(&["users", &id.to_string(), "logout"]);
        self.send(|| self.http.post(url.clone())).await?;
        Ok(())
    }

    async fn events(&self, query: &EventQuery) -> UpstreamResult<Vec<EventRepresentation>> {
        let url = self.url(&["events"]);
        let resp = self.send(|| self.http.get(url.clone()).query(query)).await?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Upstream {
        token_calls: Arc<AtomicUsize>,
        // Reject the first admin call with 401 to exercise the refresh path.
        reject_first: Arc<AtomicBool>,
        // Treat the first issued token as revoked.
        revoke_first_token: Arc<AtomicBool>,
        removed_mappings: Arc<std::sync::Mutex<Vec<serde_json::Value>>>,
    }

    fn authorized(headers: &HeaderMap, upstream: &Upstream) -> bool {
        if upstream.reject_first.swap(false, Ordering::SeqCst) {
            return false;
        }
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if upstream.revoke_first_token.load(Ordering::SeqCst) && bearer == "Bearer token-1" {
            return false;
        }
        bearer.starts_with("Bearer token-")
    }

    async fn token(State(up): State<Upstream>) -> impl IntoResponse {
        let n = up.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({ "access_token": format!("token-{n}"), "expires_in": 300 }))
    }

    async fn list_users(State(up): State<Upstream>, headers: HeaderMap) -> axum::response::Response {
        if !authorized(&headers, &up) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!([{ "id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427", "username": "alice", "extra": 1 }]))
            .into_response()
    }

    async fn create_user(State(up): State<Upstream>, headers: HeaderMap) -> axum::response::Response {
        if !authorized(&headers, &up) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        (
            StatusCode::CREATED,
            [(header::LOCATION, "http://kc/admin/realms/demo/users/6f1d9b1e-8a43-4a6b-9d8e-1c2b3a4d5e6f")],
        )
            .into_response()
    }

    async fn get_user(Path(id): Path<String>) -> axum::response::Response {
        if id == "00000000-0000-0000-0000-000000000000" {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": "User not found" }))).into_response();
        }
        (StatusCode::CONFLICT, Json(json!({ "errorMessage": "odd" }))).into_response()
    }

    async fn role_by_name(Path(name): Path<String>) -> axum::response::Response {
        if name == "ghost" {
            return StatusCode::NOT_FOUND.into_response();
        }
        Json(json!({ "id": format!("id-{name}"), "name": name, "composite": false })).into_response()
    }

    async fn remove_mappings(
        State(up): State<Upstream>,
        Json(body): Json<serde_json::Value>,
    ) -> StatusCode {
        up.removed_mappings.lock().unwrap().push(body);
        StatusCode::NO_CONTENT
    }

    async fn regenerate_secret() -> Json<serde_json::Value> {
        Json(json!({ "type": "secret", "value": "fresh-secret" }))
    }

    async fn spawn(upstream: Upstream) -> SocketAddr {
        let router = Router::new()
            .route("/realms/demo/protocol/openid-connect/token", post(token))
            .route("/admin/realms/demo/users", get(list_users).post(create_user))
            .route("/admin/realms/demo/users/{id}", get(get_user))
            .route("/admin/realms/demo/roles/{name}", get(role_by_name))
            .route(
                "/admin/realms/demo/users/{id}/role-mappings/realm",
                axum::routing::delete(remove_mappings),
            )
            .route(
                "/admin/realms/demo/clients/{id}/client-secret",
                post(regenerate_secret),
            )
            .with_state(upstream);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn admin(addr: SocketAddr) -> KeycloakAdmin {
        let http = Client::builder()
            .timeout(Duration::from_secs(2))
            .no_proxy()
            .build()
            .unwrap();
        KeycloakAdmin::with_client(
            http,
            KeycloakAdminConfig {
                base_url: format!("http://{addr}/"),
                realm: "demo".into(),
                client_id: "admin-cli".into(),
                client_secret: "s3cret".into(),
                timeout: Duration::from_secs(2),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_users_with_a_cached_token() {
        let upstream = Upstream::default();
        let kc = admin(spawn(upstream.clone()).await);

        let users = kc.list_users(&UserQuery::default()).await.unwrap();
        assert_eq!(users[0].username.as_deref(), Some("alice"));
        kc.list_users(&UserQuery::default()).await.unwrap();

        assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refreshes_token_once_after_401() {
        let upstream = Upstream::default();
        upstream.reject_first.store(true, Ordering::SeqCst);
        let kc = admin(spawn(upstream.clone()).await);

        assert!(kc.list_users(&UserQuery::default()).await.is_ok());
        assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_401s_refresh_the_token_once() {
        let upstream = Upstream::default();
        upstream.revoke_first_token.store(true, Ordering::SeqCst);
        let kc = admin(spawn(upstream.clone()).await);

        let (qa, qb) = (UserQuery::default(), UserQuery::default());
        let (a, b) = tokio::join!(kc.list_users(&qa), kc.list_users(&qb));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(upstream.token_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn create_reads_id_from_location() {
        let kc = admin(spawn(Upstream::default()).await);
        let id = kc.create_user(&UserRepresentation::default()).await.unwrap();
        assert_eq!(id.to_string(), "6f1d9b1e-8a43-4a6b-9d8e-1c2b3a4d5e6f");
    }

    #[tokio::test]
    async fn maps_upstream_statuses() {
        let kc = admin(spawn(Upstream::default()).await);

        let missing = kc.get_user(Uuid::nil()).await.unwrap_err();
        assert!(matches!(missing, UpstreamError::NotFound));

        let conflict = kc.get_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(conflict, UpstreamError::Conflict(ref m) if m == "odd"));
    }

    #[tokio::test]
    async fn role_removal_sends_full_representations() {
        let upstream = Upstream::default();
        let kc = admin(spawn(upstream.clone()).await);

        kc.remove_realm_roles(Uuid::new_v4(), &["auditor".into()])
            .await
            .unwrap();

        let removed = upstream.removed_mappings.lock().unwrap().clone();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0][0]["id"], "id-auditor");
        assert_eq!(removed[0][0]["name"], "auditor");
    }

    #[tokio::test]
    async fn unknown_role_stops_removal_before_the_mapping_call() {
        let upstream = Upstream::default();
        let kc = admin(spawn(upstream.clone()).await);

        let err = kc
            .remove_realm_roles(Uuid::new_v4(), &["auditor".into(), "ghost".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::NotFound));
        assert!(upstream.removed_mappings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regenerated_secret_is_parsed() {
        let kc = admin(spawn(Upstream::default()).await);
        let secret = kc.regenerate_client_secret(Uuid::new_v4()).await.unwrap();
        assert_eq!(secret.kind.as_deref(), Some("secret"));
        assert_eq!(secret.value.as_deref(), Some("fresh-secret"));
    }

    #[test]
    fn debug_hides_secret() {
        let kc = KeycloakAdmin::new(KeycloakAdminConfig {
            base_url: "http://kc:8080".into(),
            realm: "demo".into(),
            client_id: "admin-cli".into(),
            client_secret: "s3cret".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let rendered = format!("{kc:?}");
        assert!(rendered.contains("admin-cli"));
        assert!(!rendered.contains("s3cret"));
        assert_eq!(kc.url(&["users"]).as_str(), "http://kc:8080/admin/realms/demo/users");
    }
}
