#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin_gate::authz::{AuthFailure, AuthGateway, RoleRequirement, gateway::bearer_token};
use admin_gate::services::admin::{
    ClientQuery, ClientRepresentation, ClientSecretRepresentation, CredentialRepresentation,
    EventQuery, EventRepresentation, GroupRepresentation, IdentityAdmin, RoleRepresentation,
    UpstreamError, UpstreamResult, UserQuery, UserRepresentation, UserSessionRepresentation,
};
use admin_gate::services::sensors::InMemorySensorFeed;
use admin_gate::state::{AccessSettings, AppState, ConsoleSettings};
use async_trait::async_trait;
use axum::http::request::Parts;
use serde_json::{Value, json};
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const USER_TOKEN: &str = "user-token";
pub const SENSOR_READER_TOKEN: &str = "sensor-reader-token";
pub const SENSOR_WRITER_TOKEN: &str = "sensor-writer-token";

/// Bearer token -> claims lookup; stands in for signature verification.
pub struct TokenTable(pub HashMap<&'static str, Value>);

impl TokenTable {
    pub fn standard() -> Self {
        Self(HashMap::from([
            (
                ADMIN_TOKEN,
                json!({
                    "sub": "a1",
                    "preferred_username": "root",
                    "email": "root@example.com",
                    "realm_access": { "roles": ["admin", "user"] },
                    "resource_access": { "billing-client": { "roles": ["read", "write"] } }
                }),
            ),
            (
                USER_TOKEN,
                json!({
                    "sub": "u1",
                    "preferred_username": "alice",
                    "realm_access": { "roles": ["user"] },
                    "resource_access": { "billing-client": { "roles": ["read"] } }
                }),
            ),
            (
                SENSOR_READER_TOKEN,
                json!({
                    "sub": "r1",
                    "preferred_username": "monitor",
                    "realm_access": { "roles": ["user"] },
                    "resource_access": { "robot-control-app": { "roles": ["sensor_reader"] } }
                }),
            ),
            (
                SENSOR_WRITER_TOKEN,
                json!({
                    "sub": "w1",
                    "preferred_username": "robot-bridge",
                    "resource_access": {
                        "robot-control-app": { "roles": ["sensor_reader", "sensor_writer"] }
                    }
                }),
            ),
        ]))
    }
}

#[async_trait]
impl AuthGateway for TokenTable {
    async fn authenticate(&self, parts: &Parts) -> Result<Value, AuthFailure> {
        let token = bearer_token(&parts.headers).ok_or(AuthFailure::MissingToken)?;
        self.0
            .get(token)
            .cloned()
            .ok_or_else(|| AuthFailure::InvalidToken("unknown token".into()))
    }
}

/// In-memory identity admin. Records every call name.
#[derive(Default)]
pub struct FakeAdmin {
    pub users: Mutex<HashMap<Uuid, UserRepresentation>>,
    pub realm_roles: Mutex<Vec<RoleRepresentation>>,
    pub user_roles: Mutex<HashMap<Uuid, Vec<String>>>,
    pub clients: Mutex<HashMap<Uuid, ClientRepresentation>>,
    pub client_secrets: Mutex<HashMap<Uuid, String>>,
    pub groups: Mutex<HashMap<Uuid, GroupRepresentation>>,
    pub memberships: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeAdmin {
    pub fn with_user(username: &str) -> (Arc<Self>, Uuid) {
        let admin = Self::default();
        let id = Uuid::new_v4();
        admin.users.lock().unwrap().insert(
            id,
            UserRepresentation {
                id: Some(id.to_string()),
                username: Some(username.to_string()),
                enabled: Some(true),
                ..UserRepresentation::default()
            },
        );
        admin.realm_roles.lock().unwrap().push(RoleRepresentation {
            id: Some(Uuid::new_v4().to_string()),
            name: "auditor".into(),
            ..RoleRepresentation::default()
        });
        (Arc::new(admin), id)
    }

    pub fn add_client(&self, client_id: &str, secret: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.lock().unwrap().insert(
            id,
            ClientRepresentation {
                id: Some(id.to_string()),
                client_id: Some(client_id.to_string()),
                ..ClientRepresentation::default()
            },
        );
        self.client_secrets.lock().unwrap().insert(id, secret.to_string());
        id
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl IdentityAdmin for FakeAdmin {
    async fn list_users(&self, query: &UserQuery) -> UpstreamResult<Vec<UserRepresentation>> {
        self.record("list_users");
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .filter(|u| match &query.search {
                Some(term) => u.username.as_deref().is_some_and(|n| n.contains(term.as_str())),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_user(&self, id: Uuid) -> UpstreamResult<UserRepresentation> {
        self.record("get_user");
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(UpstreamError::NotFound)
    }

    async fn create_user(&self, user: &UserRepresentation) -> UpstreamResult<Uuid> {
        self.record("create_user");
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == user.username) {
            return Err(UpstreamError::Conflict("User exists with same username".into()));
        }
        let id = Uuid::new_v4();
        let mut stored = user.clone();
        stored.id = Some(id.to_string());
        stored.credentials = None;
        users.insert(id, stored);
        Ok(id)
    }

    async fn update_user(&self, id: Uuid, user: &UserRepresentation) -> UpstreamResult<()> {
        self.record("update_user");
        let mut users = self.users.lock().unwrap();
        let stored = users.get_mut(&id).ok_or(UpstreamError::NotFound)?;
        if user.email.is_some() {
            stored.email = user.email.clone();
        }
        if user.first_name.is_some() {
            stored.first_name = user.first_name.clone();
        }
        if user.last_name.is_some() {
            stored.last_name = user.last_name.clone();
        }
        if user.enabled.is_some() {
            stored.enabled = user.enabled;
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> UpstreamResult<()> {
        self.record("delete_user");
        self.users
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(UpstreamError::NotFound)
    }

    async fn reset_password(
        &self,
        id: Uuid,
        _credential: &CredentialRepresentation,
    ) -> UpstreamResult<()> {
        self.record("reset_password");
        self.get_user(id).await.map(|_| ())
    }

    async fn user_realm_roles(&self, id: Uuid) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.record("user_realm_roles");
        let names = self.user_roles.lock().unwrap().get(&id).cloned().unwrap_or_default();
        Ok(names
            .into_iter()
            .map(|name| RoleRepresentation {
                name,
                ..RoleRepresentation::default()
            })
            .collect())
    }

    async fn assign_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()> {
        self.record("assign_realm_roles");
        let known = self.realm_roles.lock().unwrap();
        if role_names.iter().any(|n| !known.iter().any(|r| &r.name == n)) {
            return Err(UpstreamError::NotFound);
        }
        self.user_roles
            .lock()
            .unwrap()
            .entry(id)
            .or_default()
            .extend(role_names.iter().cloned());
        Ok(())
    }

    async fn remove_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()> {
        self.record("remove_realm_roles");
        let known = self.realm_roles.lock().unwrap();
        if role_names.iter().any(|n| !known.iter().any(|r| &r.name == n)) {
            return Err(UpstreamError::NotFound);
        }
        if let Some(held) = self.user_roles.lock().unwrap().get_mut(&id) {
            held.retain(|r| !role_names.contains(r));
        }
        Ok(())
    }

    async fn assign_client_roles(
        &self,
        _id: Uuid,
        _client: Uuid,
        _roles: &[RoleRepresentation],
    ) -> UpstreamResult<()> {
        self.record("assign_client_roles");
        Ok(())
    }

    async fn list_realm_roles(&self) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.record("list_realm_roles");
        Ok(self.realm_roles.lock().unwrap().clone())
    }

    async fn create_realm_role(&self, role: &RoleRepresentation) -> UpstreamResult<()> {
        self.record("create_realm_role");
        let mut roles = self.realm_roles.lock().unwrap();
        if roles.iter().any(|r| r.name == role.name) {
            return Err(UpstreamError::Conflict(format!(
                "Role with name {} already exists",
                role.name
            )));
        }
        roles.push(role.clone());
        Ok(())
    }

    async fn list_client_roles(&self, _client: Uuid) -> UpstreamResult<Vec<RoleRepresentation>> {
        self.record("list_client_roles");
        Ok(Vec::new())
    }

    async fn create_client_role(
        &self,
        _client: Uuid,
        _role: &RoleRepresentation,
    ) -> UpstreamResult<()> {
        self.record("create_client_role");
        Ok(())
    }

    async fn list_clients(&self, _query: &ClientQuery) -> UpstreamResult<Vec<ClientRepresentation>> {
        self.record("list_clients");
        Ok(self.clients.lock().unwrap().values().cloned().collect())
    }

    async fn get_client(&self, id: Uuid) -> UpstreamResult<ClientRepresentation> {
        self.record("get_client");
        self.clients
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(UpstreamError::NotFound)
    }

    async fn create_client(&self, client: &ClientRepresentation) -> UpstreamResult<Uuid> {
        self.record("create_client");
        let id = Uuid::new_v4();
        let mut stored = client.clone();
        stored.id = Some(id.to_string());
        self.clients.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn update_client(&self, id: Uuid, _client: &ClientRepresentation) -> UpstreamResult<()> {
        self.record("update_client");
        self.get_client(id).await.map(|_| ())
    }

    async fn delete_client(&self, id: Uuid) -> UpstreamResult<()> {
        self.record("delete_client");
        self.clients
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(UpstreamError::NotFound)
    }

    async fn client_secret(&self, id: Uuid) -> UpstreamResult<ClientSecretRepresentation> {
        self.record("client_secret");
        let value = self
            .client_secrets
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(UpstreamError::NotFound)?;
        Ok(ClientSecretRepresentation {
            kind: Some("secret".into()),
            value: Some(value),
        })
    }

    async fn regenerate_client_secret(
        &self,
        id: Uuid,
    ) -> UpstreamResult<ClientSecretRepresentation> {
        self.record("regenerate_client_secret");
        let mut secrets = self.client_secrets.lock().unwrap();
        let slot = secrets.get_mut(&id).ok_or(UpstreamError::NotFound)?;
        *slot = Uuid::new_v4().simple().to_string();
        Ok(ClientSecretRepresentation {
            kind: Some("secret".into()),
            value: Some(slot.clone()),
        })
    }

    async fn list_groups(&self) -> UpstreamResult<Vec<GroupRepresentation>> {
        self.record("list_groups");
        Ok(self.groups.lock().unwrap().values().cloned().collect())
    }

    async fn create_group(&self, group: &GroupRepresentation) -> UpstreamResult<Uuid> {
        self.record("create_group");
        let mut groups = self.groups.lock().unwrap();
        if groups.values().any(|g| g.name == group.name) {
            return Err(UpstreamError::Conflict(format!(
                "Top level group named '{}' already exists.",
                group.name
            )));
        }
        let id = Uuid::new_v4();
        let mut stored = group.clone();
        stored.id = Some(id.to_string());
        stored.path = Some(format!("/{}", group.name));
        groups.insert(id, stored);
        Ok(id)
    }

    async fn user_groups(&self, id: Uuid) -> UpstreamResult<Vec<GroupRepresentation>> {
        self.record("user_groups");
        let member_of = self.memberships.lock().unwrap().get(&id).cloned().unwrap_or_default();
        let groups = self.groups.lock().unwrap();
        Ok(member_of.iter().filter_map(|g| groups.get(g).cloned()).collect())
    }

    async fn add_user_to_group(&self, id: Uuid, group: Uuid) -> UpstreamResult<()> {
        self.record("add_user_to_group");
        if !self.users.lock().unwrap().contains_key(&id)
            || !self.groups.lock().unwrap().contains_key(&group)
        {
            return Err(UpstreamError::NotFound);
        }
        let mut memberships = self.memberships.lock().unwrap();
        let member_of = memberships.entry(id).or_default();
        if !member_of.contains(&group) {
            member_of.push(group);
        }
        Ok(())
    }

    async fn user_sessions(&self, id: Uuid) -> UpstreamResult<Vec<UserSessionRepresentation>> {
        self.record("user_sessions");
        self.get_user(id).await?;
        Ok(vec![UserSessionRepresentation {
            id: "s-1".into(),
            user_id: Some(id.to_string()),
            ip_address: Some("10.0.0.7".into()),
            ..UserSessionRepresentation::default()
        }])
    }

    async fn logout_user(&self, id: Uuid) -> UpstreamResult<()> {
        self.record("logout_user");
        self.get_user(id).await.map(|_| ())
    }

    async fn events(&self, query: &EventQuery) -> UpstreamResult<Vec<EventRepresentation>> {
        self.record("events");
        Ok(vec![EventRepresentation {
            kind: query.kind.clone().or(Some("LOGIN".into())),
            user_id: query.user.clone(),
            ..EventRepresentation::default()
        }])
    }
}

pub fn state_with(admin: Arc<FakeAdmin>) -> AppState {
    AppState::new(
        admin,
        Arc::new(InMemorySensorFeed::new(16)),
        Arc::new(TokenTable::standard()),
        AccessSettings {
            admin_role: RoleRequirement::from(admin_gate::authz::RoleDescriptor::realm("admin")),
            auth_timeout: Duration::from_secs(1),
            expose_role_details: false,
            sensor_resource: "robot-control-app".into(),
        },
        ConsoleSettings {
            authorize_url: "http://kc.test/realms/demo/protocol/openid-connect/auth".into(),
            end_session_url: "http://kc.test/realms/demo/protocol/openid-connect/logout".into(),
            client_id: "admin-console".into(),
            public_base_url: "http://console.test".into(),
            environment: "development",
        },
    )
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn read_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8")
}
