//! Identity admin API (users, groups, roles, clients, sessions, events).
//!
//! Handlers only see `IdentityAdmin`; `KeycloakAdmin` is the production
//! implementation.
use async_trait::async_trait;
use uuid::Uuid;

pub mod error;
pub mod keycloak;
pub mod model;
pub mod token_cache;

pub use error::{UpstreamError, UpstreamResult};
pub use keycloak::{KeycloakAdmin, KeycloakAdminConfig};
pub use model::{
    ClientQuery, ClientRepresentation, ClientSecretRepresentation, CredentialRepresentation,
    EventQuery, EventRepresentation, GroupRepresentation, RoleRepresentation, UserQuery,
    UserRepresentation, UserSessionRepresentation,
};
pub use token_cache::TokenCache;

/// Implementations must be cheap to share (`Arc<dyn IdentityAdmin>` in state).
#[async_trait]
pub trait IdentityAdmin: Send + Sync + 'static {
    // users
    async fn list_users(&self, query: &UserQuery) -> UpstreamResult<Vec<UserRepresentation>>;
    async fn get_user(&self, id: Uuid) -> UpstreamResult<UserRepresentation>;
    /// Returns the id assigned by the upstream.
    async fn create_user(&self, user: &UserRepresentation) -> UpstreamResult<Uuid>;
    async fn update_user(&self, id: Uuid, user: &UserRepresentation) -> UpstreamResult<()>;
    async fn delete_user(&self, id: Uuid) -> UpstreamResult<()>;
    async fn reset_password(
        &self,
        id: Uuid,
        credential: &CredentialRepresentation,
    ) -> UpstreamResult<()>;

    // role mappings
    async fn user_realm_roles(&self, id: Uuid) -> UpstreamResult<Vec<RoleRepresentation>>;
    /// Resolves each realm role by name, then maps them onto the user.
    async fn assign_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()>;
    /// Resolves each realm role by name, then removes the mappings.
    async fn remove_realm_roles(&self, id: Uuid, role_names: &[String]) -> UpstreamResult<()>;
    async fn assign_client_roles(
        &self,
        id: Uuid,
        client: Uuid,
        roles: &[RoleRepresentation],
    ) -> UpstreamResult<()>;

    // groups
    async fn list_groups(&self) -> UpstreamResult<Vec<GroupRepresentation>>;
    async fn create_group(&self, group: &GroupRepresentation) -> UpstreamResult<Uuid>;
    async fn user_groups(&self, id: Uuid) -> UpstreamResult<Vec<GroupRepresentation>>;
    async fn add_user_to_group(&self, id: Uuid, group: Uuid) -> UpstreamResult<()>;

    // roles
    async fn list_realm_roles(&self) -> UpstreamResult<Vec<RoleRepresentation>>;
    async fn create_realm_role(&self, role: &RoleRepresentation) -> UpstreamResult<()>;
    async fn list_client_roles(&self, client: Uuid) -> UpstreamResult<Vec<RoleRepresentation>>;
    async fn create_client_role(
        &self,
        client: Uuid,
        role: &RoleRepresentation,
    ) -> UpstreamResult<()>;

    // clients
    async fn list_clients(&self, query: &ClientQuery) -> UpstreamResult<Vec<ClientRepresentation>>;
    async fn get_client(&self, id: Uuid) -> UpstreamResult<ClientRepresentation>;
    async fn create_client(&self, client: &ClientRepresentation) -> UpstreamResult<Uuid>;
    async fn update_client(&self, id: Uuid, client: &ClientRepresentation) -> UpstreamResult<()>;
    async fn delete_client(&self, id: Uuid) -> UpstreamResult<()>;
    async fn client_secret(&self, id: Uuid) -> UpstreamResult<ClientSecretRepresentation>;
    async fn regenerate_client_secret(
        &self,
        id: Uuid,
    ) -> UpstreamResult<ClientSecretRepresentation>;

    // sessions & events
    async fn user_sessions(&self, id: Uuid) -> UpstreamResult<Vec<UserSessionRepresentation>>;
    async fn logout_user(&self, id: Uuid) -> UpstreamResult<()>;
    async fn events(&self, query: &EventQuery) -> UpstreamResult<Vec<EventRepresentation>>;
}
