/*
 * Responsibility
 * - Users / role-mapping / password の request DTO
 * - validate() で形式チェック、into_representation() で upstream 形式へ
 */
use serde::{Deserialize, Serialize};

use crate::services::admin::{CredentialRepresentation, RoleRepresentation, UserRepresentation};

use super::validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
    /// Initial password; set as a temporary credential unless `temporary` is false.
    pub password: Option<String>,
    pub temporary: Option<bool>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let username = validate::required(&self.username, "Username is required")?;
        if username.chars().count() < 3 {
            return Err("Username must be at least 3 characters long");
        }
        if !validate::looks_like_email(&self.email) {
            return Err("Valid email is required");
        }
        validate::required(&self.first_name, "First name is required")?;
        validate::required(&self.last_name, "Last name is required")?;
        if let Some(password) = &self.password {
            validate::password(password)?;
        }
        Ok(())
    }

    pub fn into_representation(self) -> UserRepresentation {
        let temporary = self.temporary.unwrap_or(true);
        UserRepresentation {
            username: Some(self.username.trim().to_string()),
            email: Some(self.email.trim().to_ascii_lowercase()),
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            enabled: Some(self.enabled),
            email_verified: Some(false),
            credentials: self
                .password
                .map(|p| vec![CredentialRepresentation::password(p, temporary)]),
            ..UserRepresentation::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(email) = &self.email
            && !validate::looks_like_email(email)
        {
            return Err("Valid email is required");
        }
        validate::optional_non_empty(self.first_name.as_deref(), "First name cannot be empty")?;
        validate::optional_non_empty(self.last_name.as_deref(), "Last name cannot be empty")?;
        Ok(())
    }

    /// Only the fields that were sent; the upstream leaves the rest untouched.
    pub fn into_representation(self) -> UserRepresentation {
        UserRepresentation {
            email: self.email.map(|e| e.trim().to_ascii_lowercase()),
            first_name: self.first_name.map(|v| v.trim().to_string()),
            last_name: self.last_name.map(|v| v.trim().to_string()),
            enabled: self.enabled,
            ..UserRepresentation::default()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub temporary: Option<bool>,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate::password(&self.password)
    }

    pub fn into_credential(self) -> CredentialRepresentation {
        CredentialRepresentation::password(self.password, self.temporary.unwrap_or(true))
    }
}

/// Realm roles by name, for both assignment and removal.
#[derive(Debug, Deserialize)]
pub struct RealmRoleNamesRequest {
    pub roles: Vec<String>,
}

impl RealmRoleNamesRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.roles.is_empty() {
            return Err("Roles must be a non-empty array");
        }
        for role in &self.roles {
            validate::required(role, "Each role must be a non-empty string")?;
        }
        Ok(())
    }

    pub fn into_names(self) -> Vec<String> {
        self.roles.into_iter().map(|r| r.trim().to_string()).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub enabled: bool,
}

impl UpdateStatusRequest {
    pub fn into_representation(self) -> UserRepresentation {
        UserRepresentation {
            enabled: Some(self.enabled),
            ..UserRepresentation::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub user_ids: Vec<String>,
}

impl BulkDeleteRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.user_ids.is_empty() {
            return Err("User IDs must be a non-empty array");
        }
        for id in &self.user_ids {
            validate::required(id, "Each user ID must be a non-empty string")?;
        }
        Ok(())
    }
}

/// Per-user result of a bulk delete; one failure does not stop the rest.
#[derive(Debug, Serialize, PartialEq)]
pub struct BulkDeleteOutcome {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkDeleteOutcome {
    pub fn deleted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ClientRoleRef {
    pub id: String,
    pub name: String,
}

/// Client roles must be sent with both id and name.
#[derive(Debug, Deserialize)]
pub struct AssignClientRolesRequest {
    pub roles: Vec<ClientRoleRef>,
}

impl AssignClientRolesRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.roles.is_empty() {
            return Err("Roles must be a non-empty array");
        }
        for role in &self.roles {
            validate::required(&role.id, "Role ID is required")?;
            validate::required(&role.name, "Role name is required")?;
        }
        Ok(())
    }

    pub fn into_representations(self) -> Vec<RoleRepresentation> {
        self.roles
            .into_iter()
            .map(|r| RoleRepresentation {
                id: Some(r.id.trim().to_string()),
                name: r.name.trim().to_string(),
                client_role: Some(true),
                ..RoleRepresentation::default()
            })
            .collect()
    }
}
