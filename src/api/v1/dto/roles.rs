/*
 * Responsibility
 * - realm / client role の作成 DTO
 */
use serde::Deserialize;

use crate::services::admin::RoleRepresentation;

use super::validate;

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

impl CreateRoleRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = validate::required(&self.name, "Role name is required")?;
        if name.contains(char::is_whitespace) {
            return Err("Role name cannot contain whitespace");
        }
        Ok(())
    }

    pub fn into_representation(self) -> RoleRepresentation {
        RoleRepresentation {
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            ..RoleRepresentation::default()
        }
    }
}
