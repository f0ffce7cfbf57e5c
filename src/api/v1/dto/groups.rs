/*
 * Responsibility
 * - group 作成 DTO (top-level group のみ)
 */
use serde::Deserialize;

use crate::services::admin::GroupRepresentation;

use super::validate;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

impl CreateGroupRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = validate::required(&self.name, "Group name is required")?;
        // '/' is the path separator upstream.
        if name.contains('/') {
            return Err("Group name cannot contain '/'");
        }
        Ok(())
    }

    pub fn into_representation(self) -> GroupRepresentation {
        GroupRepresentation {
            name: self.name.trim().to_string(),
            ..GroupRepresentation::default()
        }
    }
}
