/*
 * Responsibility
 * - client の作成 / 更新 DTO
 */
use serde::Deserialize;

use crate::services::admin::ClientRepresentation;

use super::validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub client_id: String,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub protocol: Option<String>,
    pub public_client: Option<bool>,
    pub redirect_uris: Option<Vec<String>>,
}

impl CreateClientRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate::required(&self.client_id, "Client ID is required")?;
        validate::required(&self.name, "Client name is required")?;
        if let Some(protocol) = &self.protocol
            && !matches!(protocol.as_str(), "openid-connect" | "saml")
        {
            return Err("Protocol must be openid-connect or saml");
        }
        Ok(())
    }

    pub fn into_representation(self) -> ClientRepresentation {
        ClientRepresentation {
            client_id: Some(self.client_id.trim().to_string()),
            name: Some(self.name.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            enabled: Some(self.enabled),
            protocol: Some(self.protocol.unwrap_or_else(|| "openid-connect".to_string())),
            public_client: self.public_client,
            redirect_uris: self.redirect_uris,
            ..ClientRepresentation::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub redirect_uris: Option<Vec<String>>,
}

impl UpdateClientRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate::optional_non_empty(self.name.as_deref(), "Client name cannot be empty")
    }

    pub fn into_representation(self) -> ClientRepresentation {
        ClientRepresentation {
            name: self.name.map(|n| n.trim().to_string()),
            description: self.description.map(|d| d.trim().to_string()),
            enabled: self.enabled,
            redirect_uris: self.redirect_uris,
            ..ClientRepresentation::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_client_rules() {
        let req = CreateClientRequest {
            client_id: "billing-client".into(),
            name: "Billing".into(),
            description: None,
            enabled: true,
            protocol: None,
            public_client: Some(false),
            redirect_uris: None,
        };
        assert!(req.validate().is_ok());
        let rep = req.into_representation();
        assert_eq!(rep.protocol.as_deref(), Some("openid-connect"));

        let no_id = CreateClientRequest {
            client_id: " ".into(),
            name: "Billing".into(),
            description: None,
            enabled: true,
            protocol: Some("ldap".into()),
            public_client: None,
            redirect_uris: None,
        };
        assert_eq!(no_id.validate(), Err("Client ID is required"));
    }
}
