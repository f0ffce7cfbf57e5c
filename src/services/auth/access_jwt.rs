use async_trait::async_trait;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::Value;

use crate::authz::gateway::{AuthFailure, AuthGateway, bearer_token};

/// Bearer access-token gateway for realm-issued (RS256) tokens.
///
/// - Signature, `exp`, `iss` and (if configured) `aud` are checked by jsonwebtoken.
/// - `sub` must be present and non-empty.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct BearerJwtGateway {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for BearerJwtGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("BearerJwtGateway")
            .field("validation", &self.validation)
            .finish()
    }
}

impl BearerJwtGateway {
    pub fn new(
        realm_public_key_pem: &str,
        issuer: &str,
        audience: Option<&str>,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        let decoding_key = DecodingKey::from_rsa_pem(realm_public_key_pem.as_bytes())
            .map_err(|e| format!("invalid realm public key pem: {}", e))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[issuer]);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            // Realm access tokens often carry `account` or nothing useful as aud.
            None => validation.validate_aud = false,
        }
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Verify a token and return its claims as JSON.
    pub fn verify(&self, token: &str) -> Result<Value, AuthFailure> {
        let data = jsonwebtoken::decode::<Value>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthFailure::InvalidToken(e.to_string()))?;

        let sub_present = data
            .claims
            .get("sub")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !sub_present {
            return Err(AuthFailure::InvalidToken("empty 'sub' claim".to_string()));
        }

        Ok(data.claims)
    }
}

#[async_trait]
impl AuthGateway for BearerJwtGateway {
    async fn authenticate(&self, parts: &Parts) -> Result<Value, AuthFailure> {
        let token = bearer_token(&parts.headers).ok_or(AuthFailure::MissingToken)?;

        self.verify(token).inspect_err(|err| {
            tracing::debug!(error = %err, "access token verification failed");
        })
    }
}
