/*
 * Responsibility
 * - 環境変数の読み込み (Keycloak 接続情報, 認証 gate 設定, sensor feed, HTTP 制限, CORS など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::authz::RoleRequirement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Log output format. Read before the rest of the config so tracing is up first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub keycloak_base_url: String,
    pub keycloak_realm: String,
    pub keycloak_admin_client_id: String,
    pub keycloak_admin_client_secret: String,
    /// Public (browser) client used for the login redirect.
    pub keycloak_client_id: String,
    pub public_base_url: String,

    pub auth_issuer: String,
    pub auth_audience: Option<String>,
    pub access_token_leeway_seconds: u64,
    pub realm_public_key_pem: String,
    pub auth_timeout: Duration,

    pub upstream_timeout: Duration,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub admin_role: RoleRequirement,
    pub expose_role_details: bool,

    pub sensor_resource: String,
    pub sensor_history_capacity: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets and key material stay out of logs.
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("keycloak_base_url", &self.keycloak_base_url)
            .field("keycloak_realm", &self.keycloak_realm)
            .field("keycloak_client_id", &self.keycloak_client_id)
            .field("auth_issuer", &self.auth_issuer)
            .field("auth_audience", &self.auth_audience)
            .field("admin_role", &self.admin_role.labels())
            .field("sensor_resource", &self.sensor_resource)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (the process environment in `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port: u16 = parse_or(get("PORT"), 3000, "PORT")?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let keycloak_base_url = require("KEYCLOAK_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        if url::Url::parse(&keycloak_base_url).is_err() {
            return Err(ConfigError::Invalid("KEYCLOAK_BASE_URL"));
        }
        let keycloak_realm = require("KEYCLOAK_REALM")?;
        let keycloak_admin_client_id = require("KEYCLOAK_ADMIN_CLIENT_ID")?;
        let keycloak_admin_client_secret = require("KEYCLOAK_ADMIN_CLIENT_SECRET")?;
        let keycloak_client_id =
            get("KEYCLOAK_CLIENT_ID").unwrap_or_else(|| keycloak_admin_client_id.clone());

        let public_base_url = get("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let auth_issuer = get("AUTH_ISSUER")
            .unwrap_or_else(|| format!("{}/realms/{}", keycloak_base_url, keycloak_realm));
        let auth_audience = get("AUTH_AUDIENCE");

        let access_token_leeway_seconds = parse_or(
            get("ACCESS_TOKEN_LEEWAY_SECONDS"),
            60,
            "ACCESS_TOKEN_LEEWAY_SECONDS",
        )?;

        let realm_public_key_pem =
            normalize_public_key_pem(&require("REALM_PUBLIC_KEY_PEM")?.replace("\\n", "\n"));

        let auth_timeout =
            Duration::from_millis(parse_or(get("AUTH_TIMEOUT_MS"), 5000, "AUTH_TIMEOUT_MS")?);
        let upstream_timeout = Duration::from_secs(parse_or(
            get("UPSTREAM_TIMEOUT_SECONDS"),
            10,
            "UPSTREAM_TIMEOUT_SECONDS",
        )?);
        let request_timeout = Duration::from_secs(parse_or(
            get("REQUEST_TIMEOUT_SECONDS"),
            30,
            "REQUEST_TIMEOUT_SECONDS",
        )?);
        let request_body_limit_bytes = parse_or(
            get("REQUEST_BODY_LIMIT_BYTES"),
            1024 * 1024,
            "REQUEST_BODY_LIMIT_BYTES",
        )?;

        let admin_role = get("ADMIN_ROLE")
            .unwrap_or_else(|| "realm:admin".to_string())
            .parse::<RoleRequirement>()
            .map_err(|_| ConfigError::Invalid("ADMIN_ROLE"))?;
        if admin_role.is_empty() {
            return Err(ConfigError::Invalid("ADMIN_ROLE"));
        }

        let expose_role_details = match get("EXPOSE_ROLE_DETAILS") {
            None => false,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::Invalid("EXPOSE_ROLE_DETAILS")),
            },
        };

        let sensor_resource =
            get("SENSOR_RESOURCE").unwrap_or_else(|| "robot-control-app".to_string());
        let sensor_history_capacity: usize = parse_or(
            get("SENSOR_HISTORY_CAPACITY"),
            1000,
            "SENSOR_HISTORY_CAPACITY",
        )?;
        if sensor_history_capacity == 0 {
            return Err(ConfigError::Invalid("SENSOR_HISTORY_CAPACITY"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            keycloak_base_url,
            keycloak_realm,
            keycloak_admin_client_id,
            keycloak_admin_client_secret,
            keycloak_client_id,
            public_base_url,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            realm_public_key_pem,
            auth_timeout,
            upstream_timeout,
            request_timeout,
            request_body_limit_bytes,
            admin_role,
            expose_role_details,
            sensor_resource,
            sensor_history_capacity,
        })
    }

    /// `<base>/realms/<realm>/protocol/openid-connect`
    pub fn oidc_endpoint(&self, name: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{}",
            self.keycloak_base_url, self.keycloak_realm, name
        )
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T, key: &'static str) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

/// The realm settings page shows the key as bare base64; accept that too.
fn normalize_public_key_pem(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("-----BEGIN") {
        return format!("{}\n", trimmed);
    }

    let body: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in body.as_bytes().chunks(64) {
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("KEYCLOAK_BASE_URL", "http://kc:8080/".to_string()),
            ("KEYCLOAK_REALM", "demo".to_string()),
            ("KEYCLOAK_ADMIN_CLIENT_ID", "admin-cli".to_string()),
            ("KEYCLOAK_ADMIN_CLIENT_SECRET", "s3cret".to_string()),
            ("REALM_PUBLIC_KEY_PEM", "MIIBIjAN".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_are_derived_from_required_values() {
        let cfg = load(&base()).unwrap();
        assert_eq!(cfg.addr.port(), 3000);
        assert_eq!(cfg.app_env, AppEnv::Development);
        assert_eq!(cfg.keycloak_base_url, "http://kc:8080");
        assert_eq!(cfg.keycloak_client_id, "admin-cli");
        assert_eq!(cfg.auth_issuer, "http://kc:8080/realms/demo");
        assert_eq!(cfg.public_base_url, "http://localhost:3000");
        assert_eq!(cfg.auth_audience, None);
        assert_eq!(cfg.auth_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.request_body_limit_bytes, 1024 * 1024);
        assert_eq!(cfg.admin_role.labels(), vec!["realm:admin"]);
        assert!(!cfg.expose_role_details);
        assert_eq!(cfg.sensor_resource, "robot-control-app");
        assert_eq!(cfg.sensor_history_capacity, 1000);
        assert_eq!(
            cfg.oidc_endpoint("auth"),
            "http://kc:8080/realms/demo/protocol/openid-connect/auth"
        );
    }

    #[test]
    fn missing_required_value_is_reported_by_name() {
        let mut vars = base();
        vars.remove("KEYCLOAK_REALM");
        assert!(matches!(load(&vars), Err(ConfigError::Missing("KEYCLOAK_REALM"))));
    }

    #[test]
    fn invalid_values_fail_startup() {
        for (key, value) in [
            ("PORT", "eighty"),
            ("AUTH_TIMEOUT_MS", "-1"),
            ("ADMIN_ROLE", "realm:"),
            ("EXPOSE_ROLE_DETAILS", "maybe"),
            ("KEYCLOAK_BASE_URL", "not a url"),
            ("SENSOR_HISTORY_CAPACITY", "0"),
        ] {
            let mut vars = base();
            vars.insert(key, value.to_string());
            assert!(
                matches!(load(&vars), Err(ConfigError::Invalid(k)) if k == key),
                "{key}={value} should be invalid"
            );
        }
    }

    #[test]
    fn admin_role_accepts_a_list() {
        let mut vars = base();
        vars.insert("ADMIN_ROLE", "realm:admin, realm-management:manage-users".to_string());
        vars.insert("EXPOSE_ROLE_DETAILS", "true".to_string());
        let cfg = load(&vars).unwrap();
        assert_eq!(
            cfg.admin_role.labels(),
            vec!["realm:admin", "realm-management:manage-users"]
        );
        assert!(cfg.expose_role_details);
    }

    #[test]
    fn public_key_is_wrapped_or_unescaped() {
        let bare = normalize_public_key_pem(&"A".repeat(70));
        assert!(bare.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(bare.contains(&format!("{}\n{}\n", "A".repeat(64), "A".repeat(6))));

        let mut vars = base();
        vars.insert(
            "REALM_PUBLIC_KEY_PEM",
            "-----BEGIN PUBLIC KEY-----\\nABC\\n-----END PUBLIC KEY-----".to_string(),
        );
        let cfg = load(&vars).unwrap();
        assert_eq!(
            cfg.realm_public_key_pem,
            "-----BEGIN PUBLIC KEY-----\nABC\n-----END PUBLIC KEY-----\n"
        );
    }
}
