/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - identity admin client, sensor feed, 認証 gateway, API / sensor / Web 用の Protection
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::response::IntoResponse;

use crate::authz::{AuthGateway, DenialKind, Protection, ProtectionConfig, RoleRequirement};
use crate::error::AppError;
use crate::services::admin::IdentityAdmin;
use crate::services::sensors::SensorFeed;

const API_UNAUTHORIZED: &str = "Authentication required to access the admin API";
const API_FORBIDDEN: &str = "Admin privileges required to manage the identity realm";
const SENSOR_UNAUTHORIZED: &str = "Authentication required to access sensor management API";
const SENSOR_FORBIDDEN: &str = "Sensor writer privileges required to manage sensors";

/// Gate settings shared by the API and console protections.
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub admin_role: RoleRequirement,
    pub auth_timeout: Duration,
    pub expose_role_details: bool,
    /// Client whose `sensor_reader` / `sensor_writer` roles gate `/sensors`.
    pub sensor_resource: String,
}

/// What the console endpoints need to build login/logout redirects.
#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    pub authorize_url: String,
    pub end_session_url: String,
    pub client_id: String,
    pub public_base_url: String,
    pub environment: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub admin: Arc<dyn IdentityAdmin>,
    pub sensors: Arc<dyn SensorFeed>,
    pub gateway: Arc<dyn AuthGateway>,
    /// JSON only; denials flow through `AppError`.
    pub api: Protection,
    /// Same shape as `api`, with the sensor wording.
    pub sensor_api: Protection,
    /// Negotiated; browsers are redirected to `/login`.
    pub web: Protection,
    pub admin_role: RoleRequirement,
    pub sensor_resource: String,
    pub console: Arc<ConsoleSettings>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        admin: Arc<dyn IdentityAdmin>,
        sensors: Arc<dyn SensorFeed>,
        gateway: Arc<dyn AuthGateway>,
        access: AccessSettings,
        console: ConsoleSettings,
    ) -> Self {
        let api_config = json_config(&access, API_UNAUTHORIZED, API_FORBIDDEN);
        let sensor_config = json_config(&access, SENSOR_UNAUTHORIZED, SENSOR_FORBIDDEN);

        let web_config = ProtectionConfig::default()
            .with_timeout(access.auth_timeout)
            .with_role_details(access.expose_role_details);

        Self {
            api: Protection::new(gateway.clone(), api_config),
            sensor_api: Protection::new(gateway.clone(), sensor_config),
            web: Protection::new(gateway.clone(), web_config),
            admin,
            sensors,
            gateway,
            admin_role: access.admin_role,
            sensor_resource: access.sensor_resource,
            console: Arc::new(console),
            started_at: Instant::now(),
        }
    }
}

/// JSON-only protection whose denials are rendered as `AppError`.
fn json_config(
    access: &AccessSettings,
    unauthorized: &'static str,
    forbidden: &'static str,
) -> ProtectionConfig {
    ProtectionConfig::json()
        .with_messages(unauthorized, forbidden)
        .with_timeout(access.auth_timeout)
        .with_role_details(access.expose_role_details)
        .with_denial_handler(move |record| {
            let message = match record.kind {
                DenialKind::Authentication => unauthorized,
                DenialKind::Authorization | DenialKind::Evaluation => forbidden,
            };
            AppError::denied(&record, message).into_response()
        })
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("admin_role", &self.admin_role.labels())
            .field("sensor_resource", &self.sensor_resource)
            .field("console", &self.console)
            .finish_non_exhaustive()
    }
}
