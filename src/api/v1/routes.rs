/*
 * Responsibility
 * - v1 admin API の URL 構造を定義
 * - path parameter 名は extractors::resource_id::types と揃える
 * - 全 admin route に admin gate (API protection, JSON + AppError) を route_layer で適用
 * - sensors は resource role (reader / writer) を method 単位で gate する
 */
use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::authz::RoleDescriptor;
use crate::state::AppState;

use crate::api::v1::handlers::{
    clients::{
        create_client, delete_client, get_client, get_client_secret, list_clients,
        regenerate_client_secret, update_client,
    },
    events::list_events,
    groups::{create_group, list_groups},
    roles::{create_client_role, create_realm_role, list_client_roles, list_realm_roles},
    sensors::{connect_feed, disconnect_feed, latest_reading, reading_history, record_reading},
    sessions::{list_sessions, logout_user},
    users::{
        add_user_to_group, assign_client_roles, assign_realm_roles, bulk_delete, create_user,
        delete_user, get_user, list_role_mappings, list_user_groups, list_users,
        remove_realm_roles, reset_password, update_status, update_user,
    },
};

pub const SENSOR_READER: &str = "sensor_reader";
pub const SENSOR_WRITER: &str = "sensor_writer";

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin_gate = state.api.gate(state.admin_role.clone());

    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/bulk/delete", post(bulk_delete))
        .route("/users/{user_id}/status", patch(update_status))
        .route("/users/{user_id}/reset-password", put(reset_password))
        .route(
            "/users/{user_id}/role-mappings",
            get(list_role_mappings)
                .post(assign_realm_roles)
                .delete(remove_realm_roles),
        )
        .route(
            "/users/{user_id}/role-mappings/clients/{client_id}",
            post(assign_client_roles),
        )
        .route(
            "/users/{user_id}/sessions",
            get(list_sessions).delete(logout_user),
        )
        .route("/users/{user_id}/groups", get(list_user_groups))
        .route("/users/{user_id}/groups/{group_id}", put(add_user_to_group))
        .route("/groups", get(list_groups).post(create_group))
        .route("/roles", get(list_realm_roles).post(create_realm_role))
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/{client_id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route(
            "/clients/{client_id}/roles",
            get(list_client_roles).post(create_client_role),
        )
        .route(
            "/clients/{client_id}/client-secret",
            get(get_client_secret).post(regenerate_client_secret),
        )
        .route("/events", get(list_events))
        .route_layer(admin_gate)
}

pub fn sensor_routes(state: &AppState) -> Router<AppState> {
    let reader = state.sensor_api.require_role(RoleDescriptor::resource(
        state.sensor_resource.as_str(),
        SENSOR_READER,
    ));
    let writer = state.sensor_api.require_role(RoleDescriptor::resource(
        state.sensor_resource.as_str(),
        SENSOR_WRITER,
    ));

    Router::new()
        .route(
            "/",
            get(latest_reading)
                .route_layer(reader.clone())
                .merge(post(record_reading).route_layer(writer.clone())),
        )
        .route("/history", get(reading_history).route_layer(reader))
        .route("/connect", post(connect_feed).route_layer(writer.clone()))
        .route("/disconnect", post(disconnect_feed).route_layer(writer))
}
