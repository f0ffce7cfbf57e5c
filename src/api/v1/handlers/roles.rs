/*
 * Responsibility
 * - realm role / client role の一覧と作成
 */
use axum::{extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::{ApiResponse, roles::CreateRoleRequest},
        extractors::{ApiJson, AuthCtxExtractor, ClientId},
    },
    error::AppError,
    services::admin::RoleRepresentation,
    state::AppState,
};

pub async fn list_realm_roles(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<RoleRepresentation>>, AppError> {
    Ok(ApiResponse::list(state.admin.list_realm_roles().await?))
}

pub async fn create_realm_role(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, ApiResponse<RoleRepresentation>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let role = req.into_representation();
    state.admin.create_realm_role(&role).await?;
    tracing::info!(actor = ctx.actor(), role = %role.name, "realm role created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(role).with_message("Role created successfully"),
    ))
}

pub async fn list_client_roles(
    State(state): State<AppState>,
    client: ClientId,
) -> Result<ApiResponse<Vec<RoleRepresentation>>, AppError> {
    Ok(ApiResponse::list(
        state.admin.list_client_roles(client.id).await?,
    ))
}

pub async fn create_client_role(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    client: ClientId,
    ApiJson(req): ApiJson<CreateRoleRequest>,
) -> Result<(StatusCode, ApiResponse<RoleRepresentation>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let role = req.into_representation();
    state.admin.create_client_role(client.id, &role).await?;
    tracing::info!(
        actor = ctx.actor(),
        client_id = %client.id,
        role = %role.name,
        "client role created"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(role).with_message("Client role created successfully"),
    ))
}
