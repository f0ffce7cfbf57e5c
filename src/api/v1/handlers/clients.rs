/*
 * Responsibility
 * - /clients 系 CRUD handler, client secret の取得・再発行
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    api::v1::{
        dto::{
            ApiResponse,
            clients::{CreateClientRequest, UpdateClientRequest},
        },
        extractors::{ApiJson, AuthCtxExtractor, ClientId},
    },
    error::AppError,
    services::admin::{ClientQuery, ClientRepresentation, ClientSecretRepresentation},
    state::AppState,
};

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientQuery>,
) -> Result<ApiResponse<Vec<ClientRepresentation>>, AppError> {
    Ok(ApiResponse::list(state.admin.list_clients(&query).await?))
}

pub async fn get_client(
    State(state): State<AppState>,
    client: ClientId,
) -> Result<ApiResponse<ClientRepresentation>, AppError> {
    Ok(ApiResponse::data(state.admin.get_client(client.id).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> Result<(StatusCode, ApiResponse<Value>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let id = state.admin.create_client(&req.into_representation()).await?;
    tracing::info!(actor = ctx.actor(), client_id = %id, "client created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(json!({ "id": id })).with_message("Client created successfully"),
    ))
}

pub async fn update_client(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    client: ClientId,
    ApiJson(req): ApiJson<UpdateClientRequest>,
) -> Result<ApiResponse<()>, AppError> {
    req.validate().map_err(AppError::validation)?;

    state
        .admin
        .update_client(client.id, &req.into_representation())
        .await?;
    tracing::info!(actor = ctx.actor(), client_id = %client.id, "client updated");

    Ok(ApiResponse::message("Client updated successfully"))
}

pub async fn delete_client(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    client: ClientId,
) -> Result<ApiResponse<()>, AppError> {
    state.admin.delete_client(client.id).await?;
    tracing::info!(actor = ctx.actor(), client_id = %client.id, "client deleted");

    Ok(ApiResponse::message("Client deleted successfully"))
}

pub async fn get_client_secret(
    State(state): State<AppState>,
    client: ClientId,
) -> Result<ApiResponse<ClientSecretRepresentation>, AppError> {
    Ok(ApiResponse::data(state.admin.client_secret(client.id).await?))
}

pub async fn regenerate_client_secret(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    client: ClientId,
) -> Result<ApiResponse<ClientSecretRepresentation>, AppError> {
    let secret = state.admin.regenerate_client_secret(client.id).await?;
    // The value itself never goes to the log.
    tracing::info!(actor = ctx.actor(), client_id = %client.id, "client secret regenerated");

    Ok(ApiResponse::data(secret).with_message("Client secret regenerated successfully"))
}
