/*
 * Responsibility
 * - /groups 一覧・作成 (メンバー割り当ては users 側)
 */
use axum::{extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::{
    api::v1::{
        dto::{ApiResponse, groups::CreateGroupRequest},
        extractors::{ApiJson, AuthCtxExtractor},
    },
    error::AppError,
    services::admin::GroupRepresentation,
    state::AppState,
};

pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<GroupRepresentation>>, AppError> {
    Ok(ApiResponse::list(state.admin.list_groups().await?))
}

pub async fn create_group(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<CreateGroupRequest>,
) -> Result<(StatusCode, ApiResponse<Value>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let id = state.admin.create_group(&req.into_representation()).await?;
    tracing::info!(actor = ctx.actor(), group_id = %id, "group created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(json!({ "id": id })).with_message("Group created successfully"),
    ))
}
