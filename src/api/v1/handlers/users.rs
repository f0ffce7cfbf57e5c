/*
 * Responsibility
 * - /users 系 handler (CRUD, status, bulk delete, password reset, role mappings, groups)
 * - Path/Json を extractor で受け、DTO validation → IdentityAdmin 呼び出し
 * - 変更系は actor 付きで audit log を残す
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::{
            ApiResponse,
            users::{
                AssignClientRolesRequest, BulkDeleteOutcome, BulkDeleteRequest, CreateUserRequest,
                RealmRoleNamesRequest, ResetPasswordRequest, UpdateStatusRequest,
                UpdateUserRequest,
            },
        },
        extractors::{ApiJson, AuthCtxExtractor, ClientId, GroupId, UserId},
    },
    error::AppError,
    services::admin::{GroupRepresentation, RoleRepresentation, UserQuery, UserRepresentation},
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<ApiResponse<Vec<UserRepresentation>>, AppError> {
    let users = state.admin.list_users(&query).await?;
    Ok(ApiResponse::list(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    user: UserId,
) -> Result<ApiResponse<UserRepresentation>, AppError> {
    let user = state.admin.get_user(user.id).await?;
    Ok(ApiResponse::data(user))
}

pub async fn create_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, ApiResponse<Value>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let id = state.admin.create_user(&req.into_representation()).await?;
    tracing::info!(actor = ctx.actor(), user_id = %id, "user created");

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(json!({ "id": id })).with_message("User created successfully"),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<ApiResponse<UserRepresentation>, AppError> {
    req.validate().map_err(AppError::validation)?;

    state
        .admin
        .update_user(user.id, &req.into_representation())
        .await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, "user updated");

    let updated = state.admin.get_user(user.id).await?;
    Ok(ApiResponse::data(updated).with_message("User updated successfully"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
) -> Result<ApiResponse<()>, AppError> {
    state.admin.delete_user(user.id).await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, "user deleted");

    Ok(ApiResponse::message("User deleted successfully"))
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<ApiResponse<()>, AppError> {
    let enabled = req.enabled;
    state
        .admin
        .update_user(user.id, &req.into_representation())
        .await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, enabled, "user status changed");

    Ok(ApiResponse::message(if enabled {
        "User enabled successfully"
    } else {
        "User disabled successfully"
    }))
}

/// Deletes one by one and reports each id; malformed ids are reported, not rejected.
pub async fn bulk_delete(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> Result<ApiResponse<Vec<BulkDeleteOutcome>>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let mut outcomes = Vec::with_capacity(req.user_ids.len());
    for raw in req.user_ids {
        let Ok(id) = Uuid::parse_str(raw.trim()) else {
            outcomes.push(BulkDeleteOutcome::failed(raw, "Invalid user ID"));
            continue;
        };
        match state.admin.delete_user(id).await {
            Ok(()) => outcomes.push(BulkDeleteOutcome::deleted(raw)),
            Err(err) => {
                tracing::warn!(actor = ctx.actor(), user_id = %id, error = %err, "bulk delete entry failed");
                outcomes.push(BulkDeleteOutcome::failed(raw, err.to_string()));
            }
        }
    }

    let deleted = outcomes.iter().filter(|o| o.success).count();
    tracing::info!(actor = ctx.actor(), deleted, requested = outcomes.len(), "bulk delete finished");

    Ok(ApiResponse::list(outcomes).with_message("Bulk delete operation completed"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse<()>, AppError> {
    req.validate().map_err(AppError::validation)?;

    state
        .admin
        .reset_password(user.id, &req.into_credential())
        .await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, "password reset");

    Ok(ApiResponse::message("Password reset successfully"))
}

pub async fn list_role_mappings(
    State(state): State<AppState>,
    user: UserId,
) -> Result<ApiResponse<Vec<RoleRepresentation>>, AppError> {
    let roles = state.admin.user_realm_roles(user.id).await?;
    Ok(ApiResponse::list(roles))
}

pub async fn assign_realm_roles(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    ApiJson(req): ApiJson<RealmRoleNamesRequest>,
) -> Result<ApiResponse<()>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let roles = req.into_names();
    state.admin.assign_realm_roles(user.id, &roles).await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, ?roles, "realm roles assigned");

    Ok(ApiResponse::message("Roles assigned successfully"))
}

pub async fn remove_realm_roles(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    ApiJson(req): ApiJson<RealmRoleNamesRequest>,
) -> Result<ApiResponse<()>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let roles = req.into_names();
    state.admin.remove_realm_roles(user.id, &roles).await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, ?roles, "realm roles removed");

    Ok(ApiResponse::message("Roles removed successfully"))
}

pub async fn assign_client_roles(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    client: ClientId,
    ApiJson(req): ApiJson<AssignClientRolesRequest>,
) -> Result<ApiResponse<()>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let roles = req.into_representations();
    state
        .admin
        .assign_client_roles(user.id, client.id, &roles)
        .await?;
    tracing::info!(
        actor = ctx.actor(),
        user_id = %user.id,
        client_id = %client.id,
        count = roles.len(),
        "client roles assigned"
    );

    Ok(ApiResponse::message("Client roles assigned successfully"))
}

pub async fn list_user_groups(
    State(state): State<AppState>,
    user: UserId,
) -> Result<ApiResponse<Vec<GroupRepresentation>>, AppError> {
    Ok(ApiResponse::list(state.admin.user_groups(user.id).await?))
}

pub async fn add_user_to_group(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
    group: GroupId,
) -> Result<ApiResponse<()>, AppError> {
    state.admin.add_user_to_group(user.id, group.id).await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, group_id = %group.id, "user added to group");

    Ok(ApiResponse::message("User assigned to group successfully"))
}
