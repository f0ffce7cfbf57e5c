/*
 * Responsibility
 * - user の session 一覧と強制 logout
 */
use axum::extract::State;

use crate::{
    api::v1::{
        dto::ApiResponse,
        extractors::{AuthCtxExtractor, UserId},
    },
    error::AppError,
    services::admin::UserSessionRepresentation,
    state::AppState,
};

pub async fn list_sessions(
    State(state): State<AppState>,
    user: UserId,
) -> Result<ApiResponse<Vec<UserSessionRepresentation>>, AppError> {
    Ok(ApiResponse::list(state.admin.user_sessions(user.id).await?))
}

pub async fn logout_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    user: UserId,
) -> Result<ApiResponse<()>, AppError> {
    state.admin.logout_user(user.id).await?;
    tracing::info!(actor = ctx.actor(), user_id = %user.id, "user sessions revoked");

    Ok(ApiResponse::message("User logged out successfully"))
}
