/*
 * Responsibility
 * - realm の login/admin events 照会 (type, user, client, 日付範囲, paging)
 */
use axum::extract::{Query, State};

use crate::{
    api::v1::dto::ApiResponse,
    error::AppError,
    services::admin::{EventQuery, EventRepresentation},
    state::AppState,
};

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<ApiResponse<Vec<EventRepresentation>>, AppError> {
    for date in [&query.date_from, &query.date_to].into_iter().flatten() {
        chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::validation("Dates must be formatted as YYYY-MM-DD"))?;
    }

    Ok(ApiResponse::list(state.admin.events(&query).await?))
}
