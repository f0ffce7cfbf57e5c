/*
 * Responsibility
 * - /sensors handler (最新値, 履歴, 記録, feed の connect/disconnect)
 * - reader / writer の区別は routes 側の gate で行う
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::{
            ApiResponse,
            sensors::{HistoryQuery, LatestQuery, RecordReadingRequest, SensorHistory},
        },
        extractors::{ApiJson, AuthCtxExtractor},
    },
    error::AppError,
    services::sensors::SensorReading,
    state::AppState,
};

pub async fn latest_reading(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<ApiResponse<SensorReading>, AppError> {
    let reading = state
        .sensors
        .latest(query.robot_id.as_deref())
        .await
        .ok_or_else(|| AppError::not_found("sensor reading"))?;
    Ok(ApiResponse::data(reading))
}

pub async fn reading_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<SensorHistory>, AppError> {
    let range = query
        .range(chrono::Utc::now())
        .map_err(AppError::validation)?;
    let readings = state.sensors.history(query.robot_id.as_deref(), range).await;

    Ok(ApiResponse::data(SensorHistory {
        robot_id: query.robot_id,
        start_time: range.start,
        end_time: range.end,
        readings,
    }))
}

pub async fn record_reading(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<RecordReadingRequest>,
) -> Result<(StatusCode, ApiResponse<SensorReading>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let stored = state.sensors.record(req.into_reading()).await;
    tracing::debug!(
        actor = ctx.actor(),
        robot_id = %stored.robot_id,
        status = ?stored.task_status,
        "sensor reading recorded"
    );

    Ok((
        StatusCode::CREATED,
        ApiResponse::data(stored).with_message("Sensor data recorded successfully"),
    ))
}

pub async fn connect_feed(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> ApiResponse<()> {
    if state.sensors.connect().await {
        tracing::info!(actor = ctx.actor(), "sensor feed connected");
    }
    ApiResponse::message("Connected to sensor service")
}

pub async fn disconnect_feed(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> ApiResponse<()> {
    if state.sensors.disconnect().await {
        tracing::info!(actor = ctx.actor(), "sensor feed disconnected");
    }
    ApiResponse::message("Disconnected from sensor service")
}
