/*
 * Responsibility
 * - sensor reading の記録 DTO と history の query
 * - task status / position の型チェックは serde 側 (ApiJson が VALIDATION_ERROR に変換)
 */
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::services::sensors::{Position, SensorReading, TaskStatus, TimeRange};

use super::validate;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordReadingRequest {
    pub robot_id: String,
    pub position: Position,
    pub task_status: TaskStatus,
}

impl RecordReadingRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate::required(&self.robot_id, "Robot ID is required")?;
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err("Invalid position format");
        }
        Ok(())
    }

    /// Timestamp is a placeholder; the feed stamps it.
    pub fn into_reading(self) -> SensorReading {
        SensorReading {
            robot_id: self.robot_id.trim().to_string(),
            position: self.position,
            task_status: self.task_status,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestQuery {
    pub robot_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub robot_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl HistoryQuery {
    /// RFC 3339 bounds. Defaults to the hour ending at `now` (or at `endTime`).
    pub fn range(&self, now: DateTime<Utc>) -> Result<TimeRange, &'static str> {
        let end = match self.end_time.as_deref() {
            Some(raw) => parse_time(raw).ok_or("endTime must be an RFC 3339 timestamp")?,
            None => now,
        };
        let start = match self.start_time.as_deref() {
            Some(raw) => parse_time(raw).ok_or("startTime must be an RFC 3339 timestamp")?,
            None => end - Duration::hours(1),
        };
        if start > end {
            return Err("startTime must not be after endTime");
        }
        Ok(TimeRange { start, end })
    }
}

fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub readings: Vec<SensorReading>,
}
