/*
 * Responsibility
 * - robot の sensor reading (位置・タスク状態) の型と SensorFeed trait
 * - 実装は差し替え可能 (現状は in-memory のみ。外部 broker 連携はしない)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::InMemorySensorFeed;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Assigned,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub robot_id: String,
    pub position: Position,
    pub task_status: TaskStatus,
    /// Stamped by the feed on record; client-supplied values are ignored.
    pub timestamp: DateTime<Utc>,
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[async_trait]
pub trait SensorFeed: Send + Sync {
    /// Most recent reading, optionally for one robot.
    async fn latest(&self, robot_id: Option<&str>) -> Option<SensorReading>;

    /// Readings inside `range`, oldest first.
    async fn history(&self, robot_id: Option<&str>, range: TimeRange) -> Vec<SensorReading>;

    /// Stores the reading with a fresh timestamp. Connects the feed if needed.
    async fn record(&self, reading: SensorReading) -> SensorReading;

    /// Returns `false` when already connected.
    async fn connect(&self) -> bool;

    /// Returns `false` when already disconnected.
    async fn disconnect(&self) -> bool;

    fn is_connected(&self) -> bool;
}
