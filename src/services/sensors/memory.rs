use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{SensorFeed, SensorReading, TimeRange};

/// Bounded in-memory feed. Keeps the most recent `capacity` readings.
#[derive(Debug)]
pub struct InMemorySensorFeed {
    capacity: usize,
    readings: RwLock<VecDeque<SensorReading>>,
    connected: AtomicBool,
}

impl InMemorySensorFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            readings: RwLock::new(VecDeque::with_capacity(capacity)),
            connected: AtomicBool::new(false),
        }
    }
}

fn belongs_to(reading: &SensorReading, robot_id: Option<&str>) -> bool {
    robot_id.is_none_or(|id| reading.robot_id == id)
}

#[async_trait]
impl SensorFeed for InMemorySensorFeed {
    async fn latest(&self, robot_id: Option<&str>) -> Option<SensorReading> {
        let readings = self.readings.read().await;
        readings
            .iter()
            .rev()
            .find(|r| belongs_to(r, robot_id))
            .cloned()
    }

    async fn history(&self, robot_id: Option<&str>, range: TimeRange) -> Vec<SensorReading> {
        let readings = self.readings.read().await;
        readings
            .iter()
            .filter(|r| belongs_to(r, robot_id) && range.contains(r.timestamp))
            .cloned()
            .collect()
    }

    async fn record(&self, mut reading: SensorReading) -> SensorReading {
        if self.connect().await {
            tracing::debug!("sensor feed connected on first record");
        }
        reading.timestamp = Utc::now();

        let mut readings = self.readings.write().await;
        readings.push_back(reading.clone());
        while readings.len() > self.capacity {
            readings.pop_front();
        }
        reading
    }

    async fn connect(&self) -> bool {
        !self.connected.swap(true, Ordering::SeqCst)
    }

    async fn disconnect(&self) -> bool {
        self.connected.swap(false, Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
