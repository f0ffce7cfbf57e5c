/*
 * Responsibility
 * - v1 admin API の公開ポイント (routes() の re-export など)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{SENSOR_READER, SENSOR_WRITER, routes, sensor_routes};
