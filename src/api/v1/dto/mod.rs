/*
 * Responsibility
 * - admin API の request/response DTO
 * - validate() で形式チェック (失敗は VALIDATION_ERROR)
 */
pub mod clients;
pub mod envelope;
pub mod groups;
pub mod roles;
pub mod sensors;
pub mod users;
mod validate;

pub use envelope::ApiResponse;
