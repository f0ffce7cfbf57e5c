/*
 * Responsibility
 * - handler 共通の extractor を束ねる
 */
pub mod auth_ctx;
pub mod json;
pub mod resource_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor};
pub use json::ApiJson;
pub use resource_id::{ClientId, GroupId, ResourceId, UserId};
