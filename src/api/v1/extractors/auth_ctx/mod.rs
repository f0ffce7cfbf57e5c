/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - gate を通過したリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - 型定義は authz 側 (gate が insert する型そのもの)
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod core;

pub use crate::authz::AuthCtx;
pub use core::AuthCtxExtractor;
