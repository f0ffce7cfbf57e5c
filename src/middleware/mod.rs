/*
 * Responsibility
 * - transport 系 middleware の公開インターフェース
 * - 認証/認可 gate は authz 側 (route_layer で個別に掛ける)
 */
pub mod cors;
pub mod http;
pub mod security_headers;
