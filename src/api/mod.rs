/*
 * Responsibility
 * - HTTP 入口: console (health / login / logout / auth status / pages) と v1 admin API
 */
pub mod console;
pub mod v1;
