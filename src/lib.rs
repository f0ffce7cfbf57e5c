//! admin-gate: role-based access gate in front of an identity admin API.
//!
//! - `authz`: claims extraction, role requirements, policy evaluation, the
//!   protection factory (tower layer) and the denial responder
//! - `services`: bearer JWT authentication and the upstream admin client
//! - `api`: console endpoints and the v1 admin REST routers
pub mod api;
pub mod app;
pub mod authz;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
