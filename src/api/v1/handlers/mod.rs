pub mod clients;
pub mod events;
pub mod groups;
pub mod roles;
pub mod sensors;
pub mod sessions;
pub mod users;
