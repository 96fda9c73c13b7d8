// Library exports for cypher-hub
// This allows integration tests and the binary to share the service modules

pub mod auth;
pub mod community;
pub mod config;
pub mod cypher;
pub mod db;
pub mod error;
pub mod extractors;
pub mod posts;
pub mod routes;
pub mod state;
pub mod storage;
pub mod users;
pub mod validation;
pub mod views;
