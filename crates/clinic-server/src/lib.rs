//! HTTP server for the clinic management API.
//!
//! Wires configuration, the record store, token issuance and the access
//! policy into an axum router.

pub mod bootstrap;
pub mod config;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod registration;
pub mod server;

pub use config::{AppConfig, PostgresStorageConfig, ServerConfig, StorageBackend};
pub use observability::init_tracing;
pub use server::{AppState, ClinicServer, ServerBuilder, build_app};
