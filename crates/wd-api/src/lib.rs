//! # wd-api
//!
//! REST API server for Watchdesk: event ingestion, correlation rule and
//! alert management, the ticket lifecycle, and the analyst directory.

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{build_router, ApiServer, ApiServerConfig};
pub use state::AppState;
