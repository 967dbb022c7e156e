//! Database layer for Watchdesk.
//!
//! This module provides persistence for log records, correlation rules,
//! correlated alerts, tickets with their audit history, and analyst roles
//! using SQLx over SQLite. Repositories are exposed as object-safe traits
//! with SQLite implementations and in-memory mocks for tests.

mod error;
pub mod mocks;
mod pool;
mod schema;

pub mod alert_repo;
pub mod analyst_repo;
pub mod log_repo;
pub mod rule_repo;
pub mod ticket_repo;

pub use error::DbError;
pub use pool::{
    create_pool, create_pool_with_options, escape_like_pattern, make_like_pattern, DbPool,
    PoolOptions,
};
pub use schema::{provision_schema, sql};

// Re-export repository traits
pub use alert_repo::AlertRepository;
pub use analyst_repo::AnalystRepository;
pub use log_repo::LogRepository;
pub use rule_repo::RuleRepository;
pub use ticket_repo::TicketRepository;

// Re-export factory functions
pub use alert_repo::create_alert_repository;
pub use analyst_repo::create_analyst_repository;
pub use log_repo::create_log_repository;
pub use rule_repo::create_rule_repository;
pub use ticket_repo::create_ticket_repository;
