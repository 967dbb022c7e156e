//! # wd-core
//!
//! Core engine for Watchdesk: event ingestion, correlation of discrete
//! security events into composite alerts, the audited ticket lifecycle, and
//! asynchronous notification dispatch.

pub mod correlation;
pub mod db;
pub mod directory;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod tickets;

pub use correlation::{CorrelationEngine, CorrelationError};
pub use directory::{AnalystDirectory, DirectoryError};
pub use ingest::{EventIngestor, IngestError, HIGH_SEVERITY_THRESHOLD};
pub use model::{
    AnalystRole, CorrelatedAlert, CorrelationRule, EventPayload, LogRecord, SecurityTicket,
    TicketHistoryEntry, TicketStatus,
};
pub use notify::{
    DeliveryError, MailRelayConfig, MailRelayNotifier, MockNotifier, Notification,
    NotificationDispatcher, Notifier, NotifyPolicy,
};
pub use tickets::{NewTicket, TicketError, TicketService};

/// Maximum number of rows returned by the search and listing surfaces.
pub const SEARCH_RESULT_LIMIT: u32 = 50;
