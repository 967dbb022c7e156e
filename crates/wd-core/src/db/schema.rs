//! Database schema provisioning.
//!
//! The schema is provisioned with idempotent DDL at startup. Statements are
//! executed one at a time; re-running against an existing database is a
//! no-op.

use super::{DbError, DbPool};
use tracing::info;

/// Creates all tables and indexes if they do not exist.
pub async fn provision_schema(pool: &DbPool) -> Result<(), DbError> {
    for statement in sql::TABLES.iter().chain(sql::INDEXES.iter()) {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Schema provisioned");
    Ok(())
}

/// DDL statements for the Watchdesk store.
pub mod sql {
    /// SQL to create the logs table.
    pub const CREATE_LOGS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS logs (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            rule_level INTEGER NOT NULL DEFAULT 0,
            rule_description TEXT,
            rule_id TEXT,
            mitre_ids TEXT,
            mitre_tactics TEXT,
            mitre_techniques TEXT,
            agent_id TEXT,
            agent_name TEXT,
            manager_name TEXT,
            full_log TEXT NOT NULL,
            location TEXT,
            command TEXT,
            src_user TEXT,
            dst_user TEXT,
            tty TEXT,
            cwd TEXT
        )
    "#;

    /// SQL to create the correlation_rules table.
    pub const CREATE_CORRELATION_RULES_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS correlation_rules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            keyword TEXT NOT NULL,
            threshold INTEGER NOT NULL,
            window_secs INTEGER NOT NULL,
            severity TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )
    "#;

    /// SQL to create the correlated_alerts table.
    pub const CREATE_CORRELATED_ALERTS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS correlated_alerts (
            id TEXT PRIMARY KEY,
            correlation_type TEXT NOT NULL,
            related_event_ids TEXT NOT NULL,
            severity TEXT NOT NULL,
            agent_id TEXT,
            notes TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
    "#;

    /// SQL to create the security_tickets table.
    pub const CREATE_SECURITY_TICKETS_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS security_tickets (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            status TEXT NOT NULL,
            severity TEXT NOT NULL,
            assigned_to TEXT,
            notes TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            client_email TEXT NOT NULL
        )
    "#;

    /// SQL to create the ticket_history table.
    pub const CREATE_TICKET_HISTORY_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS ticket_history (
            id TEXT PRIMARY KEY,
            ticket_id TEXT NOT NULL REFERENCES security_tickets(id) ON DELETE CASCADE,
            field_changed TEXT NOT NULL,
            old_value TEXT,
            new_value TEXT,
            changed_by TEXT NOT NULL,
            changed_at TEXT NOT NULL
        )
    "#;

    /// SQL to create the analyst_roles table.
    pub const CREATE_ANALYST_ROLES_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS analyst_roles (
            id TEXT PRIMARY KEY,
            level TEXT NOT NULL,
            email TEXT NOT NULL
        )
    "#;

    /// All table DDL, in dependency order.
    pub const TABLES: &[&str] = &[
        CREATE_LOGS_TABLE,
        CREATE_CORRELATION_RULES_TABLE,
        CREATE_CORRELATED_ALERTS_TABLE,
        CREATE_SECURITY_TICKETS_TABLE,
        CREATE_TICKET_HISTORY_TABLE,
        CREATE_ANALYST_ROLES_TABLE,
    ];

    /// All index DDL.
    pub const INDEXES: &[&str] = &[
        "CREATE INDEX IF NOT EXISTS idx_logs_agent_id ON logs(agent_id)",
        "CREATE INDEX IF NOT EXISTS idx_logs_timestamp ON logs(timestamp)",
        "CREATE INDEX IF NOT EXISTS idx_correlated_alerts_created_at ON correlated_alerts(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_security_tickets_updated_at ON security_tickets(updated_at)",
        "CREATE INDEX IF NOT EXISTS idx_ticket_history_ticket_id ON ticket_history(ticket_id)",
        "CREATE INDEX IF NOT EXISTS idx_analyst_roles_level ON analyst_roles(level)",
    ];
}
