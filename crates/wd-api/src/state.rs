//! Application state shared across handlers.

use std::sync::Arc;
use wd_core::db::{
    create_alert_repository, create_analyst_repository, create_log_repository,
    create_rule_repository, create_ticket_repository, AlertRepository, DbPool, LogRepository,
    RuleRepository,
};
use wd_core::{
    AnalystDirectory, CorrelationEngine, EventIngestor, NotificationDispatcher, Notifier,
    NotifyPolicy, TicketService,
};

/// Shared application state.
///
/// Built once at startup; every service owns its repositories and the
/// single process-wide dispatcher.
#[derive(Clone)]
pub struct AppState {
    /// Event ingestor (validation, persistence, correlation, high-severity
    /// notification).
    pub ingestor: Arc<EventIngestor>,
    /// Correlation rule store, used by the rule management endpoints.
    pub rules: Arc<dyn RuleRepository>,
    /// Correlated alert store, used by the alert listing endpoint.
    pub alerts: Arc<dyn AlertRepository>,
    /// Log search surface.
    pub logs: Arc<dyn LogRepository>,
    /// Ticket lifecycle service.
    pub tickets: Arc<TicketService>,
    /// Analyst directory.
    pub directory: Arc<AnalystDirectory>,
    /// Notification dispatcher; exposed so the binary can start the
    /// consumer task.
    pub dispatcher: Arc<NotificationDispatcher>,
}

impl AppState {
    /// Wires repositories, services, and the dispatcher over the given pool
    /// and notifier.
    pub fn new(pool: &DbPool, notifier: Arc<dyn Notifier>, policy: NotifyPolicy) -> Self {
        let logs = create_log_repository(pool);
        let rules = create_rule_repository(pool);
        let alerts = create_alert_repository(pool);
        let ticket_repo = create_ticket_repository(pool);
        let analyst_repo = create_analyst_repository(pool);

        let dispatcher = Arc::new(NotificationDispatcher::new(notifier));
        let directory = Arc::new(AnalystDirectory::new(
            analyst_repo,
            policy.default_recipient.clone(),
        ));

        let engine = Arc::new(CorrelationEngine::new(
            rules.clone(),
            logs.clone(),
            alerts.clone(),
            dispatcher.clone(),
            policy.clone(),
        ));

        let ingestor = Arc::new(EventIngestor::new(
            logs.clone(),
            engine,
            dispatcher.clone(),
            policy.clone(),
        ));

        let tickets = Arc::new(TicketService::new(
            ticket_repo,
            directory.clone(),
            dispatcher.clone(),
            policy,
        ));

        Self {
            ingestor,
            rules,
            alerts,
            logs,
            tickets,
            directory,
            dispatcher,
        }
    }
}
