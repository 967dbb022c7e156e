//! Mock implementation of TicketRepository for testing.

use crate::db::{DbError, TicketRepository};
use crate::model::{SecurityTicket, TicketHistoryEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct TicketStore {
    tickets: HashMap<Uuid, SecurityTicket>,
    history: Vec<TicketHistoryEntry>,
}

/// Mock implementation of [`TicketRepository`] using in-memory storage.
///
/// The update-plus-history contract holds here too: both mutations happen
/// under one write lock.
#[derive(Default)]
pub struct MockTicketRepository {
    store: Arc<RwLock<TicketStore>>,
}

impl MockTicketRepository {
    /// Creates a new mock repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a snapshot of all history entries across tickets.
    pub async fn history_snapshot(&self) -> Vec<TicketHistoryEntry> {
        self.store.read().await.history.clone()
    }
}

#[async_trait]
impl TicketRepository for MockTicketRepository {
    async fn create(&self, ticket: &SecurityTicket) -> Result<(), DbError> {
        let mut store = self.store.write().await;

        if store.tickets.contains_key(&ticket.id) {
            return Err(DbError::Constraint(format!(
                "Ticket with id '{}' already exists",
                ticket.id
            )));
        }

        store.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SecurityTicket>, DbError> {
        Ok(self.store.read().await.tickets.get(&id).cloned())
    }

    async fn update_with_history(
        &self,
        ticket: &SecurityTicket,
        entry: &TicketHistoryEntry,
    ) -> Result<(), DbError> {
        let mut store = self.store.write().await;

        if !store.tickets.contains_key(&ticket.id) {
            return Err(DbError::NotFound {
                entity: "ticket".to_string(),
                id: ticket.id.to_string(),
            });
        }

        store.tickets.insert(ticket.id, ticket.clone());
        store.history.push(entry.clone());
        Ok(())
    }

    async fn history(&self, ticket_id: Uuid) -> Result<Vec<TicketHistoryEntry>, DbError> {
        let store = self.store.read().await;
        let mut entries: Vec<TicketHistoryEntry> = store
            .history
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.changed_at.cmp(&b.changed_at));
        Ok(entries)
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SecurityTicket>, DbError> {
        let query = query.to_lowercase();
        let store = self.store.read().await;

        let mut matches: Vec<SecurityTicket> = store
            .tickets
            .values()
            .filter(|t| {
                t.event_id.to_lowercase().contains(&query)
                    || t.notes.to_lowercase().contains(&query)
                    || t.assigned_to
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&query))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matches.truncate(limit as usize);
        Ok(matches)
    }
}
