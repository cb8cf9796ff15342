//! In-Memory Audit Store
//!
//! Process-local audit trail for development and tests. Every write is
//! visible to the next read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entities::AuditEvent;
use crate::domain::repository::{AuditTrailRepository, FailureHistoryRepository};
use crate::domain::value_objects::FailureQuery;
use crate::error::ThrottleResult;

#[derive(Clone, Default)]
pub struct InMemoryAuditRepository {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded event, in insertion order
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

impl FailureHistoryRepository for InMemoryAuditRepository {
    async fn find_recent_failures(
        &self,
        query: &FailureQuery,
    ) -> ThrottleResult<Vec<DateTime<Utc>>> {
        let events = self.events.read().await;

        let mut timestamps: Vec<DateTime<Utc>> = events
            .iter()
            .filter(|e| {
                e.client_ip == query.client_ip
                    && e.principal == query.username
                    && e.action_performed == query.action_code
                    && e.application_code == query.application_code
                    && e.when >= query.cutoff
            })
            .map(|e| e.when)
            .collect();

        timestamps.sort_unstable_by(|a, b| b.cmp(a));
        timestamps.truncate(query.limit);
        Ok(timestamps)
    }
}

impl AuditTrailRepository for InMemoryAuditRepository {
    async fn record(&self, event: &AuditEvent) -> ThrottleResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
