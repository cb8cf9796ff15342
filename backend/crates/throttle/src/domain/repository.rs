//! Repository Traits
//!
//! The audit store seen from the throttle. Implementations live in the
//! infrastructure layer and may be backed by any storage engine that can
//! answer an ordered, filtered timestamp lookup.

use chrono::{DateTime, Utc};

use crate::domain::entities::AuditEvent;
use crate::domain::value_objects::FailureQuery;
use crate::error::ThrottleResult;

/// Read side of the audit store
#[trait_variant::make(FailureHistoryRepository: Send)]
pub trait LocalFailureHistoryRepository {
    /// Timestamps of events matching `query` with `when >= query.cutoff`,
    /// most recent first, at most `query.limit` entries.
    ///
    /// Fails with `ThrottleError::AuditQuery`.
    async fn find_recent_failures(&self, query: &FailureQuery)
    -> ThrottleResult<Vec<DateTime<Utc>>>;
}

/// Write side of the audit store (the audit event sink)
#[trait_variant::make(AuditTrailRepository: Send)]
pub trait LocalAuditTrailRepository {
    /// Append an event. Fails with `ThrottleError::AuditPersistence`.
    async fn record(&self, event: &AuditEvent) -> ThrottleResult<()>;
}
