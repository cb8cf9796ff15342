//! Throttle Interceptor
//!
//! Per-submission lifecycle around the login handler:
//!
//! ```text
//! RECEIVED --evaluate--> THROTTLED  (record THROTTLED_LOGIN_ATTEMPT, block)
//!          \-----------> ALLOWED    (downstream handles authentication)
//! ```
//!
//! Independently, every failure reported by the downstream handler is
//! recorded under the configured authentication-failure code.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::{QueryFailurePolicy, ThrottleConfig};
use crate::application::evaluate_throttle::{ThrottleDecision, ThrottleDecisionEngine};
use crate::domain::entities::AuditEvent;
use crate::domain::repository::{AuditTrailRepository, FailureHistoryRepository};
use crate::domain::value_objects::{LoginSubmission, SubmissionOutcome};
use crate::error::{ThrottleError, ThrottleResult};

/// Action code recorded when a submission is blocked
pub const THROTTLED_LOGIN_ATTEMPT: &str = "THROTTLED_LOGIN_ATTEMPT";

/// Result of the pre-handle step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Allowed,
    Throttled,
}

/// Throttle for login submissions keyed by client IP and username
pub struct ThrottleInterceptor<D, A>
where
    D: ThrottleDecision,
    A: AuditTrailRepository,
{
    decision: Arc<D>,
    audit_trail: Arc<A>,
    config: Arc<ThrottleConfig>,
}

impl<S> ThrottleInterceptor<ThrottleDecisionEngine<S>, S>
where
    S: FailureHistoryRepository + AuditTrailRepository + Send + Sync,
{
    /// Wire the interceptor to a single store serving both audit reads and writes
    pub fn from_store(store: Arc<S>, config: ThrottleConfig) -> Self {
        let config = Arc::new(config);
        let engine = ThrottleDecisionEngine::new(store.clone(), config.clone());
        Self::new(Arc::new(engine), store, config)
    }
}

impl<D, A> ThrottleInterceptor<D, A>
where
    D: ThrottleDecision + Send + Sync,
    A: AuditTrailRepository + Send + Sync,
{
    /// Identifier used when registering the interceptor
    pub const NAME: &'static str = "inspektrIpAddressUsernameThrottle";

    pub fn new(decision: Arc<D>, audit_trail: Arc<A>, config: Arc<ThrottleConfig>) -> Self {
        Self {
            decision,
            audit_trail,
            config,
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Decide whether the submission may reach the login handler.
    ///
    /// A throttled submission is audited before returning. Query failures
    /// follow the configured [`QueryFailurePolicy`].
    pub async fn pre_handle(
        &self,
        submission: &LoginSubmission,
        now: DateTime<Utc>,
    ) -> ThrottleResult<Disposition> {
        let identity = submission.identity(&self.config.username_parameter);

        let exceeds = match self.decision.evaluate(&identity, now).await {
            Ok(exceeds) => exceeds,
            Err(ThrottleError::AuditQuery(e))
                if self.config.query_failure_policy == QueryFailurePolicy::FailOpen =>
            {
                tracing::warn!(
                    error = %e,
                    client_ip = %identity.client_ip,
                    "Failure history unavailable; allowing submission"
                );
                false
            }
            Err(e) => return Err(e),
        };

        if !exceeds {
            return Ok(Disposition::Allowed);
        }

        self.record_throttle(submission, now).await?;
        Ok(Disposition::Throttled)
    }

    /// Record a failure when the login handler reports one
    pub async fn post_handle(
        &self,
        submission: &LoginSubmission,
        outcome: SubmissionOutcome,
        now: DateTime<Utc>,
    ) -> ThrottleResult<()> {
        match outcome {
            SubmissionOutcome::Authenticated => Ok(()),
            SubmissionOutcome::Failed => self.record_submission_failure(submission, now).await,
        }
    }

    /// Audit an authentication failure. Never re-evaluates the throttle.
    pub async fn record_submission_failure(
        &self,
        submission: &LoginSubmission,
        now: DateTime<Utc>,
    ) -> ThrottleResult<()> {
        self.record_any_action(submission, &self.config.authentication_failure_code, now)
            .await
    }

    async fn record_throttle(
        &self,
        submission: &LoginSubmission,
        now: DateTime<Utc>,
    ) -> ThrottleResult<()> {
        tracing::warn!(
            client_ip = %submission.client.client_ip,
            threshold_rate = self.config.threshold_rate(),
            failure_range_secs = self.config.failure_range_secs(),
            failure_threshold = self.config.failure_threshold,
            "Throttling submission: failed login attempts exceed the failure threshold"
        );
        self.record_any_action(submission, THROTTLED_LOGIN_ATTEMPT, now)
            .await
    }

    /// Build and persist one audit event for the submission.
    ///
    /// Persistence failures propagate as `ThrottleError::AuditPersistence`.
    pub async fn record_any_action(
        &self,
        submission: &LoginSubmission,
        action: &str,
        now: DateTime<Utc>,
    ) -> ThrottleResult<()> {
        let username = submission.username(&self.config.username_parameter);
        let event = AuditEvent::for_submission(
            username,
            action,
            &self.config.application_code,
            now,
            &submission.client,
        );

        self.audit_trail.record(&event).await?;

        tracing::debug!(
            username = %username,
            client_ip = %event.client_ip,
            action = %action,
            "Recorded audit event"
        );
        Ok(())
    }
}
