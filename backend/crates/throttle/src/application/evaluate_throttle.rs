//! Throttle Decision Use Case
//!
//! Decides whether a submission must be blocked from the rate of the two
//! most recent authentication failures inside the sliding window.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::ThrottleConfig;
use crate::domain::repository::FailureHistoryRepository;
use crate::domain::services;
use crate::domain::value_objects::{FailureQuery, FailureTimestampSeries, ThrottleIdentity};
use crate::error::ThrottleResult;

/// Decision capability injected into the interceptor
#[trait_variant::make(ThrottleDecision: Send)]
pub trait LocalThrottleDecision {
    /// `true` when the identity's failure rate exceeds the threshold.
    ///
    /// Read-only; repeated calls against an unchanged store give the same
    /// answer. Query failures propagate as `ThrottleError::AuditQuery`.
    async fn evaluate(&self, identity: &ThrottleIdentity, now: DateTime<Utc>)
    -> ThrottleResult<bool>;
}

/// Audit-store backed decision engine
pub struct ThrottleDecisionEngine<F>
where
    F: FailureHistoryRepository,
{
    failure_repo: Arc<F>,
    config: Arc<ThrottleConfig>,
}

impl<F> ThrottleDecisionEngine<F>
where
    F: FailureHistoryRepository,
{
    pub fn new(failure_repo: Arc<F>, config: Arc<ThrottleConfig>) -> Self {
        Self {
            failure_repo,
            config,
        }
    }

    /// Start of the sliding window. A window reaching past the earliest
    /// representable instant covers the whole history.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.config
            .failure_window()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn failure_query(&self, identity: &ThrottleIdentity, now: DateTime<Utc>) -> FailureQuery {
        FailureQuery {
            client_ip: identity.client_ip.clone(),
            username: identity.username.clone(),
            action_code: self.config.authentication_failure_code.clone(),
            application_code: self.config.application_code.clone(),
            cutoff: self.cutoff(now),
            limit: FailureTimestampSeries::LEN,
        }
    }
}

impl<F> ThrottleDecision for ThrottleDecisionEngine<F>
where
    F: FailureHistoryRepository + Send + Sync,
{
    async fn evaluate(
        &self,
        identity: &ThrottleIdentity,
        now: DateTime<Utc>,
    ) -> ThrottleResult<bool> {
        let query = self.failure_query(identity, now);

        let mut failures = self.failure_repo.find_recent_failures(&query).await?;
        failures.retain(|when| *when >= query.cutoff);
        failures.sort_unstable_by(|a, b| b.cmp(a));

        let Some(series) = FailureTimestampSeries::from_recent(&failures) else {
            return Ok(false);
        };

        let threshold_rate = self.config.threshold_rate();
        let Some(rate) = services::submission_rate(&series) else {
            tracing::debug!(
                last = series.latest.timestamp_millis(),
                second_to_last = series.previous.timestamp_millis(),
                "Failures share a timestamp; no rate to compute"
            );
            return Ok(false);
        };

        tracing::debug!(
            last = series.latest.timestamp_millis(),
            second_to_last = series.previous.timestamp_millis(),
            difference = series.interval_ms(),
            rate,
            "Computed authentication failure rate"
        );

        if services::exceeds_threshold(&series, threshold_rate) {
            tracing::warn!(
                rate,
                threshold_rate,
                "Authentication throttling rate exceeds the defined threshold"
            );
            return Ok(true);
        }
        Ok(false)
    }
}
