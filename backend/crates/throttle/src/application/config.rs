//! Application Configuration
//!
//! Configuration for the throttle application layer.

use std::time::Duration;

use chrono::TimeDelta;

use crate::domain::services;
use crate::error::{ThrottleError, ThrottleResult};

/// What to do when the failure history cannot be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryFailurePolicy {
    /// Reject the submission with 503
    #[default]
    FailClosed,
    /// Let the submission through unthrottled
    FailOpen,
}

/// Throttle configuration, immutable once built
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Failures allowed per range before throttling kicks in
    pub failure_threshold: u32,
    /// Sliding window length (whole seconds)
    pub failure_range: Duration,
    /// Request parameter carrying the username
    pub username_parameter: String,
    /// Application code stamped on every audit event
    pub application_code: String,
    /// Action code of authentication failures
    pub authentication_failure_code: String,
    pub query_failure_policy: QueryFailurePolicy,
    /// Largest login body buffered to read the username
    pub max_body_bytes: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 100,
            failure_range: Duration::from_secs(60),
            username_parameter: "username".to_string(),
            application_code: "CAS".to_string(),
            authentication_failure_code: "AUTHENTICATION_FAILED".to_string(),
            query_failure_policy: QueryFailurePolicy::FailClosed,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ThrottleConfig {
    /// Build a validated configuration
    pub fn new(
        failure_threshold: u32,
        failure_range_secs: u64,
        username_parameter: impl Into<String>,
        application_code: impl Into<String>,
        authentication_failure_code: impl Into<String>,
    ) -> ThrottleResult<Self> {
        let config = Self {
            failure_threshold,
            failure_range: Duration::from_secs(failure_range_secs),
            username_parameter: username_parameter.into(),
            application_code: application_code.into(),
            authentication_failure_code: authentication_failure_code.into(),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_query_failure_policy(mut self, policy: QueryFailurePolicy) -> Self {
        self.query_failure_policy = policy;
        self
    }

    pub fn validate(&self) -> ThrottleResult<()> {
        if self.failure_threshold < 1 {
            return Err(ThrottleError::InvalidConfig(
                "failure threshold must be at least 1".to_string(),
            ));
        }
        if self.failure_range_secs() < 1 {
            return Err(ThrottleError::InvalidConfig(
                "failure range must be at least 1 second".to_string(),
            ));
        }
        if self.failure_window().is_none() {
            return Err(ThrottleError::InvalidConfig(format!(
                "failure range of {} seconds is too large",
                self.failure_range_secs()
            )));
        }
        if self.username_parameter.is_empty() {
            return Err(ThrottleError::InvalidConfig(
                "username parameter name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn failure_range_secs(&self) -> u64 {
        self.failure_range.as_secs()
    }

    /// Failure range as a signed duration; `None` when it does not fit one
    pub fn failure_window(&self) -> Option<TimeDelta> {
        i64::try_from(self.failure_range_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
    }

    /// Allowed submissions per second
    pub fn threshold_rate(&self) -> f64 {
        services::threshold_rate(self.failure_threshold, self.failure_range_secs())
    }
}
