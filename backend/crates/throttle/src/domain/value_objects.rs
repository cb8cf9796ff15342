//! Domain Value Objects
//!
//! Immutable value types for the throttle domain.

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;
use platform::params::LoginParameters;

/// The throttling key: who is submitting, from where
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleIdentity {
    pub client_ip: String,
    /// Empty when the request carried no username parameter
    pub username: String,
}

impl ThrottleIdentity {
    pub fn new(client_ip: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            username: username.into(),
        }
    }
}

/// A login submission as seen by the throttle: the connection's address
/// pair plus the submitted parameters
#[derive(Debug, Clone)]
pub struct LoginSubmission {
    pub client: ClientInfo,
    pub parameters: LoginParameters,
}

impl LoginSubmission {
    pub fn new(client: ClientInfo, parameters: LoginParameters) -> Self {
        Self { client, parameters }
    }

    /// Submitted username, or the empty string when the parameter is absent.
    /// A missing username is still a valid identity component.
    pub fn username(&self, parameter: &str) -> &str {
        self.parameters.get(parameter).unwrap_or_default()
    }

    pub fn identity(&self, username_parameter: &str) -> ThrottleIdentity {
        ThrottleIdentity::new(
            self.client.client_ip.clone(),
            self.username(username_parameter),
        )
    }
}

/// Parameters of a failure-history lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureQuery {
    pub client_ip: String,
    pub username: String,
    pub action_code: String,
    pub application_code: String,
    /// Oldest timestamp still inside the sliding window (inclusive)
    pub cutoff: DateTime<Utc>,
    /// Maximum number of timestamps to return
    pub limit: usize,
}

/// The two most recent failures inside the window, newest first
///
/// Derived per decision and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureTimestampSeries {
    pub latest: DateTime<Utc>,
    pub previous: DateTime<Utc>,
}

impl FailureTimestampSeries {
    /// Number of failures needed to compute a rate
    pub const LEN: usize = 2;

    /// Build from timestamps ordered most-recent-first.
    /// Returns `None` with fewer than two failures.
    pub fn from_recent(timestamps: &[DateTime<Utc>]) -> Option<Self> {
        match timestamps {
            [latest, previous, ..] => Some(Self {
                latest: *latest,
                previous: *previous,
            }),
            _ => None,
        }
    }

    /// Milliseconds between the two failures; zero or negative when the
    /// timestamps coincide or arrive out of order.
    pub fn interval_ms(&self) -> i64 {
        self.latest.timestamp_millis() - self.previous.timestamp_millis()
    }
}

/// What the downstream login handler reported for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Authenticated,
    Failed,
}
