//! Domain Entities

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;

/// One audit trail record
///
/// Created for every failed or throttled login submission and handed to the
/// audit store, which owns it from then on. Records are append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Who acted (the submitted username)
    pub principal: String,
    /// What was acted upon (also the username for login submissions)
    pub resource_operated_upon: String,
    /// Action code, e.g. `AUTHENTICATION_FAILED` or `THROTTLED_LOGIN_ATTEMPT`
    pub action_performed: String,
    pub application_code: String,
    pub when: DateTime<Utc>,
    pub client_ip: String,
    pub server_ip: String,
}

impl AuditEvent {
    /// Create an event for a login submission; the username is used as both
    /// principal and resource.
    pub fn for_submission(
        username: &str,
        action: &str,
        application_code: &str,
        when: DateTime<Utc>,
        client: &ClientInfo,
    ) -> Self {
        Self {
            principal: username.to_string(),
            resource_operated_upon: username.to_string(),
            action_performed: action.to_string(),
            application_code: application_code.to_string(),
            when,
            client_ip: client.client_ip.clone(),
            server_ip: client.server_ip.clone(),
        }
    }
}
