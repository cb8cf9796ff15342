//! Throttle Middleware
//!
//! Wraps a login route: POST submissions are checked before the handler
//! runs and failures it reports are audited afterwards. Other methods pass
//! through untouched.

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use platform::client::resolve_client_info;
use platform::params::extract_login_parameters;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::application::evaluate_throttle::ThrottleDecision;
use crate::application::interceptor::{Disposition, ThrottleInterceptor};
use crate::domain::repository::AuditTrailRepository;
use crate::domain::value_objects::{LoginSubmission, SubmissionOutcome};
use crate::error::ThrottleError;

/// Middleware state
pub struct ThrottleMiddlewareState<D, A>
where
    D: ThrottleDecision,
    A: AuditTrailRepository,
{
    pub interceptor: Arc<ThrottleInterceptor<D, A>>,
    /// Address recorded as the server side of every audit event
    pub server_ip: Option<IpAddr>,
}

impl<D, A> Clone for ThrottleMiddlewareState<D, A>
where
    D: ThrottleDecision,
    A: AuditTrailRepository,
{
    fn clone(&self) -> Self {
        Self {
            interceptor: self.interceptor.clone(),
            server_ip: self.server_ip,
        }
    }
}

/// Middleware that throttles login submissions by client IP and username
pub async fn throttle_login_submissions<D, A>(
    State(state): State<ThrottleMiddlewareState<D, A>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    D: ThrottleDecision + Send + Sync + 'static,
    A: AuditTrailRepository + Send + Sync + 'static,
{
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let direct_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let client = resolve_client_info(req.headers(), direct_ip, state.server_ip);

    let interceptor = &state.interceptor;
    let (parameters, req) =
        match extract_login_parameters(req, interceptor.config().max_body_bytes).await {
            Ok(extracted) => extracted,
            Err(e) => return ThrottleError::from(e).into_response(),
        };

    let submission = LoginSubmission::new(client, parameters);

    match interceptor.pre_handle(&submission, Utc::now()).await {
        Ok(Disposition::Allowed) => {}
        Ok(Disposition::Throttled) => {
            let username = submission.username(&interceptor.config().username_parameter);
            return ThrottleError::Throttled {
                username: username.to_string(),
                client_ip: submission.client.client_ip.clone(),
            }
            .into_response();
        }
        Err(e) => return e.into_response(),
    }

    let response = next.run(req).await;

    let outcome = submission_outcome(&response);
    if let Err(e) = interceptor.post_handle(&submission, outcome, Utc::now()).await {
        // The handler's response stands; the missed failure is only logged.
        tracing::error!(
            error = %e,
            client_ip = %submission.client.client_ip,
            "Could not record login submission failure"
        );
    }

    response
}

/// Outcome reported by the login handler.
///
/// Handlers insert a [`SubmissionOutcome`] into the response extensions.
/// Without one, any 4xx counts as a failed submission: a 401 as well as a
/// body the handler's own extractors rejected (415, 422).
fn submission_outcome(response: &Response) -> SubmissionOutcome {
    match response.extensions().get::<SubmissionOutcome>() {
        Some(outcome) => *outcome,
        None if response.status().is_client_error() => SubmissionOutcome::Failed,
        None => SubmissionOutcome::Authenticated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_outcome_from_extension_wins() {
        let mut response = StatusCode::OK.into_response();
        response.extensions_mut().insert(SubmissionOutcome::Failed);
        assert_eq!(submission_outcome(&response), SubmissionOutcome::Failed);
    }

    #[test]
    fn test_outcome_from_status() {
        let response = StatusCode::UNAUTHORIZED.into_response();
        assert_eq!(submission_outcome(&response), SubmissionOutcome::Failed);

        let response = StatusCode::SEE_OTHER.into_response();
        assert_eq!(submission_outcome(&response), SubmissionOutcome::Authenticated);
    }

    #[test]
    fn test_rejected_body_counts_as_failure() {
        for status in [
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            StatusCode::UNPROCESSABLE_ENTITY,
            StatusCode::BAD_REQUEST,
        ] {
            let response = status.into_response();
            assert_eq!(submission_outcome(&response), SubmissionOutcome::Failed);
        }
    }

    #[test]
    fn test_server_error_without_outcome_is_not_a_failure() {
        let response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        assert_eq!(submission_outcome(&response), SubmissionOutcome::Authenticated);
    }
}
