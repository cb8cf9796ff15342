//! Throttle Router Wiring

use axum::{Router, middleware};
use std::net::IpAddr;
use std::sync::Arc;

use crate::application::config::ThrottleConfig;
use crate::application::evaluate_throttle::{ThrottleDecision, ThrottleDecisionEngine};
use crate::application::interceptor::ThrottleInterceptor;
use crate::domain::repository::AuditTrailRepository;
use crate::infra::postgres::PgAuditRepository;
use crate::presentation::middleware::{ThrottleMiddlewareState, throttle_login_submissions};

/// Interceptor backed by the PostgreSQL audit trail
pub type PgThrottleInterceptor =
    ThrottleInterceptor<ThrottleDecisionEngine<PgAuditRepository>, PgAuditRepository>;

/// Wrap `router` with the login throttle backed by PostgreSQL
pub fn throttled_router(
    router: Router,
    repo: PgAuditRepository,
    config: ThrottleConfig,
    server_ip: Option<IpAddr>,
) -> Router {
    let interceptor: PgThrottleInterceptor = ThrottleInterceptor::from_store(Arc::new(repo), config);
    throttled_router_generic(router, interceptor, server_ip)
}

/// Wrap `router` with any interceptor implementation
pub fn throttled_router_generic<D, A>(
    router: Router,
    interceptor: ThrottleInterceptor<D, A>,
    server_ip: Option<IpAddr>,
) -> Router
where
    D: ThrottleDecision + Send + Sync + 'static,
    A: AuditTrailRepository + Send + Sync + 'static,
{
    tracing::info!(
        name = interceptor.name(),
        failure_threshold = interceptor.config().failure_threshold,
        failure_range_secs = interceptor.config().failure_range_secs(),
        "Login throttle enabled"
    );

    let state = ThrottleMiddlewareState {
        interceptor: Arc::new(interceptor),
        server_ip,
    };

    router.layer(middleware::from_fn_with_state(
        state,
        throttle_login_submissions::<D, A>,
    ))
}
