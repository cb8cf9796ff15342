//! Login Throttle Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Audit events, identities, rate computation, store traits
//! - `application/` - Configuration, decision engine, interceptor
//! - `infra/` - PostgreSQL and in-memory audit stores
//! - `presentation/` - axum middleware
//!
//! ## Throttling Model
//! - Keyed by (client IP, username, application code)
//! - Only failures inside `[now - range, now]` are considered
//! - Rate = 1000 / (ms between the two most recent failures); blocked when
//!   it exceeds `failure_threshold / range_secs`
//! - Every failure and every throttled attempt is written to the audit trail
//! - No in-process state: concurrency safety comes from the audit store

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{QueryFailurePolicy, ThrottleConfig};
pub use application::evaluate_throttle::{ThrottleDecision, ThrottleDecisionEngine};
pub use application::interceptor::{Disposition, THROTTLED_LOGIN_ATTEMPT, ThrottleInterceptor};
pub use domain::value_objects::SubmissionOutcome;
pub use error::{ThrottleError, ThrottleResult};
pub use infra::memory::InMemoryAuditRepository;
pub use infra::postgres::PgAuditRepository;
pub use presentation::router::{throttled_router, throttled_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
