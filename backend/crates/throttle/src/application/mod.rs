//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.

pub mod config;
pub mod evaluate_throttle;
pub mod interceptor;

// Re-exports
pub use config::{QueryFailurePolicy, ThrottleConfig};
pub use evaluate_throttle::{ThrottleDecision, ThrottleDecisionEngine};
pub use interceptor::{Disposition, THROTTLED_LOGIN_ATTEMPT, ThrottleInterceptor};
