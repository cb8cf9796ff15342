//! Presentation Layer
//!
//! axum middleware and router wiring.

pub mod middleware;
pub mod router;
