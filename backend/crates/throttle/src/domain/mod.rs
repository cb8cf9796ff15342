//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (AuditEvent)
//! - Domain value objects (ThrottleIdentity, LoginSubmission, FailureTimestampSeries)
//! - Domain services (submission-rate computation)
//! - Repository traits (audit store interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
