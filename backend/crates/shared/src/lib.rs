//! Shared Kernel - error vocabulary shared by every crate in the workspace
//!
//! This crate only holds things whose meaning is identical across domains:
//! - The unified [`error::app_error::AppError`] type and `AppResult<T>` alias
//! - [`error::kind::ErrorKind`], the HTTP-aligned error classification
//! - Database error classification and HTTP rendering (feature-gated `sqlx` / `axum`)

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
