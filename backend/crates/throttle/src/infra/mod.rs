//! Infrastructure Layer - audit store implementations

pub mod memory;
pub mod postgres;
