//! Platform Crate - Technical Infrastructure
//!
//! Request plumbing shared by the domain crates:
//! - Client / server address resolution (reverse-proxy aware)
//! - Login parameter extraction from query strings and urlencoded bodies

pub mod client;
pub mod params;
