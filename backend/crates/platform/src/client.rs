//! Client identification utilities
//!
//! Resolves the client / server address pair recorded with every audit event.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Address pair of the connection that carried a request
///
/// Built once per request by the HTTP layer and handed down explicitly;
/// nothing reads it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client IP address (from X-Forwarded-For or direct connection)
    pub client_ip: String,
    /// Address of the server that accepted the connection
    pub server_ip: String,
}

impl ClientInfo {
    /// Placeholder recorded when an address cannot be determined
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(client_ip: impl Into<String>, server_ip: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            server_ip: server_ip.into(),
        }
    }

    /// Build from optional addresses, substituting [`ClientInfo::UNKNOWN`]
    pub fn from_addrs(client_ip: Option<IpAddr>, server_ip: Option<IpAddr>) -> Self {
        let render = |ip: Option<IpAddr>| {
            ip.map(|ip| ip.to_string())
                .unwrap_or_else(|| Self::UNKNOWN.to_string())
        };
        Self::new(render(client_ip), render(server_ip))
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
///
/// ## Arguments
/// * `headers` - HTTP request headers
/// * `direct_ip` - Direct connection IP address
///
/// ## Returns
/// The client IP address, or None if not determinable
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    // Check X-Forwarded-For header (first IP in the list)
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Resolve the full [`ClientInfo`] for a request
pub fn resolve_client_info(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    server_ip: Option<IpAddr>,
) -> ClientInfo {
    ClientInfo::from_addrs(extract_client_ip(headers, direct_ip), server_ip)
}
