//! Routing table for the upstream API surfaces

use crate::signing::SigningMode;

/// Upstream API surface a request is routed to
///
/// Each surface fixes a base URL, a path prefix, and an authentication
/// scheme, so callers name the surface and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Unauthenticated market data on the primary API
    Public,
    /// Signed requests on the primary API
    Advanced,
    /// Signed requests on the legacy API
    Exchange,
    /// Bearer-token requests on the v2 API
    OAuth,
}

impl Surface {
    pub(crate) fn path_prefix(self) -> &'static str {
        match self {
            Surface::Public | Surface::Advanced => "/api/v3/brokerage",
            Surface::Exchange => "",
            Surface::OAuth => "/v2",
        }
    }

    pub(crate) fn requires_auth(self) -> bool {
        !matches!(self, Surface::Public)
    }

    /// HMAC mode for the surface, or None when it authenticates with a
    /// bearer token instead
    pub(crate) fn signing_mode(self) -> Option<SigningMode> {
        match self {
            Surface::Public | Surface::OAuth => None,
            Surface::Advanced => Some(SigningMode::Primary),
            Surface::Exchange => Some(SigningMode::LegacyHex),
        }
    }
}
