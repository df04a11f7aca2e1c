//! Per-request correlation id, threaded through logs and the bridge
//! envelope so a request can be traced across distributor boundaries.

use std::fmt;

use uuid::Uuid;

/// A request-scoped identifier. Generated once per inbound request and
/// attached to tracing spans and bridge calls that originate from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh, random request id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an id received from an upstream proxy (e.g. `X-Request-Id`),
    /// falling back to a fresh id if the header was empty.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Self(v.to_string()),
            None => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_nonempty_unique_ids() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn from_header_prefers_upstream_value() {
        let id = RequestId::from_header(Some("upstream-123"));
        assert_eq!(id.as_str(), "upstream-123");
    }

    #[test]
    fn from_header_falls_back_when_blank() {
        let id = RequestId::from_header(Some("   "));
        assert!(!id.as_str().is_empty());
        assert_ne!(id.as_str(), "   ");
    }
}
