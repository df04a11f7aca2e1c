//! Identity types for distributors and modules.

use std::fmt;

/// The smallest unit of isolation: a named runtime configuration with its
/// own module set and library versions.
///
/// Two `DistributorId`s with the same `code` but different `tag` are
/// different runtimes and must not share code or state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DistributorId {
    pub code: String,
    pub tag: String,
}

impl DistributorId {
    pub const DEFAULT_TAG: &'static str = "default";

    /// Construct a `DistributorId`, defaulting the tag to `"default"` when empty.
    pub fn new(code: impl Into<String>, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let tag = if tag.is_empty() {
            Self::DEFAULT_TAG.to_string()
        } else {
            tag
        };
        Self { code: code.into(), tag }
    }

    /// Construct a `DistributorId` with the default tag.
    pub fn with_default_tag(code: impl Into<String>) -> Self {
        Self::new(code, Self::DEFAULT_TAG)
    }

    /// Parse a `code@tag` or bare `code` string, as used in sites config and
    /// bridge caller ids.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('@') {
            Some((code, tag)) => Self::new(code, tag),
            None => Self::with_default_tag(raw),
        }
    }

    /// Render as `code@tag`, the canonical wire form used in bridge envelopes
    /// and sites config values.
    pub fn as_wire(&self) -> String {
        format!("{}@{}", self.code, self.tag)
    }

    /// Whether `allow_entry` (an exact id or a `code@*` wildcard) permits this id.
    pub fn matches_allow_entry(&self, allow_entry: &str) -> bool {
        if let Some(wildcard_code) = allow_entry.strip_suffix("@*") {
            wildcard_code == self.code
        } else {
            allow_entry == self.as_wire()
        }
    }
}

impl fmt::Display for DistributorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// A versioned bundle of routes, API commands, event listeners, and
/// templates, registered under a distributor. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// `"vendor/name"`.
    pub code: String,
    pub version: String,
    pub distributor: DistributorId,
    pub alias: String,
    pub root_path: String,
}

impl ModuleInfo {
    pub fn new(
        code: impl Into<String>,
        version: impl Into<String>,
        distributor: DistributorId,
        alias: impl Into<String>,
        root_path: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            version: version.into(),
            distributor,
            alias: alias.into(),
            root_path: root_path.into(),
        }
    }
}
