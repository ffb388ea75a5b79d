//! Access Policy
//!
//! Controls how permission checks treat the reserved `ALL` resource.

use serde::Deserialize;

/// Permission matching rules applied by `Network::can_user_with`
///
/// The default policy matches permissions exactly, so a grant on `ALL` only
/// satisfies a check for `ALL` itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// When set, a grant on the `ALL` resource satisfies a check for any
    /// resource with the same action
    pub all_resources_wildcard: bool,
}

impl AccessPolicy {
    /// Policy matching permissions by structural equality only
    #[must_use]
    pub fn exact() -> Self {
        Self {
            all_resources_wildcard: false,
        }
    }

    /// Policy treating `ALL` as a wildcard resource
    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            all_resources_wildcard: true,
        }
    }
}
