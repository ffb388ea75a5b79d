//! Permission Value Object
//!
//! An allowed operation (`action`) on a class of resources (`resource`).

use serde::{Deserialize, Serialize};

use crate::domain::errors::PermissionError;
use crate::domain::models::access_policy::AccessPolicy;
use crate::domain::models::name;

/// Serialized form of a [`Permission`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSnapshot {
    pub action: String,
    pub resource: String,
}

/// Immutable `(action, resource)` pair, compared structurally
///
/// Both parts are normalized to upper case on construction, so
/// `Permission::new("read", "file")` equals `Permission::new("READ", "FILE")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PermissionSnapshot")]
pub struct Permission {
    action: String,
    resource: String,
}

impl Permission {
    /// Resource name granting an action on every resource class
    pub const ALL_RESOURCES: &'static str = "ALL";

    /// Create a validated permission
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidAction` or `PermissionError::InvalidResource`
    /// if either part is empty or not made of `A-Z` and `_`.
    pub fn new(action: &str, resource: &str) -> Result<Self, PermissionError> {
        let action = name::normalize(action).map_err(PermissionError::InvalidAction)?;
        let resource = name::normalize(resource).map_err(PermissionError::InvalidResource)?;
        Ok(Self { action, resource })
    }

    /// Permission for `action` on the `ALL` resource
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidAction` if the action is malformed.
    pub fn on_all(action: &str) -> Result<Self, PermissionError> {
        Self::new(action, Self::ALL_RESOURCES)
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Replace the action, leaving the permission untouched on failure
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidAction` if the new action is malformed.
    pub fn set_action(&mut self, action: &str) -> Result<(), PermissionError> {
        self.action = name::normalize(action).map_err(PermissionError::InvalidAction)?;
        Ok(())
    }

    /// Replace the resource, leaving the permission untouched on failure
    ///
    /// # Errors
    ///
    /// Returns `PermissionError::InvalidResource` if the new resource is malformed.
    pub fn set_resource(&mut self, resource: &str) -> Result<(), PermissionError> {
        self.resource = name::normalize(resource).map_err(PermissionError::InvalidResource)?;
        Ok(())
    }

    /// True when this grant targets the `ALL` resource
    #[must_use]
    pub fn is_on_all_resources(&self) -> bool {
        self.resource == Self::ALL_RESOURCES
    }

    /// Whether holding `self` satisfies a check for `requested` under `policy`
    #[must_use]
    pub fn covers(&self, requested: &Permission, policy: &AccessPolicy) -> bool {
        if self == requested {
            return true;
        }
        policy.all_resources_wildcard && self.is_on_all_resources() && self.action == requested.action
    }

    #[must_use]
    pub fn snapshot(&self) -> PermissionSnapshot {
        PermissionSnapshot {
            action: self.action.clone(),
            resource: self.resource.clone(),
        }
    }
}

impl TryFrom<PermissionSnapshot> for Permission {
    type Error = PermissionError;

    fn try_from(snapshot: PermissionSnapshot) -> Result<Self, Self::Error> {
        Self::new(&snapshot.action, &snapshot.resource)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

impl std::str::FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (action, resource) = s
            .split_once(':')
            .ok_or_else(|| PermissionError::Unparseable(s.to_string()))?;
        Self::new(action, resource)
    }
}
