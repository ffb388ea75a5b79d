//! Role Value Object
//!
//! A named bundle of permissions assignable to network members.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::errors::RoleError;
use crate::domain::models::access_policy::AccessPolicy;
use crate::domain::models::name;
use crate::domain::models::permission::{Permission, PermissionSnapshot};

/// Serialized form of a [`Role`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub name: String,
    pub permissions: Vec<PermissionSnapshot>,
}

/// Named, deduplicated set of permissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    name: String,
    permissions: BTreeSet<Permission>,
}

impl Role {
    /// Create a role from a name and its initial permissions
    ///
    /// Structurally equal permissions in `permissions` collapse into one.
    ///
    /// # Errors
    ///
    /// Returns `RoleError::InvalidName` if the name is empty or malformed.
    pub fn new(
        name: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<Self, RoleError> {
        let name = name::normalize(name).map_err(RoleError::InvalidName)?;
        Ok(Self {
            name,
            permissions: permissions.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate over the permissions in `ACTION:RESOURCE` order
    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    /// Add a permission
    ///
    /// # Errors
    ///
    /// Returns `RoleError::DuplicatePermission` if an equal permission is already held.
    pub fn add_permission(&mut self, permission: Permission) -> Result<(), RoleError> {
        if self.permissions.contains(&permission) {
            return Err(RoleError::DuplicatePermission(permission));
        }
        self.permissions.insert(permission);
        Ok(())
    }

    /// Remove a permission, returning the stored value
    ///
    /// # Errors
    ///
    /// Returns `RoleError::PermissionNotFound` if no equal permission is held.
    pub fn remove_permission(&mut self, permission: &Permission) -> Result<Permission, RoleError> {
        self.permissions
            .take(permission)
            .ok_or_else(|| RoleError::PermissionNotFound(permission.clone()))
    }

    /// Exact structural membership test, with no wildcard handling
    #[must_use]
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether any held permission satisfies `requested` under `policy`
    #[must_use]
    pub fn grants(&self, requested: &Permission, policy: &AccessPolicy) -> bool {
        self.has_permission(requested)
            || self
                .permissions
                .iter()
                .any(|held| held.covers(requested, policy))
    }

    /// Swap the whole permission set at once
    ///
    /// # Errors
    ///
    /// Returns `RoleError::DuplicatePermission` if `permissions` repeats an entry;
    /// the role keeps its previous permissions in that case.
    pub fn replace_permissions(
        &mut self,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<(), RoleError> {
        let mut replacement = BTreeSet::new();
        for permission in permissions {
            if replacement.contains(&permission) {
                return Err(RoleError::DuplicatePermission(permission));
            }
            replacement.insert(permission);
        }
        self.permissions = replacement;
        Ok(())
    }

    /// Rename the role. Networks holding the role are not updated.
    ///
    /// # Errors
    ///
    /// Returns `RoleError::InvalidName` if the new name is empty or malformed.
    pub fn rename(&mut self, name: &str) -> Result<(), RoleError> {
        self.name = name::normalize(name).map_err(RoleError::InvalidName)?;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> RoleSnapshot {
        RoleSnapshot {
            name: self.name.clone(),
            permissions: self.permissions.iter().map(Permission::snapshot).collect(),
        }
    }
}

impl TryFrom<RoleSnapshot> for Role {
    type Error = RoleError;

    fn try_from(snapshot: RoleSnapshot) -> Result<Self, Self::Error> {
        let mut role = Self::new(&snapshot.name, [])?;
        let permissions = snapshot
            .permissions
            .into_iter()
            .map(Permission::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        role.replace_permissions(permissions)?;
        Ok(role)
    }
}
