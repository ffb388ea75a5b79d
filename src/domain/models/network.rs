//! Network Domain Model
//!
//! The workspace aggregate root. A network owns its members, its roles and
//! its resources, and is the only place where the consistency rules between
//! them are enforced:
//!
//! - the `ADMIN` role always exists and keeps `READ`, `WRITE` and `DELETE`
//!   on `ALL`;
//! - the admin user is always a member holding `ADMIN`;
//! - every member refers to an existing role;
//! - role names are unique and a role cannot be removed while assigned.
//!
//! Every mutator either succeeds and bumps `updated_at`, or fails without
//! touching the aggregate.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::NetworkError;
use crate::domain::models::access_policy::AccessPolicy;
use crate::domain::models::identifiers::{NetworkId, ResourceId, UserId};
use crate::domain::models::name;
use crate::domain::models::permission::Permission;
use crate::domain::models::role::{Role, RoleSnapshot};

/// Name of the role held by the network admin
pub const ADMIN_ROLE: &str = "ADMIN";

/// Actions the `ADMIN` role always holds on `ALL`
const ADMIN_ACTIONS: [&str; 3] = ["READ", "WRITE", "DELETE"];

/// A resource registered in a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    name: String,
    owner_id: UserId,
}

impl Resource {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// Serialized `{userId, roleName}` membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    pub user_id: UserId,
    pub role_name: String,
}

/// Serialized resource entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    pub resource_id: ResourceId,
    pub name: String,
    pub owner_id: UserId,
}

/// Plain-data snapshot of a network, holding only identifiers and primitives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub id: NetworkId,
    pub name: String,
    pub admin_id: UserId,
    pub members: Vec<MemberSnapshot>,
    pub roles: Vec<RoleSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for updating an existing Network (all fields optional for partial updates)
#[derive(Debug, Clone, Default)]
pub struct UpdateNetworkData {
    pub name: Option<String>,
    pub members: Option<Vec<MemberSnapshot>>,
    pub roles: Option<Vec<RoleSnapshot>>,
    pub resources: Option<Vec<ResourceSnapshot>>,
}

impl From<&Network> for UpdateNetworkData {
    fn from(network: &Network) -> Self {
        let snapshot = network.snapshot();
        Self {
            name: Some(snapshot.name),
            members: Some(snapshot.members),
            roles: Some(snapshot.roles),
            resources: Some(snapshot.resources),
        }
    }
}

/// Network aggregate root
#[derive(Debug, Clone)]
pub struct Network {
    id: NetworkId,
    name: String,
    admin_id: UserId,
    members: BTreeMap<UserId, String>,
    roles: BTreeMap<String, Role>,
    resources: BTreeMap<ResourceId, Resource>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Network {
    /// Create a network with its admin as the sole member
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::EmptyName` if the name is blank.
    /// Returns `NetworkError::MissingAdmin` if the admin id is blank.
    pub fn new(id: NetworkId, name: &str, admin_id: UserId) -> Result<Self, NetworkError> {
        let name = validate_name(name)?;
        if admin_id.is_blank() {
            return Err(NetworkError::MissingAdmin);
        }

        let admin_role = Role::new(ADMIN_ROLE, admin_permissions()?)?;
        let roles = BTreeMap::from([(ADMIN_ROLE.to_string(), admin_role)]);
        let members = BTreeMap::from([(admin_id.clone(), ADMIN_ROLE.to_string())]);
        let now = Utc::now();

        tracing::debug!(network_id = %id, admin_id = %admin_id, "Network created");

        Ok(Self {
            id,
            name,
            admin_id,
            members,
            roles,
            resources: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a network from a snapshot, re-validating every field
    ///
    /// # Errors
    ///
    /// Returns the same errors as construction for a bad name or admin,
    /// `NetworkError::Role` for malformed roles or permissions,
    /// `NetworkError::DuplicateRole` / `NetworkError::UserAlreadyInNetwork`
    /// for repeated entries, and `NetworkError::InvalidSnapshot` if an
    /// aggregate invariant does not hold.
    pub fn restore(snapshot: NetworkSnapshot) -> Result<Self, NetworkError> {
        let name = validate_name(&snapshot.name)?;
        if snapshot.admin_id.is_blank() {
            return Err(NetworkError::MissingAdmin);
        }

        let mut roles = BTreeMap::new();
        for role_snapshot in snapshot.roles {
            let role = Role::try_from(role_snapshot)?;
            let key = role.name().to_string();
            if roles.insert(key.clone(), role).is_some() {
                return Err(NetworkError::DuplicateRole(key));
            }
        }

        let mut members = BTreeMap::new();
        for member in snapshot.members {
            let role_name = name::lookup_key(&member.role_name);
            if members.insert(member.user_id.clone(), role_name).is_some() {
                return Err(NetworkError::UserAlreadyInNetwork(member.user_id));
            }
        }

        let mut resources = BTreeMap::new();
        for resource in snapshot.resources {
            let entry = Resource {
                name: resource.name,
                owner_id: resource.owner_id,
            };
            if resources.insert(resource.resource_id.clone(), entry).is_some() {
                return Err(NetworkError::InvalidSnapshot(format!(
                    "resource {} appears more than once",
                    resource.resource_id
                )));
            }
        }

        let network = Self {
            id: snapshot.id,
            name,
            admin_id: snapshot.admin_id,
            members,
            roles,
            resources,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        };
        network.check_invariants()?;
        Ok(network)
    }

    /// Apply a partial update, returning the updated aggregate
    ///
    /// # Errors
    ///
    /// Returns any error `restore` would report for the merged state.
    pub fn with_updates(self, data: UpdateNetworkData) -> Result<Self, NetworkError> {
        let mut snapshot = self.snapshot();
        if let Some(name) = data.name {
            snapshot.name = name;
        }
        if let Some(members) = data.members {
            snapshot.members = members;
        }
        if let Some(roles) = data.roles {
            snapshot.roles = roles;
        }
        if let Some(resources) = data.resources {
            snapshot.resources = resources;
        }
        snapshot.updated_at = Utc::now();
        Self::restore(snapshot)
    }

    /// Verify the aggregate invariants
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidSnapshot` describing the first broken invariant.
    pub fn check_invariants(&self) -> Result<(), NetworkError> {
        let admin_role = self
            .roles
            .get(ADMIN_ROLE)
            .ok_or_else(|| NetworkError::InvalidSnapshot("ADMIN role is missing".to_string()))?;
        if !holds_admin_permissions(admin_role) {
            return Err(NetworkError::InvalidSnapshot(
                "ADMIN role lacks READ, WRITE or DELETE on ALL".to_string(),
            ));
        }

        if self.members.get(&self.admin_id).map(String::as_str) != Some(ADMIN_ROLE) {
            return Err(NetworkError::InvalidSnapshot(format!(
                "admin {} is not a member holding ADMIN",
                self.admin_id
            )));
        }

        if self.members.keys().any(UserId::is_blank) {
            return Err(NetworkError::InvalidSnapshot("member with blank user id".to_string()));
        }

        if let Some((user_id, role_name)) = self
            .members
            .iter()
            .find(|(_, role_name)| !self.roles.contains_key(*role_name))
        {
            return Err(NetworkError::InvalidSnapshot(format!(
                "member {user_id} refers to unknown role {role_name}"
            )));
        }

        if let Some((key, role)) = self.roles.iter().find(|(key, role)| *key != role.name()) {
            return Err(NetworkError::InvalidSnapshot(format!(
                "role stored as {key} is named {}",
                role.name()
            )));
        }

        Ok(())
    }

    /// Rename the network
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::EmptyName` if the name is blank.
    pub fn rename(&mut self, name: &str) -> Result<(), NetworkError> {
        self.name = validate_name(name)?;
        self.touch();
        Ok(())
    }

    #[must_use]
    pub fn is_admin(&self, user_id: &UserId) -> bool {
        *user_id == self.admin_id
    }

    // Roles

    /// Add a role
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::DuplicateRole` if a role with the same name exists.
    pub fn add_role(&mut self, role: Role) -> Result<(), NetworkError> {
        let key = role.name().to_string();
        if self.roles.contains_key(&key) {
            return Err(NetworkError::DuplicateRole(key));
        }

        tracing::debug!(network_id = %self.id, role = %key, "Role added");
        self.roles.insert(key, role);
        self.touch();
        Ok(())
    }

    /// Replace the role stored under `name` wholesale, returning the old role
    ///
    /// If `role` carries a different name, the role is re-keyed and every
    /// member assigned to the old name moves to the new one.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RoleNotFound` if `name` is unknown.
    /// Returns `NetworkError::ProtectedRole` if the replacement would rename
    /// `ADMIN` or drop one of its mandatory permissions.
    /// Returns `NetworkError::DuplicateRole` if the new name is already taken.
    pub fn update_role(&mut self, name: &str, role: Role) -> Result<Role, NetworkError> {
        let key = name::lookup_key(name);
        if !self.roles.contains_key(&key) {
            return Err(NetworkError::RoleNotFound(key));
        }

        let new_key = role.name().to_string();
        if key == ADMIN_ROLE && (new_key != ADMIN_ROLE || !holds_admin_permissions(&role)) {
            return Err(NetworkError::ProtectedRole(key));
        }
        if new_key != key && self.roles.contains_key(&new_key) {
            return Err(NetworkError::DuplicateRole(new_key));
        }

        let previous = self
            .roles
            .remove(&key)
            .ok_or_else(|| NetworkError::RoleNotFound(key.clone()))?;
        if new_key != key {
            for role_name in self.members.values_mut().filter(|role_name| **role_name == key) {
                role_name.clone_from(&new_key);
            }
        }

        tracing::debug!(network_id = %self.id, role = %key, new_role = %new_key, "Role updated");
        self.roles.insert(new_key, role);
        self.touch();
        Ok(previous)
    }

    /// Rename a role, carrying its members along
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Role` if the new name is malformed, plus every
    /// error `update_role` reports.
    pub fn rename_role(&mut self, name: &str, new_name: &str) -> Result<(), NetworkError> {
        let key = name::lookup_key(name);
        let mut role = self
            .roles
            .get(&key)
            .cloned()
            .ok_or_else(|| NetworkError::RoleNotFound(key.clone()))?;
        role.rename(new_name)?;
        self.update_role(&key, role)?;
        Ok(())
    }

    /// Remove an unassigned role, returning it
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RoleNotFound` if `name` is unknown.
    /// Returns `NetworkError::ProtectedRole` for `ADMIN`.
    /// Returns `NetworkError::RoleInUse` if any member holds the role.
    pub fn remove_role(&mut self, name: &str) -> Result<Role, NetworkError> {
        let key = name::lookup_key(name);
        if !self.roles.contains_key(&key) {
            return Err(NetworkError::RoleNotFound(key));
        }
        if key == ADMIN_ROLE {
            return Err(NetworkError::ProtectedRole(key));
        }

        let members = self.members.values().filter(|role_name| **role_name == key).count();
        if members > 0 {
            return Err(NetworkError::RoleInUse { role: key, members });
        }

        let role = self
            .roles
            .remove(&key)
            .ok_or_else(|| NetworkError::RoleNotFound(key.clone()))?;
        tracing::debug!(network_id = %self.id, role = %key, "Role removed");
        self.touch();
        Ok(role)
    }

    /// Grant a permission to a role
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RoleNotFound` if the role is unknown.
    /// Returns `NetworkError::Role` if the role already holds the permission.
    pub fn grant_permission(&mut self, role_name: &str, permission: Permission) -> Result<(), NetworkError> {
        let key = name::lookup_key(role_name);
        let role = self
            .roles
            .get_mut(&key)
            .ok_or_else(|| NetworkError::RoleNotFound(key.clone()))?;

        role.add_permission(permission.clone())?;
        tracing::debug!(network_id = %self.id, role = %key, permission = %permission, "Permission granted");
        self.touch();
        Ok(())
    }

    /// Revoke a permission from a role, returning the stored value
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RoleNotFound` if the role is unknown.
    /// Returns `NetworkError::ProtectedRole` when revoking a mandatory `ADMIN` permission.
    /// Returns `NetworkError::Role` if the role does not hold the permission.
    pub fn revoke_permission(
        &mut self,
        role_name: &str,
        permission: &Permission,
    ) -> Result<Permission, NetworkError> {
        let key = name::lookup_key(role_name);
        let role = self
            .roles
            .get_mut(&key)
            .ok_or_else(|| NetworkError::RoleNotFound(key.clone()))?;
        if key == ADMIN_ROLE && is_admin_permission(permission) {
            return Err(NetworkError::ProtectedRole(key));
        }

        let removed = role.remove_permission(permission)?;
        tracing::debug!(network_id = %self.id, role = %key, permission = %removed, "Permission revoked");
        self.touch();
        Ok(removed)
    }

    // Members

    /// Add a user as a member holding `role_name`
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::BlankUserId` if the user id is blank.
    /// Returns `NetworkError::UserAlreadyInNetwork` if the user is a member.
    /// Returns `NetworkError::RoleNotFound` if the role is unknown.
    pub fn add_member(&mut self, user_id: UserId, role_name: &str) -> Result<(), NetworkError> {
        if user_id.is_blank() {
            return Err(NetworkError::BlankUserId);
        }
        if self.members.contains_key(&user_id) {
            return Err(NetworkError::UserAlreadyInNetwork(user_id));
        }
        let key = name::lookup_key(role_name);
        if !self.roles.contains_key(&key) {
            return Err(NetworkError::RoleNotFound(key));
        }

        tracing::debug!(network_id = %self.id, user_id = %user_id, role = %key, "Member added");
        self.members.insert(user_id, key);
        self.touch();
        Ok(())
    }

    /// Remove a member
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::CannotRemoveAdmin` for the admin.
    /// Returns `NetworkError::UserNotFound` if the user is not a member.
    pub fn remove_member(&mut self, user_id: &UserId) -> Result<(), NetworkError> {
        if self.is_admin(user_id) {
            return Err(NetworkError::CannotRemoveAdmin(user_id.clone()));
        }
        if self.members.remove(user_id).is_none() {
            return Err(NetworkError::UserNotFound(user_id.clone()));
        }

        tracing::debug!(network_id = %self.id, user_id = %user_id, "Member removed");
        self.touch();
        Ok(())
    }

    /// Move an existing member to another role
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::RoleNotFound` if the role is unknown.
    /// Returns `NetworkError::CannotReassignAdmin` when moving the admin off `ADMIN`.
    /// Returns `NetworkError::UserNotFound` if the user is not a member.
    pub fn assign_role_to_user(&mut self, user_id: &UserId, role_name: &str) -> Result<(), NetworkError> {
        let key = name::lookup_key(role_name);
        if !self.roles.contains_key(&key) {
            return Err(NetworkError::RoleNotFound(key));
        }
        if self.is_admin(user_id) && key != ADMIN_ROLE {
            return Err(NetworkError::CannotReassignAdmin(user_id.clone()));
        }

        let assigned = self
            .members
            .get_mut(user_id)
            .ok_or_else(|| NetworkError::UserNotFound(user_id.clone()))?;
        tracing::debug!(network_id = %self.id, user_id = %user_id, role = %key, "Role assigned");
        *assigned = key;
        self.touch();
        Ok(())
    }

    /// Exact permission check for a member
    ///
    /// Non-members and members whose role is missing are simply denied.
    #[must_use]
    pub fn can_user(&self, user_id: &UserId, permission: &Permission) -> bool {
        self.member_role(user_id)
            .is_some_and(|role| role.has_permission(permission))
    }

    /// Permission check for a member under an explicit `AccessPolicy`
    #[must_use]
    pub fn can_user_with(&self, user_id: &UserId, permission: &Permission, policy: &AccessPolicy) -> bool {
        self.member_role(user_id)
            .is_some_and(|role| role.grants(permission, policy))
    }

    // Resources

    /// Register a resource, returning the entry it replaced if any
    pub fn add_resource(&mut self, resource_id: ResourceId, name: &str, owner_id: UserId) -> Option<Resource> {
        tracing::debug!(network_id = %self.id, resource_id = %resource_id, owner_id = %owner_id, "Resource added");
        let previous = self.resources.insert(
            resource_id,
            Resource {
                name: name.to_string(),
                owner_id,
            },
        );
        self.touch();
        previous
    }

    /// Remove a resource, returning it
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::ResourceNotFound` if the resource is unknown.
    pub fn remove_resource(&mut self, resource_id: &ResourceId) -> Result<Resource, NetworkError> {
        let resource = self
            .resources
            .remove(resource_id)
            .ok_or_else(|| NetworkError::ResourceNotFound(resource_id.clone()))?;

        tracing::debug!(network_id = %self.id, resource_id = %resource_id, "Resource removed");
        self.touch();
        Ok(resource)
    }

    #[must_use]
    pub fn is_resource_owner(&self, user_id: &UserId, resource_id: &ResourceId) -> bool {
        self.resources
            .get(resource_id)
            .is_some_and(|resource| resource.owner_id == *user_id)
    }

    /// Plain-data view of the aggregate, ordered by key
    #[must_use]
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            admin_id: self.admin_id.clone(),
            members: self
                .members
                .iter()
                .map(|(user_id, role_name)| MemberSnapshot {
                    user_id: user_id.clone(),
                    role_name: role_name.clone(),
                })
                .collect(),
            roles: self.roles.values().map(Role::snapshot).collect(),
            resources: self
                .resources
                .iter()
                .map(|(resource_id, resource)| ResourceSnapshot {
                    resource_id: resource_id.clone(),
                    name: resource.name.clone(),
                    owner_id: resource.owner_id.clone(),
                })
                .collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // Getters

    #[must_use]
    pub fn id(&self) -> &NetworkId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn admin_id(&self) -> &UserId {
        &self.admin_id
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(&name::lookup_key(name))
    }

    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    #[must_use]
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    /// Role currently held by a member
    #[must_use]
    pub fn member_role(&self, user_id: &UserId) -> Option<&Role> {
        self.members
            .get(user_id)
            .and_then(|role_name| self.roles.get(role_name))
    }

    /// Iterate over `(user, role name)` pairs
    pub fn members(&self) -> impl Iterator<Item = (&UserId, &str)> {
        self.members
            .iter()
            .map(|(user_id, role_name)| (user_id, role_name.as_str()))
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn resource(&self, resource_id: &ResourceId) -> Option<&Resource> {
        self.resources.get(resource_id)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&ResourceId, &Resource)> {
        self.resources.iter()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn validate_name(name: &str) -> Result<String, NetworkError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(NetworkError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn admin_permissions() -> Result<Vec<Permission>, NetworkError> {
    ADMIN_ACTIONS
        .iter()
        .map(|action| Permission::on_all(action).map_err(NetworkError::from))
        .collect()
}

fn is_admin_permission(permission: &Permission) -> bool {
    permission.is_on_all_resources() && ADMIN_ACTIONS.contains(&permission.action())
}

fn holds_admin_permissions(role: &Role) -> bool {
    ADMIN_ACTIONS.iter().all(|action| {
        role.permissions()
            .any(|permission| permission.is_on_all_resources() && permission.action() == *action)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorKind, RoleError};

    fn user(id: &str) -> UserId {
        UserId::from(id)
    }

    fn permission(action: &str, resource: &str) -> Permission {
        Permission::new(action, resource).unwrap()
    }

    fn create_test_network() -> Network {
        Network::new(NetworkId::new(), "Ward A", user("u1")).unwrap()
    }

    fn network_with_nurse() -> Network {
        let mut network = create_test_network();
        network
            .add_role(Role::new("NURSE", vec![permission("READ", "CHART")]).unwrap())
            .unwrap();
        network.add_member(user("u2"), "NURSE").unwrap();
        network
    }

    #[test]
    fn test_network_new() {
        let network = create_test_network();

        assert_eq!(network.name(), "Ward A");
        assert_eq!(network.admin_id(), &user("u1"));
        assert!(network.is_admin(&user("u1")));
        assert_eq!(network.created_at(), network.updated_at());

        let admin = network.role("ADMIN").unwrap();
        assert_eq!(admin.permission_count(), 3);
        for action in ["READ", "WRITE", "DELETE"] {
            assert!(admin.has_permission(&Permission::on_all(action).unwrap()));
        }

        let members: Vec<_> = network.members().collect();
        assert_eq!(members, vec![(&user("u1"), "ADMIN")]);
        assert!(network.check_invariants().is_ok());
    }

    #[test]
    fn test_network_new_rejects_empty_name_and_missing_admin() {
        let err = Network::new(NetworkId::new(), "  ", user("u1")).unwrap_err();
        assert_eq!(err, NetworkError::EmptyName);

        let err = Network::new(NetworkId::new(), "Ward A", user("")).unwrap_err();
        assert_eq!(err, NetworkError::MissingAdmin);
    }

    #[test]
    fn should_reject_duplicate_role_case_insensitively() {
        let mut network = network_with_nurse();

        let err = network.add_role(Role::new("nurse", []).unwrap()).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateRole("NURSE".to_string()));

        let err = network.add_role(Role::new("admin", []).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateRole);
    }

    /// Run `mutate` after a short pause and report whether `updated_at` moved forward
    fn bumps_updated_at(network: &mut Network, mutate: impl FnOnce(&mut Network)) -> bool {
        let before = network.updated_at();
        std::thread::sleep(std::time::Duration::from_millis(2));
        mutate(network);
        network.updated_at() > before
    }

    #[test]
    fn test_successful_mutations_bump_updated_at() {
        let mut network = create_test_network();

        assert!(bumps_updated_at(&mut network, |n| n.add_role(Role::new("NURSE", []).unwrap()).unwrap()));
        assert!(network.updated_at() > network.created_at());
        assert!(bumps_updated_at(&mut network, |n| n.add_role(Role::new("CLERK", []).unwrap()).unwrap()));
        assert!(bumps_updated_at(&mut network, |n| n.add_member(user("u2"), "NURSE").unwrap()));
        assert!(bumps_updated_at(&mut network, |n| n.assign_role_to_user(&user("u2"), "CLERK").unwrap()));
        assert!(bumps_updated_at(&mut network, |n| n.remove_member(&user("u2")).unwrap()));
        assert!(bumps_updated_at(&mut network, |n| {
            n.remove_role("CLERK").unwrap();
        }));
        assert!(bumps_updated_at(&mut network, |n| {
            n.add_resource(ResourceId::from("chart-1"), "Chart 1", user("u1"));
        }));
        assert!(bumps_updated_at(&mut network, |n| {
            n.remove_resource(&ResourceId::from("chart-1")).unwrap();
        }));
        assert!(network.role("nurse").is_some());
    }

    #[test]
    fn test_failed_mutations_keep_updated_at() {
        let mut network = network_with_nurse();

        assert!(!bumps_updated_at(&mut network, |n| {
            assert!(n.add_role(Role::new("NURSE", []).unwrap()).is_err());
        }));
        assert!(!bumps_updated_at(&mut network, |n| assert!(n.remove_role("NURSE").is_err())));
        assert!(!bumps_updated_at(&mut network, |n| assert!(n.add_member(user("u2"), "NURSE").is_err())));
        assert!(!bumps_updated_at(&mut network, |n| assert!(n.remove_member(&user("u1")).is_err())));
        assert!(!bumps_updated_at(&mut network, |n| {
            assert!(n.assign_role_to_user(&user("u9"), "NURSE").is_err());
        }));
        assert!(!bumps_updated_at(&mut network, |n| {
            assert!(n.remove_resource(&ResourceId::from("missing")).is_err());
        }));
    }

    #[test]
    fn should_reject_blank_member_ids() {
        let mut network = network_with_nurse();
        let before = network.snapshot();

        let err = network.add_member(user(""), "NURSE").unwrap_err();
        assert_eq!(err, NetworkError::BlankUserId);
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(network.add_member(user("   "), "NURSE").unwrap_err(), NetworkError::BlankUserId);
        assert_eq!(network.snapshot(), before);

        let mut snapshot = network.snapshot();
        snapshot.members.push(MemberSnapshot {
            user_id: user(" "),
            role_name: "NURSE".to_string(),
        });
        assert_eq!(Network::restore(snapshot).unwrap_err().kind(), ErrorKind::InvalidSnapshot);
    }

    #[test]
    fn should_block_removing_role_in_use() {
        let mut network = network_with_nurse();

        let err = network.remove_role("NURSE").unwrap_err();
        assert_eq!(
            err,
            NetworkError::RoleInUse {
                role: "NURSE".to_string(),
                members: 1
            }
        );
        assert!(network.role("NURSE").is_some());

        network.remove_member(&user("u2")).unwrap();
        let removed = network.remove_role("nurse").unwrap();
        assert_eq!(removed.name(), "NURSE");
        assert!(network.role("NURSE").is_none());
    }

    #[test]
    fn test_remove_role_errors() {
        let mut network = create_test_network();

        assert_eq!(network.remove_role("GHOST").unwrap_err().kind(), ErrorKind::RoleNotFound);
        assert_eq!(
            network.remove_role("admin").unwrap_err(),
            NetworkError::ProtectedRole("ADMIN".to_string())
        );
    }

    #[test]
    fn test_update_role_replaces_wholesale() {
        let mut network = network_with_nurse();

        let replacement = Role::new("NURSE", vec![permission("WRITE", "CHART")]).unwrap();
        let previous = network.update_role("nurse", replacement).unwrap();

        assert!(previous.has_permission(&permission("READ", "CHART")));
        assert!(!network.can_user(&user("u2"), &permission("READ", "CHART")));
        assert!(network.can_user(&user("u2"), &permission("WRITE", "CHART")));
    }

    #[test]
    fn test_update_role_with_new_name_migrates_members() {
        let mut network = network_with_nurse();

        network
            .update_role("NURSE", Role::new("CARER", vec![permission("READ", "CHART")]).unwrap())
            .unwrap();

        assert!(network.role("NURSE").is_none());
        assert_eq!(network.member_role(&user("u2")).unwrap().name(), "CARER");
        assert!(network.check_invariants().is_ok());
    }

    #[test]
    fn test_update_role_errors() {
        let mut network = network_with_nurse();
        network.add_role(Role::new("DOCTOR", []).unwrap()).unwrap();

        let err = network.update_role("GHOST", Role::new("GHOST", []).unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleNotFound);

        let err = network.update_role("NURSE", Role::new("DOCTOR", []).unwrap()).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateRole("DOCTOR".to_string()));
        assert_eq!(network.member_role(&user("u2")).unwrap().name(), "NURSE");
    }

    #[test]
    fn test_admin_role_is_protected_from_update() {
        let mut network = create_test_network();

        let renamed = Role::new("OWNER", admin_permissions().unwrap()).unwrap();
        let err = network.update_role("ADMIN", renamed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtectedRole);

        let weakened = Role::new("ADMIN", vec![Permission::on_all("READ").unwrap()]).unwrap();
        assert!(network.update_role("ADMIN", weakened).is_err());

        let mut extended = admin_permissions().unwrap();
        extended.push(permission("INVITE", "MEMBER"));
        network.update_role("ADMIN", Role::new("ADMIN", extended).unwrap()).unwrap();
        assert_eq!(network.role("ADMIN").unwrap().permission_count(), 4);

        assert_eq!(
            network.rename_role("ADMIN", "OWNER").unwrap_err().kind(),
            ErrorKind::ProtectedRole
        );
    }

    #[test]
    fn test_rename_role() {
        let mut network = network_with_nurse();

        network.rename_role("nurse", "head_nurse").unwrap();
        assert_eq!(network.member_role(&user("u2")).unwrap().name(), "HEAD_NURSE");

        let err = network.rename_role("HEAD_NURSE", "head nurse").unwrap_err();
        assert!(matches!(err, NetworkError::Role(RoleError::InvalidName(_))));
    }

    #[test]
    fn test_grant_and_revoke_permission() {
        let mut network = network_with_nurse();
        let write_chart = permission("WRITE", "CHART");

        network.grant_permission("NURSE", write_chart.clone()).unwrap();
        assert!(network.can_user(&user("u2"), &write_chart));

        let err = network.grant_permission("NURSE", write_chart.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicatePermission);

        network.revoke_permission("nurse", &write_chart).unwrap();
        assert!(!network.can_user(&user("u2"), &write_chart));

        let err = network.revoke_permission("NURSE", &write_chart).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionNotFound);

        let err = network.grant_permission("GHOST", write_chart).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleNotFound);
    }

    #[test]
    fn test_mandatory_admin_permissions_cannot_be_revoked() {
        let mut network = create_test_network();
        let invite = permission("INVITE", "MEMBER");

        let err = network
            .revoke_permission("ADMIN", &Permission::on_all("DELETE").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtectedRole);

        network.grant_permission("ADMIN", invite.clone()).unwrap();
        network.revoke_permission("ADMIN", &invite).unwrap();
        assert!(network.check_invariants().is_ok());
    }

    #[test]
    fn test_add_member() {
        let mut network = network_with_nurse();

        assert_eq!(network.member_role(&user("u2")).unwrap().name(), "NURSE");
        assert_eq!(network.member_count(), 2);

        let err = network.add_member(user("u2"), "NURSE").unwrap_err();
        assert_eq!(err, NetworkError::UserAlreadyInNetwork(user("u2")));

        let err = network.add_member(user("u3"), "SURGEON").unwrap_err();
        assert_eq!(err, NetworkError::RoleNotFound("SURGEON".to_string()));
        assert!(!network.is_member(&user("u3")));
    }

    #[test]
    fn should_not_remove_admin_member() {
        let mut network = create_test_network();
        let before = network.snapshot();

        let err = network.remove_member(&user("u1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotRemoveAdmin);
        assert_eq!(network.snapshot(), before);

        let err = network.remove_member(&user("u9")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserNotFound);
    }

    #[test]
    fn test_assign_role_to_user() {
        let mut network = network_with_nurse();
        network.add_role(Role::new("DOCTOR", []).unwrap()).unwrap();

        network.assign_role_to_user(&user("u2"), "doctor").unwrap();
        assert_eq!(network.member_role(&user("u2")).unwrap().name(), "DOCTOR");

        let err = network.assign_role_to_user(&user("u2"), "GHOST").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleNotFound);

        let err = network.assign_role_to_user(&user("u3"), "DOCTOR").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserNotFound);
        assert!(!network.is_member(&user("u3")));

        let err = network.assign_role_to_user(&user("u1"), "DOCTOR").unwrap_err();
        assert_eq!(err, NetworkError::CannotReassignAdmin(user("u1")));
        network.assign_role_to_user(&user("u1"), "ADMIN").unwrap();
    }

    #[test]
    fn test_can_user_denies_non_members() {
        let network = network_with_nurse();

        assert!(network.can_user(&user("u2"), &permission("READ", "CHART")));
        assert!(!network.can_user(&user("u2"), &permission("READ", "PATIENT_FILE")));
        assert!(!network.can_user(&user("u9"), &permission("READ", "CHART")));
    }

    #[test]
    fn test_admin_all_grant_is_exact_unless_policy_says_otherwise() {
        let network = create_test_network();
        let read_file = permission("READ", "PATIENT_FILE");

        assert!(network.can_user(&user("u1"), &Permission::on_all("READ").unwrap()));
        assert!(!network.can_user(&user("u1"), &read_file));
        assert!(!network.can_user_with(&user("u1"), &read_file, &AccessPolicy::default()));
        assert!(network.can_user_with(&user("u1"), &read_file, &AccessPolicy::wildcard()));
        assert!(!network.can_user_with(&user("u9"), &read_file, &AccessPolicy::wildcard()));
    }

    #[test]
    fn test_resources() {
        let mut network = network_with_nurse();
        let file = ResourceId::from("file-1");

        assert!(network.add_resource(file.clone(), "Chart", user("u2")).is_none());
        assert!(network.is_resource_owner(&user("u2"), &file));
        assert!(!network.is_resource_owner(&user("u1"), &file));

        let replaced = network.add_resource(file.clone(), "Chart v2", user("u1")).unwrap();
        assert_eq!(replaced.name(), "Chart");
        assert_eq!(network.resource(&file).unwrap().owner_id(), &user("u1"));

        let removed = network.remove_resource(&file).unwrap();
        assert_eq!(removed.name(), "Chart v2");
        assert_eq!(
            network.remove_resource(&file).unwrap_err(),
            NetworkError::ResourceNotFound(file)
        );
    }

    #[test]
    fn test_rename_network() {
        let mut network = create_test_network();

        assert_eq!(network.rename("").unwrap_err(), NetworkError::EmptyName);
        network.rename(" Ward B ").unwrap();
        assert_eq!(network.name(), "Ward B");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut network = network_with_nurse();
        network.add_resource(ResourceId::from("file-1"), "Chart", user("u2"));

        let snapshot = network.snapshot();
        assert_eq!(snapshot.members.len(), 2);
        assert_eq!(snapshot.roles.len(), 2);

        let restored = Network::restore(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn test_restore_rejects_broken_invariants() {
        let network = network_with_nurse();

        let mut snapshot = network.snapshot();
        snapshot.roles.retain(|role| role.name != "NURSE");
        let err = Network::restore(snapshot).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSnapshot);

        let mut snapshot = network.snapshot();
        snapshot.members.retain(|member| member.user_id != user("u1"));
        assert_eq!(Network::restore(snapshot).unwrap_err().kind(), ErrorKind::InvalidSnapshot);

        let mut snapshot = network.snapshot();
        snapshot.roles.push(snapshot.roles[0].clone());
        assert_eq!(Network::restore(snapshot).unwrap_err().kind(), ErrorKind::DuplicateRole);
    }

    #[test]
    fn test_with_updates() {
        let network = network_with_nurse();
        let mut members = network.snapshot().members;
        members.retain(|member| member.user_id != user("u2"));

        let updated = network
            .with_updates(UpdateNetworkData {
                name: Some("Ward C".to_string()),
                members: Some(members),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.name(), "Ward C");
        assert!(!updated.is_member(&user("u2")));
        assert!(updated.role("NURSE").is_some());
    }

    #[test]
    fn test_with_updates_rejects_dangling_member() {
        let network = create_test_network();
        let mut members = network.snapshot().members;
        members.push(MemberSnapshot {
            user_id: user("u2"),
            role_name: "GHOST".to_string(),
        });

        let result = network.with_updates(UpdateNetworkData {
            members: Some(members),
            ..Default::default()
        });
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidSnapshot);
    }
}
