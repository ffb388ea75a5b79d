//! Domain Error Types
//!
//! One error enum per entity. Each error reports a stable machine-readable
//! [`ErrorKind`]; translating kinds into externally-facing status categories
//! happens in `shared::errors`.

use serde::Serialize;
use thiserror::Error;

use crate::domain::models::identifiers::{ResourceId, UserId};
use crate::domain::models::permission::Permission;

/// Stable, machine-readable error kinds raised by the domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    EmptyName,
    MissingAdmin,
    InvalidFormat,
    InvalidSnapshot,
    DuplicateRole,
    DuplicatePermission,
    UserAlreadyInNetwork,
    RoleNotFound,
    UserNotFound,
    ResourceNotFound,
    PermissionNotFound,
    RoleInUse,
    CannotRemoveAdmin,
    CannotReassignAdmin,
    ProtectedRole,
}

impl ErrorKind {
    /// Get the kind as its wire code, e.g. `ROLE_IN_USE`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyName => "EMPTY_NAME",
            Self::MissingAdmin => "MISSING_ADMIN",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidSnapshot => "INVALID_SNAPSHOT",
            Self::DuplicateRole => "DUPLICATE_ROLE",
            Self::DuplicatePermission => "DUPLICATE_PERMISSION",
            Self::UserAlreadyInNetwork => "USER_ALREADY_IN_NETWORK",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::PermissionNotFound => "PERMISSION_NOT_FOUND",
            Self::RoleInUse => "ROLE_IN_USE",
            Self::CannotRemoveAdmin => "CANNOT_REMOVE_ADMIN",
            Self::CannotReassignAdmin => "CANNOT_REASSIGN_ADMIN",
            Self::ProtectedRole => "PROTECTED_ROLE",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format violations for actions, resources and role names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("value must not be empty")]
    Empty,

    #[error("'{0}' must contain only letters A-Z and '_'")]
    InvalidFormat(String),
}

/// Errors raised by the `Permission` value object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Invalid permission action: {0}")]
    InvalidAction(NameError),

    #[error("Invalid permission resource: {0}")]
    InvalidResource(NameError),

    #[error("Invalid permission '{0}': expected ACTION:RESOURCE")]
    Unparseable(String),
}

impl PermissionError {
    /// Get the machine-readable kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidFormat
    }
}

/// Errors raised by the `Role` value object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Invalid role name: {0}")]
    InvalidName(NameError),

    #[error("Role already has permission {0}")]
    DuplicatePermission(Permission),

    #[error("Role does not have permission {0}")]
    PermissionNotFound(Permission),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl RoleError {
    /// Get the machine-readable kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) | Self::Permission(_) => ErrorKind::InvalidFormat,
            Self::DuplicatePermission(_) => ErrorKind::DuplicatePermission,
            Self::PermissionNotFound(_) => ErrorKind::PermissionNotFound,
        }
    }
}

/// Errors raised by the `Network` aggregate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Network name must not be empty")]
    EmptyName,

    #[error("Network requires an admin user")]
    MissingAdmin,

    #[error("Role {0} already exists")]
    DuplicateRole(String),

    #[error("Role {0} not found")]
    RoleNotFound(String),

    #[error("Role {role} is assigned to {members} member(s)")]
    RoleInUse { role: String, members: usize },

    #[error("Role {0} is protected")]
    ProtectedRole(String),

    #[error("User id must not be blank")]
    BlankUserId,

    #[error("User {0} is already a member of this network")]
    UserAlreadyInNetwork(UserId),

    #[error("User {0} is not a member of this network")]
    UserNotFound(UserId),

    #[error("User {0} is the network admin and cannot be removed")]
    CannotRemoveAdmin(UserId),

    #[error("User {0} is the network admin and must keep the ADMIN role")]
    CannotReassignAdmin(UserId),

    #[error("Resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("Invalid network snapshot: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Role(#[from] RoleError),
}

impl NetworkError {
    /// Get the machine-readable kind of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyName => ErrorKind::EmptyName,
            Self::MissingAdmin => ErrorKind::MissingAdmin,
            Self::DuplicateRole(_) => ErrorKind::DuplicateRole,
            Self::RoleNotFound(_) => ErrorKind::RoleNotFound,
            Self::RoleInUse { .. } => ErrorKind::RoleInUse,
            Self::ProtectedRole(_) => ErrorKind::ProtectedRole,
            Self::BlankUserId => ErrorKind::InvalidFormat,
            Self::UserAlreadyInNetwork(_) => ErrorKind::UserAlreadyInNetwork,
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::CannotRemoveAdmin(_) => ErrorKind::CannotRemoveAdmin,
            Self::CannotReassignAdmin(_) => ErrorKind::CannotReassignAdmin,
            Self::ResourceNotFound(_) => ErrorKind::ResourceNotFound,
            Self::InvalidSnapshot(_) => ErrorKind::InvalidSnapshot,
            Self::Role(err) => err.kind(),
        }
    }
}

impl From<PermissionError> for NetworkError {
    fn from(err: PermissionError) -> Self {
        Self::Role(RoleError::Permission(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_screaming_snake_case() {
        assert_eq!(ErrorKind::RoleInUse.as_str(), "ROLE_IN_USE");
        assert_eq!(ErrorKind::UserAlreadyInNetwork.to_string(), "USER_ALREADY_IN_NETWORK");
        assert_eq!(
            serde_json::to_string(&ErrorKind::CannotRemoveAdmin).unwrap(),
            "\"CANNOT_REMOVE_ADMIN\""
        );
    }

    #[test]
    fn test_network_error_delegates_kind_to_role_error() {
        let permission = Permission::new("READ", "ALL").unwrap();
        let err = NetworkError::from(RoleError::DuplicatePermission(permission));
        assert_eq!(err.kind(), ErrorKind::DuplicatePermission);

        let err = NetworkError::from(PermissionError::InvalidAction(NameError::Empty));
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
    }

    #[test]
    fn test_permission_errors_are_format_errors() {
        let err = PermissionError::InvalidResource(NameError::InvalidFormat("a b".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidFormat);
        assert_eq!(err.to_string(), "Invalid permission resource: 'a b' must contain only letters A-Z and '_'");
    }
}
