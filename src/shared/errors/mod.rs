//! Error Types
//!
//! Boundary error types with status category mapping. Domain errors only
//! carry an `ErrorKind`; this module decides what each kind means to callers.

use thiserror::Error;

use crate::domain::errors::{ErrorKind, NetworkError, PermissionError, RoleError};

/// Externally-facing status category suggested for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    BadRequest,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl StatusCategory {
    /// Get the category name, e.g. `not-found`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad-request",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }

    /// Get the HTTP status code usually paired with this category
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for StatusCategory {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::EmptyName
            | ErrorKind::MissingAdmin
            | ErrorKind::InvalidFormat
            | ErrorKind::InvalidSnapshot => Self::BadRequest,
            ErrorKind::DuplicateRole | ErrorKind::DuplicatePermission | ErrorKind::UserAlreadyInNetwork => {
                Self::Conflict
            }
            ErrorKind::RoleNotFound
            | ErrorKind::UserNotFound
            | ErrorKind::ResourceNotFound
            | ErrorKind::PermissionNotFound => Self::NotFound,
            ErrorKind::RoleInUse
            | ErrorKind::CannotRemoveAdmin
            | ErrorKind::CannotReassignAdmin
            | ErrorKind::ProtectedRole => Self::Forbidden,
        }
    }
}

/// Repository-level errors for data access failures
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Data mapping error: {0}")]
    Mapping(String),

    #[error(transparent)]
    Domain(#[from] NetworkError),
}

/// Errors surfaced to callers orchestrating the aggregate and its repository
#[derive(Debug, Error)]
pub enum UseCaseError {
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl UseCaseError {
    /// Get the domain error kind, if this error came from the domain
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Network(err) => Some(err.kind()),
            Self::Role(err) => Some(err.kind()),
            Self::Permission(err) => Some(err.kind()),
            Self::Repository(RepositoryError::Domain(err)) => Some(err.kind()),
            Self::NotFound { .. } | Self::Repository(_) => None,
        }
    }

    /// Get the status category for this error
    #[must_use]
    pub fn status_category(&self) -> StatusCategory {
        if let Some(kind) = self.kind() {
            return kind.into();
        }
        match self {
            Self::NotFound { .. } | Self::Repository(RepositoryError::NotFound(_)) => StatusCategory::NotFound,
            Self::Repository(RepositoryError::Conflict(_)) => StatusCategory::Conflict,
            _ => StatusCategory::Internal,
        }
    }

    /// Get the error code for this error
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        if let Some(kind) = self.kind() {
            return kind.as_str();
        }
        match self {
            Self::NotFound { .. } | Self::Repository(RepositoryError::NotFound(_)) => "NOT_FOUND",
            Self::Repository(RepositoryError::Conflict(_)) => "CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }
}
