//! Domain Layer
//!
//! Contains the authorization model, its error taxonomy, and gateway traits (ports).
//! This layer performs no I/O.

pub mod errors;
pub mod gateways;
pub mod models;

pub use errors::{ErrorKind, NameError, NetworkError, PermissionError, RoleError};
pub use gateways::network_repository::NetworkRepository;
pub use models::{AccessPolicy, Network, NetworkId, Permission, ResourceId, Role, UpdateNetworkData, UserId};
