//! Network Workspaces
//!
//! Role-based access control core for collaborative "network" workspaces,
//! following Clean/Hexagonal Architecture principles. The `Network` aggregate
//! owns members, roles and resources and enforces their consistency; storage
//! is reached only through the `NetworkRepository` port.

pub mod domain;
pub mod infrastructure;
pub mod shared;
