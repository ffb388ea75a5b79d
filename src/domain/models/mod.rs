//! Domain Models
//!
//! Pure domain entities and value objects representing business concepts.

pub mod access_policy;
pub mod identifiers;
pub(crate) mod name;
pub mod network;
pub mod permission;
pub mod role;

pub use access_policy::AccessPolicy;
pub use identifiers::{NetworkId, ResourceId, UserId};
pub use network::{
    MemberSnapshot, Network, NetworkSnapshot, Resource, ResourceSnapshot, UpdateNetworkData, ADMIN_ROLE,
};
pub use permission::{Permission, PermissionSnapshot};
pub use role::{Role, RoleSnapshot};
