//! Gateway Traits (Ports)
//!
//! Abstract interfaces defining contracts for external dependencies.
//! Implementations live outside the domain core.

pub mod network_repository;

pub use network_repository::NetworkRepository;
