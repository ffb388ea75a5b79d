//! Common test utilities for integration tests
//!
//! Provides fixtures and an in-memory `NetworkRepository` that stores
//! snapshots, so every read goes through `Network::restore`.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use network_workspaces::domain::models::{Network, NetworkId, NetworkSnapshot, Permission, UpdateNetworkData, UserId};
use network_workspaces::domain::NetworkRepository;
use network_workspaces::shared::errors::RepositoryError;

pub fn user(id: &str) -> UserId {
    UserId::from(id)
}

pub fn permission(action: &str, resource: &str) -> Permission {
    Permission::new(action, resource).expect("valid permission")
}

/// Network "Ward A" administered by `u1`
pub fn ward_a() -> Network {
    Network::new(NetworkId::new(), "Ward A", user("u1")).expect("valid network")
}

/// In-memory repository keeping one snapshot per network
#[derive(Default)]
pub struct InMemoryNetworkRepository {
    networks: Mutex<BTreeMap<NetworkId, NetworkSnapshot>>,
}

impl InMemoryNetworkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<NetworkId, NetworkSnapshot>>, RepositoryError> {
        self.networks
            .lock()
            .map_err(|e| RepositoryError::Storage(format!("poisoned lock: {e}")))
    }
}

#[async_trait]
impl NetworkRepository for InMemoryNetworkRepository {
    async fn create(&self, network: &Network) -> Result<Network, RepositoryError> {
        let mut networks = self.lock()?;
        if networks.contains_key(network.id()) {
            return Err(RepositoryError::Conflict(format!("network {} already exists", network.id())));
        }
        networks.insert(network.id().clone(), network.snapshot());
        Ok(network.clone())
    }

    async fn find_by_id(&self, id: &NetworkId) -> Result<Option<Network>, RepositoryError> {
        let networks = self.lock()?;
        networks
            .get(id)
            .cloned()
            .map(|snapshot| Network::restore(snapshot).map_err(RepositoryError::from))
            .transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Network>, RepositoryError> {
        let networks = self.lock()?;
        networks
            .values()
            .find(|snapshot| snapshot.name == name)
            .cloned()
            .map(|snapshot| Network::restore(snapshot).map_err(RepositoryError::from))
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Network>, RepositoryError> {
        let networks = self.lock()?;
        let mut all = networks
            .values()
            .cloned()
            .map(|snapshot| Network::restore(snapshot).map_err(RepositoryError::from))
            .collect::<Result<Vec<_>, _>>()?;
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    async fn update(&self, id: &NetworkId, data: UpdateNetworkData) -> Result<Option<Network>, RepositoryError> {
        let mut networks = self.lock()?;
        let Some(snapshot) = networks.get(id).cloned() else {
            return Ok(None);
        };

        let updated = Network::restore(snapshot)?.with_updates(data)?;
        networks.insert(id.clone(), updated.snapshot());
        Ok(Some(updated))
    }

    async fn delete(&self, id: &NetworkId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.remove(id).is_some())
    }
}
