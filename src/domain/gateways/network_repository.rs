//! Network Repository Gateway
//!
//! Abstract trait defining the contract for network persistence operations.

use async_trait::async_trait;

use crate::domain::models::identifiers::NetworkId;
use crate::domain::models::network::{Network, UpdateNetworkData};
use crate::shared::errors::RepositoryError;

/// Repository trait for Network persistence operations
///
/// The aggregate never calls this itself; callers load a network, mutate it
/// and hand it back. Implementations are expected to serialize writers per
/// network, for instance by comparing `updated_at` on update.
#[async_trait]
pub trait NetworkRepository: Send + Sync {
    /// Persist a new network
    async fn create(&self, network: &Network) -> Result<Network, RepositoryError>;

    /// Find a network by its ID
    async fn find_by_id(&self, id: &NetworkId) -> Result<Option<Network>, RepositoryError>;

    /// Find a network by its exact name
    async fn find_by_name(&self, name: &str) -> Result<Option<Network>, RepositoryError>;

    /// Find all networks, sorted by name ascending
    async fn find_all(&self) -> Result<Vec<Network>, RepositoryError>;

    /// Apply a partial update to an existing network
    async fn update(
        &self,
        id: &NetworkId,
        data: UpdateNetworkData,
    ) -> Result<Option<Network>, RepositoryError>;

    /// Delete a network, returning whether it existed
    async fn delete(&self, id: &NetworkId) -> Result<bool, RepositoryError>;
}
