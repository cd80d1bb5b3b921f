// Record store: the durable collaborator every service reads and writes through
mod memory;
mod postgres;

pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::profile::models::{LeftPlayerMarker, Profile};
use crate::stats::{GameId, StatKey, StatRecord};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Storage for stat records, profiles and left-player markers, partitioned by community
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_stat(&self, key: &StatKey) -> Result<Option<StatRecord>, StoreError>;

    /// Unconditional upsert. The stored copy gets a fresh revision.
    async fn put_stat(&self, record: &StatRecord) -> Result<(), StoreError>;

    /// Writes `record` only if the stored revision still equals `expected_revision`
    /// (`None` meaning "no record exists yet"). Returns the revision the store
    /// assigned, or `None` when another writer won.
    ///
    /// Revisions come from one store-wide sequence and are never handed out
    /// twice, so a record deleted and created again can not match a revision
    /// read before the delete.
    async fn try_put_stat(
        &self,
        record: &StatRecord,
        expected_revision: Option<u64>,
    ) -> Result<Option<u64>, StoreError>;

    async fn delete_stat(&self, key: &StatKey) -> Result<(), StoreError>;

    /// Records of a community, optionally narrowed to one game and/or one player,
    /// in a stable order (insertion order for the bundled stores)
    async fn list_stats(
        &self,
        community_id: &str,
        game: Option<GameId>,
        player_id: Option<&str>,
    ) -> Result<Vec<StatRecord>, StoreError>;

    async fn get_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<Profile>, StoreError>;

    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn delete_profile(&self, community_id: &str, player_id: &str) -> Result<(), StoreError>;

    async fn get_left_marker(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<LeftPlayerMarker>, StoreError>;

    /// Upsert: a player has at most one marker per community
    async fn put_left_marker(&self, marker: &LeftPlayerMarker) -> Result<(), StoreError>;

    async fn delete_left_marker(&self, community_id: &str, player_id: &str)
        -> Result<(), StoreError>;

    async fn list_left_markers(
        &self,
        community_id: &str,
    ) -> Result<Vec<LeftPlayerMarker>, StoreError>;
}
