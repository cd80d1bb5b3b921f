use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{RecordStore, StoreError};
use crate::profile::models::{LeftPlayerMarker, Profile};
use crate::stats::{GameId, StatKey, StatRecord};

/// In-memory implementation of RecordStore for development and testing
///
/// Stat records and markers are kept in insertion order so listings are
/// stable between calls. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    stats: RwLock<Vec<StatRecord>>,
    profiles: RwLock<HashMap<(String, String), Profile>>,
    left_markers: RwLock<Vec<LeftPlayerMarker>>,
    /// Last revision handed out
    revisions: AtomicU64,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with stat records
    pub fn with_stats(records: Vec<StatRecord>) -> Self {
        let last_revision = records.iter().map(|r| r.revision).max().unwrap_or(0);
        Self {
            stats: RwLock::new(records),
            revisions: AtomicU64::new(last_revision),
            ..Self::default()
        }
    }

    fn next_revision(&self) -> u64 {
        self.revisions.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn stat_count(&self) -> usize {
        self.stats.read().await.len()
    }
}

fn matches_key(record: &StatRecord, key: &StatKey) -> bool {
    record.community_id == key.community_id
        && record.player_id == key.player_id
        && record.game == key.game
}

fn profile_key(community_id: &str, player_id: &str) -> (String, String) {
    (community_id.to_string(), player_id.to_string())
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    #[instrument(skip(self))]
    async fn get_stat(&self, key: &StatKey) -> Result<Option<StatRecord>, StoreError> {
        let stats = self.stats.read().await;
        Ok(stats.iter().find(|r| matches_key(r, key)).cloned())
    }

    #[instrument(skip(self, record), fields(player_id = %record.player_id, game = %record.game))]
    async fn put_stat(&self, record: &StatRecord) -> Result<(), StoreError> {
        let key = record.key();
        let mut stored = record.clone();
        let mut stats = self.stats.write().await;
        stored.revision = self.next_revision();
        match stats.iter_mut().find(|r| matches_key(r, &key)) {
            Some(existing) => *existing = stored,
            None => stats.push(stored),
        }
        debug!("Stat record stored in memory");
        Ok(())
    }

    #[instrument(skip(self, record), fields(player_id = %record.player_id, game = %record.game))]
    async fn try_put_stat(
        &self,
        record: &StatRecord,
        expected_revision: Option<u64>,
    ) -> Result<Option<u64>, StoreError> {
        let key = record.key();
        let mut stats = self.stats.write().await;
        let existing = stats.iter_mut().find(|r| matches_key(r, &key));

        match (existing, expected_revision) {
            (None, None) => {
                let mut stored = record.clone();
                stored.revision = self.next_revision();
                let revision = stored.revision;
                stats.push(stored);
                Ok(Some(revision))
            }
            (Some(current), Some(expected)) if current.revision == expected => {
                let mut stored = record.clone();
                stored.revision = self.next_revision();
                let revision = stored.revision;
                *current = stored;
                Ok(Some(revision))
            }
            (current, expected) => {
                debug!(
                    stored_revision = ?current.map(|r| r.revision),
                    expected_revision = ?expected,
                    "Conditional stat write lost"
                );
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_stat(&self, key: &StatKey) -> Result<(), StoreError> {
        let mut stats = self.stats.write().await;
        stats.retain(|r| !matches_key(r, key));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_stats(
        &self,
        community_id: &str,
        game: Option<GameId>,
        player_id: Option<&str>,
    ) -> Result<Vec<StatRecord>, StoreError> {
        let stats = self.stats.read().await;
        let records: Vec<StatRecord> = stats
            .iter()
            .filter(|r| r.community_id == community_id)
            .filter(|r| game.map_or(true, |g| r.game == g))
            .filter(|r| player_id.map_or(true, |p| r.player_id == p))
            .cloned()
            .collect();

        debug!(record_count = records.len(), "Listed stat records from memory");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&profile_key(community_id, player_id)).cloned())
    }

    #[instrument(skip(self, profile), fields(player_id = %profile.player_id))]
    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.insert(
            profile_key(&profile.community_id, &profile.player_id),
            profile.clone(),
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_profile(&self, community_id: &str, player_id: &str) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.remove(&profile_key(community_id, player_id));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_left_marker(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<LeftPlayerMarker>, StoreError> {
        let markers = self.left_markers.read().await;
        Ok(markers
            .iter()
            .find(|m| m.community_id == community_id && m.player_id == player_id)
            .cloned())
    }

    #[instrument(skip(self, marker), fields(player_id = %marker.player_id))]
    async fn put_left_marker(&self, marker: &LeftPlayerMarker) -> Result<(), StoreError> {
        let mut markers = self.left_markers.write().await;
        match markers
            .iter_mut()
            .find(|m| m.community_id == marker.community_id && m.player_id == marker.player_id)
        {
            Some(existing) => *existing = marker.clone(),
            None => markers.push(marker.clone()),
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_left_marker(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<(), StoreError> {
        let mut markers = self.left_markers.write().await;
        markers.retain(|m| !(m.community_id == community_id && m.player_id == player_id));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_left_markers(
        &self,
        community_id: &str,
    ) -> Result<Vec<LeftPlayerMarker>, StoreError> {
        let markers = self.left_markers.read().await;
        Ok(markers
            .iter()
            .filter(|m| m.community_id == community_id)
            .cloned()
            .collect())
    }
}
