use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::models::{Profile, ProfileUpdate};
use crate::stats::StatsError;
use crate::store::RecordStore;

/// Profile reads and field-by-field edits
pub struct ProfileService {
    store: Arc<dyn RecordStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn get_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Profile, StatsError> {
        self.store
            .get_profile(community_id, player_id)
            .await?
            .ok_or_else(|| StatsError::NotFound(format!("No profile for player {}", player_id)))
    }

    /// Returns the stored profile, creating the default one on first access
    #[instrument(skip(self))]
    pub async fn get_or_create_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Profile, StatsError> {
        if let Some(profile) = self.store.get_profile(community_id, player_id).await? {
            return Ok(profile);
        }

        let profile = Profile::new_default(community_id, player_id);
        self.store.put_profile(&profile).await?;
        info!(community_id, player_id, "Default profile created");
        Ok(profile)
    }

    /// Creates the default profile if none exists. Returns true if one was created.
    #[instrument(skip(self))]
    pub async fn ensure_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<bool, StatsError> {
        if self
            .store
            .get_profile(community_id, player_id)
            .await?
            .is_some()
        {
            return Ok(false);
        }
        self.store
            .put_profile(&Profile::new_default(community_id, player_id))
            .await?;
        Ok(true)
    }

    /// Applies the provided fields to the profile, creating it first if needed.
    /// Nothing is written when validation fails.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        community_id: &str,
        player_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, StatsError> {
        let mut profile = self.get_or_create_profile(community_id, player_id).await?;
        if update.is_empty() {
            debug!("Empty profile update, nothing to write");
            return Ok(profile);
        }

        update.apply_to(&mut profile)?;
        self.store.put_profile(&profile).await?;

        info!(community_id, player_id, "Profile updated");
        Ok(profile)
    }
}
