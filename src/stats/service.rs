use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{GameId, StatDelta, StatKey, StatRecord, StatsError};
use crate::store::RecordStore;

/// Upper bound on optimistic write attempts for one key. Every lost attempt
/// means a competing write succeeded, so this only needs to exceed the number
/// of writers expected to race on a single player/game pair.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: usize = 32;

/// Stat aggregator: the only place stat records are mutated
pub struct StatsService {
    store: Arc<dyn RecordStore>,
    max_write_attempts: usize,
}

impl StatsService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    pub fn with_max_write_attempts(mut self, attempts: usize) -> Self {
        self.max_write_attempts = attempts.max(1);
        self
    }

    /// Adds `delta` to the player's record for `game`, creating the record if needed
    #[instrument(skip(self, delta))]
    pub async fn apply_stat_delta(
        &self,
        community_id: &str,
        player_id: &str,
        game: GameId,
        delta: &StatDelta,
    ) -> Result<StatRecord, StatsError> {
        let key = StatKey::new(community_id, player_id, game);
        let (record, _) = self
            .update_record(&key, |current| {
                let mut next = current
                    .cloned()
                    .unwrap_or_else(|| StatRecord::zeroed(key.clone()));
                next.apply(delta)?;
                Ok(Some(next))
            })
            .await?;

        info!(
            community_id,
            player_id,
            game = %game,
            revision = record.revision,
            "Stat delta applied"
        );
        Ok(record)
    }

    /// Zeroes the player's counters for one game, or for every tracked game.
    /// Records that are already zero are not rewritten.
    #[instrument(skip(self))]
    pub async fn reset_stats(
        &self,
        community_id: &str,
        player_id: &str,
        game: Option<GameId>,
    ) -> Result<Vec<StatRecord>, StatsError> {
        let games = match game {
            Some(game) => vec![game],
            None => GameId::all(),
        };

        let mut records = Vec::with_capacity(games.len());
        for game in games {
            let key = StatKey::new(community_id, player_id, game);
            let (record, written) = self
                .update_record(&key, |current| match current {
                    Some(existing) if existing.is_zeroed() => Ok(None),
                    Some(existing) => {
                        let mut next = existing.clone();
                        next.reset();
                        Ok(Some(next))
                    }
                    None => Ok(Some(StatRecord::zeroed(key.clone()))),
                })
                .await?;
            debug!(game = %game, written, "Stats reset");
            records.push(record);
        }

        info!(community_id, player_id, games = records.len(), "Stats reset to zero");
        Ok(records)
    }

    /// Creates a zeroed record if none exists. Returns true if one was created.
    #[instrument(skip(self))]
    pub async fn ensure_record(&self, key: &StatKey) -> Result<bool, StatsError> {
        let (_, created) = self
            .update_record(key, |current| match current {
                Some(_) => Ok(None),
                None => Ok(Some(StatRecord::zeroed(key.clone()))),
            })
            .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_stat(
        &self,
        community_id: &str,
        player_id: &str,
        game: GameId,
    ) -> Result<StatRecord, StatsError> {
        let key = StatKey::new(community_id, player_id, game);
        self.store.get_stat(&key).await?.ok_or_else(|| {
            StatsError::NotFound(format!("No {} stats for player {}", game, player_id))
        })
    }

    /// All of a player's records, or the one for `game`
    #[instrument(skip(self))]
    pub async fn get_stats(
        &self,
        community_id: &str,
        player_id: &str,
        game: Option<GameId>,
    ) -> Result<Vec<StatRecord>, StatsError> {
        Ok(self
            .store
            .list_stats(community_id, game, Some(player_id))
            .await?)
    }

    /// Read-compute-conditional-write loop. `compute` returns the record to
    /// store, or None when the current record needs no change. Returns the
    /// resulting record and whether a write happened.
    async fn update_record<F>(
        &self,
        key: &StatKey,
        mut compute: F,
    ) -> Result<(StatRecord, bool), StatsError>
    where
        F: FnMut(Option<&StatRecord>) -> Result<Option<StatRecord>, StatsError>,
    {
        for attempt in 1..=self.max_write_attempts {
            let current = self.store.get_stat(key).await?;
            let expected_revision = current.as_ref().map(|r| r.revision);

            let Some(mut next) = compute(current.as_ref())? else {
                let current = current.ok_or_else(|| {
                    StatsError::InconsistentState(format!(
                        "No record to keep for player {} in {}",
                        key.player_id, key.game
                    ))
                })?;
                return Ok((current, false));
            };

            if let Some(revision) = self.store.try_put_stat(&next, expected_revision).await? {
                next.revision = revision;
                return Ok((next, true));
            }

            debug!(attempt, player_id = %key.player_id, game = %key.game, "Stat write conflicted, retrying");
        }

        warn!(
            player_id = %key.player_id,
            game = %key.game,
            attempts = self.max_write_attempts,
            "Gave up on contended stat write"
        );
        Err(StatsError::StoreUnavailable(format!(
            "Too much contention writing {} stats for player {}",
            key.game, key.player_id
        )))
    }
}
