use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use super::{RecordStore, StoreError};
use crate::profile::models::{EmbedColor, GameAttributes, LeftPlayerMarker, Profile, SocialPlatform};
use crate::stats::{Counter, GameId, StatKey, StatRecord};

const STAT_COLUMNS: &str = "server_id, user_id, game_name, tournaments_played, tournaments_won, \
     earnings, kills, deaths, wins, losses, kd, wl, revision";

const PROFILE_COLUMNS: &str = "server_id, user_id, gaming_bio, main_game, social_links, \
     embed_color, timezone, team_affiliation, bf6_favorite_class, r6s_role, r6s_favorite_operator";

const SCHEMA: &[&str] = &[
    "CREATE SEQUENCE IF NOT EXISTS game_stats_revision_seq",
    "CREATE TABLE IF NOT EXISTS game_stats (
        id BIGSERIAL PRIMARY KEY,
        server_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        game_name TEXT NOT NULL,
        tournaments_played BIGINT NOT NULL DEFAULT 0,
        tournaments_won BIGINT NOT NULL DEFAULT 0,
        earnings BIGINT NOT NULL DEFAULT 0,
        kills BIGINT NOT NULL DEFAULT 0,
        deaths BIGINT NOT NULL DEFAULT 0,
        wins BIGINT NOT NULL DEFAULT 0,
        losses BIGINT NOT NULL DEFAULT 0,
        kd DOUBLE PRECISION NOT NULL DEFAULT 0,
        wl DOUBLE PRECISION NOT NULL DEFAULT 0,
        revision BIGINT NOT NULL DEFAULT 0,
        UNIQUE (server_id, user_id, game_name)
    )",
    "CREATE TABLE IF NOT EXISTS user_profiles (
        server_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        gaming_bio TEXT NOT NULL DEFAULT '',
        main_game TEXT,
        social_links TEXT NOT NULL DEFAULT '{}',
        embed_color TEXT NOT NULL DEFAULT '0x00d4ff',
        timezone TEXT NOT NULL DEFAULT 'UTC',
        team_affiliation TEXT NOT NULL DEFAULT '',
        bf6_favorite_class TEXT NOT NULL DEFAULT '',
        r6s_role TEXT NOT NULL DEFAULT '',
        r6s_favorite_operator TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (server_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS player_left (
        id BIGSERIAL,
        server_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        left_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (server_id, user_id)
    )",
];

/// PostgreSQL implementation of the record store
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables this store reads and writes if they are missing
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    warn!(error = %e, "Database operation failed");
    StoreError::Unavailable(e.to_string())
}

fn to_db_int(counter: Counter, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{} value {} does not fit a BIGINT", counter, value)))
}

fn read_counter(row: &PgRow, counter: Counter) -> Result<(Counter, u64), StoreError> {
    let column: &str = counter.as_ref();
    let raw: i64 = row.try_get(column).map_err(unavailable)?;
    let value = u64::try_from(raw)
        .map_err(|_| StoreError::Corrupt(format!("negative {} value {}", counter, raw)))?;
    Ok((counter, value))
}

fn stat_from_row(row: &PgRow) -> Result<StatRecord, StoreError> {
    let game_name: String = row.try_get("game_name").map_err(unavailable)?;
    let game = GameId::from_str(&game_name)
        .map_err(|_| StoreError::Corrupt(format!("unknown game '{}'", game_name)))?;
    let key = StatKey::new(
        row.try_get::<String, _>("server_id").map_err(unavailable)?,
        row.try_get::<String, _>("user_id").map_err(unavailable)?,
        game,
    );

    let counters = [
        Counter::TournamentsPlayed,
        Counter::TournamentsWon,
        Counter::Earnings,
        Counter::Kills,
        Counter::Deaths,
        Counter::Wins,
        Counter::Losses,
    ]
    .into_iter()
    .map(|counter| read_counter(row, counter))
    .collect::<Result<Vec<_>, _>>()?;

    let revision = revision_from_row(row)?;

    Ok(StatRecord::from_counters(key, counters, revision))
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    let main_game: Option<String> = row.try_get("main_game").map_err(unavailable)?;
    let main_game = match main_game.as_deref() {
        None | Some("") => None,
        Some(code) => Some(
            GameId::from_str(code)
                .map_err(|_| StoreError::Corrupt(format!("unknown main game '{}'", code)))?,
        ),
    };

    let links: String = row.try_get("social_links").map_err(unavailable)?;
    let social_links: BTreeMap<SocialPlatform, String> = serde_json::from_str(&links)
        .map_err(|e| StoreError::Corrupt(format!("social links: {}", e)))?;

    let color: String = row.try_get("embed_color").map_err(unavailable)?;
    let embed_color = EmbedColor::from_str(&color)
        .map_err(|_| StoreError::Corrupt(format!("embed color '{}'", color)))?;

    Ok(Profile {
        community_id: row.try_get("server_id").map_err(unavailable)?,
        player_id: row.try_get("user_id").map_err(unavailable)?,
        bio: row.try_get("gaming_bio").map_err(unavailable)?,
        main_game,
        social_links,
        embed_color,
        timezone: row.try_get("timezone").map_err(unavailable)?,
        team_affiliation: row.try_get("team_affiliation").map_err(unavailable)?,
        game_attributes: GameAttributes {
            bf6_favorite_class: row.try_get("bf6_favorite_class").map_err(unavailable)?,
            r6s_role: row.try_get("r6s_role").map_err(unavailable)?,
            r6s_favorite_operator: row.try_get("r6s_favorite_operator").map_err(unavailable)?,
        },
    })
}

fn marker_from_row(row: &PgRow) -> Result<LeftPlayerMarker, StoreError> {
    Ok(LeftPlayerMarker {
        community_id: row.try_get("server_id").map_err(unavailable)?,
        player_id: row.try_get("user_id").map_err(unavailable)?,
        display_name: row.try_get("display_name").map_err(unavailable)?,
        left_at: row.try_get("left_at").map_err(unavailable)?,
    })
}

fn revision_from_row(row: &PgRow) -> Result<u64, StoreError> {
    let revision: i64 = row.try_get("revision").map_err(unavailable)?;
    u64::try_from(revision)
        .map_err(|_| StoreError::Corrupt(format!("negative revision {}", revision)))
}

/// Counter values in column order, ready to bind
fn stat_binds(record: &StatRecord) -> Result<[i64; 7], StoreError> {
    Ok([
        to_db_int(Counter::TournamentsPlayed, record.counter(Counter::TournamentsPlayed))?,
        to_db_int(Counter::TournamentsWon, record.counter(Counter::TournamentsWon))?,
        to_db_int(Counter::Earnings, record.counter(Counter::Earnings))?,
        to_db_int(Counter::Kills, record.counter(Counter::Kills))?,
        to_db_int(Counter::Deaths, record.counter(Counter::Deaths))?,
        to_db_int(Counter::Wins, record.counter(Counter::Wins))?,
        to_db_int(Counter::Losses, record.counter(Counter::Losses))?,
    ])
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self))]
    async fn get_stat(&self, key: &StatKey) -> Result<Option<StatRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM game_stats WHERE server_id = $1 AND user_id = $2 AND game_name = $3",
            STAT_COLUMNS
        ))
        .bind(&key.community_id)
        .bind(&key.player_id)
        .bind(key.game.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(stat_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(player_id = %record.player_id, game = %record.game))]
    async fn put_stat(&self, record: &StatRecord) -> Result<(), StoreError> {
        let [tp, tw, earnings, kills, deaths, wins, losses] = stat_binds(record)?;

        sqlx::query(
            "INSERT INTO game_stats (server_id, user_id, game_name, tournaments_played, tournaments_won, \
             earnings, kills, deaths, wins, losses, kd, wl, revision) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, nextval('game_stats_revision_seq')) \
             ON CONFLICT (server_id, user_id, game_name) DO UPDATE SET \
             tournaments_played = EXCLUDED.tournaments_played, tournaments_won = EXCLUDED.tournaments_won, \
             earnings = EXCLUDED.earnings, kills = EXCLUDED.kills, deaths = EXCLUDED.deaths, \
             wins = EXCLUDED.wins, losses = EXCLUDED.losses, kd = EXCLUDED.kd, wl = EXCLUDED.wl, \
             revision = EXCLUDED.revision",
        )
        .bind(&record.community_id)
        .bind(&record.player_id)
        .bind(record.game.code())
        .bind(tp)
        .bind(tw)
        .bind(earnings)
        .bind(kills)
        .bind(deaths)
        .bind(wins)
        .bind(losses)
        .bind(record.kd())
        .bind(record.wl())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!("Stat record upserted in database");
        Ok(())
    }

    #[instrument(skip(self, record), fields(player_id = %record.player_id, game = %record.game))]
    async fn try_put_stat(
        &self,
        record: &StatRecord,
        expected_revision: Option<u64>,
    ) -> Result<Option<u64>, StoreError> {
        let [tp, tw, earnings, kills, deaths, wins, losses] = stat_binds(record)?;

        let row = match expected_revision {
            None => {
                sqlx::query(
                    "INSERT INTO game_stats (server_id, user_id, game_name, tournaments_played, tournaments_won, \
                     earnings, kills, deaths, wins, losses, kd, wl, revision) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, nextval('game_stats_revision_seq')) \
                     ON CONFLICT (server_id, user_id, game_name) DO NOTHING \
                     RETURNING revision",
                )
                .bind(&record.community_id)
                .bind(&record.player_id)
                .bind(record.game.code())
                .bind(tp)
                .bind(tw)
                .bind(earnings)
                .bind(kills)
                .bind(deaths)
                .bind(wins)
                .bind(losses)
                .bind(record.kd())
                .bind(record.wl())
                .fetch_optional(&self.pool)
                .await
            }
            Some(expected) => {
                let expected = i64::try_from(expected)
                    .map_err(|_| StoreError::Corrupt(format!("revision {} too large", expected)))?;
                sqlx::query(
                    "UPDATE game_stats SET tournaments_played = $4, tournaments_won = $5, earnings = $6, \
                     kills = $7, deaths = $8, wins = $9, losses = $10, kd = $11, wl = $12, \
                     revision = nextval('game_stats_revision_seq') \
                     WHERE server_id = $1 AND user_id = $2 AND game_name = $3 AND revision = $13 \
                     RETURNING revision",
                )
                .bind(&record.community_id)
                .bind(&record.player_id)
                .bind(record.game.code())
                .bind(tp)
                .bind(tw)
                .bind(earnings)
                .bind(kills)
                .bind(deaths)
                .bind(wins)
                .bind(losses)
                .bind(record.kd())
                .bind(record.wl())
                .bind(expected)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(unavailable)?;

        match row {
            Some(row) => revision_from_row(&row).map(Some),
            None => {
                debug!(expected_revision = ?expected_revision, "Conditional stat write lost");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_stat(&self, key: &StatKey) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM game_stats WHERE server_id = $1 AND user_id = $2 AND game_name = $3",
        )
        .bind(&key.community_id)
        .bind(&key.player_id)
        .bind(key.game.code())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!(rows_affected = result.rows_affected(), "Stat record deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_stats(
        &self,
        community_id: &str,
        game: Option<GameId>,
        player_id: Option<&str>,
    ) -> Result<Vec<StatRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM game_stats WHERE server_id = $1 \
             AND ($2::TEXT IS NULL OR game_name = $2) \
             AND ($3::TEXT IS NULL OR user_id = $3) \
             ORDER BY id",
            STAT_COLUMNS
        ))
        .bind(community_id)
        .bind(game.map(|g| g.code()))
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        let records = rows.iter().map(stat_from_row).collect::<Result<Vec<_>, _>>()?;
        debug!(record_count = records.len(), "Listed stat records from database");
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn get_profile(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_profiles WHERE server_id = $1 AND user_id = $2",
            PROFILE_COLUMNS
        ))
        .bind(community_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(profile_from_row).transpose()
    }

    #[instrument(skip(self, profile), fields(player_id = %profile.player_id))]
    async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let social_links = serde_json::to_string(&profile.social_links)
            .map_err(|e| StoreError::Corrupt(format!("social links: {}", e)))?;

        sqlx::query(
            "INSERT INTO user_profiles (server_id, user_id, gaming_bio, main_game, social_links, \
             embed_color, timezone, team_affiliation, bf6_favorite_class, r6s_role, r6s_favorite_operator) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (server_id, user_id) DO UPDATE SET \
             gaming_bio = EXCLUDED.gaming_bio, main_game = EXCLUDED.main_game, \
             social_links = EXCLUDED.social_links, embed_color = EXCLUDED.embed_color, \
             timezone = EXCLUDED.timezone, team_affiliation = EXCLUDED.team_affiliation, \
             bf6_favorite_class = EXCLUDED.bf6_favorite_class, r6s_role = EXCLUDED.r6s_role, \
             r6s_favorite_operator = EXCLUDED.r6s_favorite_operator",
        )
        .bind(&profile.community_id)
        .bind(&profile.player_id)
        .bind(&profile.bio)
        .bind(profile.main_game.map(|g| g.code()))
        .bind(social_links)
        .bind(profile.embed_color.to_string())
        .bind(&profile.timezone)
        .bind(&profile.team_affiliation)
        .bind(&profile.game_attributes.bf6_favorite_class)
        .bind(&profile.game_attributes.r6s_role)
        .bind(&profile.game_attributes.r6s_favorite_operator)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!("Profile upserted in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_profile(&self, community_id: &str, player_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM user_profiles WHERE server_id = $1 AND user_id = $2")
            .bind(community_id)
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_left_marker(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<Option<LeftPlayerMarker>, StoreError> {
        let row = sqlx::query(
            "SELECT server_id, user_id, display_name, left_at FROM player_left \
             WHERE server_id = $1 AND user_id = $2",
        )
        .bind(community_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.as_ref().map(marker_from_row).transpose()
    }

    #[instrument(skip(self, marker), fields(player_id = %marker.player_id))]
    async fn put_left_marker(&self, marker: &LeftPlayerMarker) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO player_left (server_id, user_id, display_name, left_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (server_id, user_id) DO UPDATE SET \
             display_name = EXCLUDED.display_name, left_at = EXCLUDED.left_at",
        )
        .bind(&marker.community_id)
        .bind(&marker.player_id)
        .bind(&marker.display_name)
        .bind(marker.left_at)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_left_marker(
        &self,
        community_id: &str,
        player_id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM player_left WHERE server_id = $1 AND user_id = $2")
            .bind(community_id)
            .bind(player_id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_left_markers(
        &self,
        community_id: &str,
    ) -> Result<Vec<LeftPlayerMarker>, StoreError> {
        let rows = sqlx::query(
            "SELECT server_id, user_id, display_name, left_at FROM player_left \
             WHERE server_id = $1 ORDER BY id",
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.iter().map(marker_from_row).collect()
    }
}
