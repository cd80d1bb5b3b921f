use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::StatsError;

/// Largest value a counter may hold (counters are stored as signed 64-bit columns)
pub const MAX_COUNTER_VALUE: u64 = i64::MAX as u64;

/// Games tracked per community. The first variant is the default main game.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum GameId {
    #[serde(rename = "r6s")]
    #[strum(serialize = "r6s")]
    R6s,
    #[serde(rename = "bf6")]
    #[strum(serialize = "bf6")]
    Bf6,
}

impl GameId {
    /// The game new profiles default to
    pub const FIRST: GameId = GameId::R6s;

    pub fn all() -> Vec<GameId> {
        GameId::iter().collect()
    }

    /// Stable short code used in storage and URLs
    pub fn code(&self) -> &'static str {
        match self {
            GameId::R6s => "r6s",
            GameId::Bf6 => "bf6",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameId::R6s => "Rainbow Six Siege",
            GameId::Bf6 => "Battlefield 6",
        }
    }

    /// Parses a game code coming from a caller
    pub fn parse(code: &str) -> Result<Self, StatsError> {
        GameId::from_str(code)
            .map_err(|_| StatsError::InconsistentState(format!("Unsupported game '{}'", code)))
    }
}

/// Raw counters that can be merged. Derived ratios are not counters.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Counter {
    TournamentsPlayed,
    TournamentsWon,
    Earnings,
    Kills,
    Deaths,
    Wins,
    Losses,
}

/// Ranking keys: every counter plus the two derived ratios
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    TournamentsPlayed,
    TournamentsWon,
    Earnings,
    Kills,
    Deaths,
    Kd,
    Wins,
    Losses,
    Wl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortClass {
    HigherIsBetter,
    LowerIsBetter,
}

impl Metric {
    pub fn parse(name: &str) -> Result<Self, StatsError> {
        Metric::from_str(name)
            .map_err(|_| StatsError::InconsistentState(format!("Unsupported metric '{}'", name)))
    }

    pub fn sort_class(&self) -> SortClass {
        match self {
            Metric::Deaths | Metric::Losses => SortClass::LowerIsBetter,
            Metric::TournamentsPlayed
            | Metric::TournamentsWon
            | Metric::Earnings
            | Metric::Kills
            | Metric::Kd
            | Metric::Wins
            | Metric::Wl => SortClass::HigherIsBetter,
        }
    }

    /// The counter whose value decides whether a zero in a lower-is-better
    /// metric means "perfect" or "no data"
    pub fn paired_counter(&self) -> Option<Counter> {
        match self {
            Metric::Deaths => Some(Counter::Kills),
            Metric::Losses => Some(Counter::Wins),
            _ => None,
        }
    }

    pub fn value_of(&self, record: &StatRecord) -> StatValue {
        match self {
            Metric::TournamentsPlayed => StatValue::Count(record.tournaments_played),
            Metric::TournamentsWon => StatValue::Count(record.tournaments_won),
            Metric::Earnings => StatValue::Count(record.earnings),
            Metric::Kills => StatValue::Count(record.kills),
            Metric::Deaths => StatValue::Count(record.deaths),
            Metric::Wins => StatValue::Count(record.wins),
            Metric::Losses => StatValue::Count(record.losses),
            Metric::Kd => StatValue::Ratio(record.kd),
            Metric::Wl => StatValue::Ratio(record.wl),
        }
    }
}

/// A metric value read from a record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(u64),
    Ratio(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            StatValue::Count(value) => *value as f64,
            StatValue::Ratio(value) => *value,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            StatValue::Count(value) => *value == 0,
            StatValue::Ratio(value) => *value == 0.0,
        }
    }

    /// Total order over values of the same metric
    pub fn total_cmp(&self, other: &StatValue) -> Ordering {
        match (self, other) {
            (StatValue::Count(a), StatValue::Count(b)) => a.cmp(b),
            (StatValue::Ratio(a), StatValue::Ratio(b)) => a.total_cmp(b),
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }
}

/// Identity of a stat record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatKey {
    pub community_id: String,
    pub player_id: String,
    pub game: GameId,
}

impl StatKey {
    pub fn new(community_id: impl Into<String>, player_id: impl Into<String>, game: GameId) -> Self {
        Self {
            community_id: community_id.into(),
            player_id: player_id.into(),
            game,
        }
    }
}

/// Per-player, per-game counters with their derived ratios.
///
/// Counters are only reachable through methods so `kd`/`wl` can never drift
/// from the counters they are derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatRecord {
    pub community_id: String,
    pub player_id: String,
    pub game: GameId,
    tournaments_played: u64,
    tournaments_won: u64,
    earnings: u64,
    kills: u64,
    deaths: u64,
    wins: u64,
    losses: u64,
    kd: f64,
    wl: f64,
    /// Bumped on every write; used for conditional updates
    pub revision: u64,
}

impl StatRecord {
    pub fn zeroed(key: StatKey) -> Self {
        Self {
            community_id: key.community_id,
            player_id: key.player_id,
            game: key.game,
            tournaments_played: 0,
            tournaments_won: 0,
            earnings: 0,
            kills: 0,
            deaths: 0,
            wins: 0,
            losses: 0,
            kd: 0.0,
            wl: 0.0,
            revision: 0,
        }
    }

    /// Rebuilds a record from stored counters, recomputing the ratios
    pub fn from_counters(
        key: StatKey,
        counters: impl IntoIterator<Item = (Counter, u64)>,
        revision: u64,
    ) -> Self {
        let mut record = Self::zeroed(key);
        for (counter, value) in counters {
            *record.counter_mut(counter) = value;
        }
        record.revision = revision;
        record.recompute_ratios();
        record
    }

    pub fn key(&self) -> StatKey {
        StatKey::new(self.community_id.clone(), self.player_id.clone(), self.game)
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::TournamentsPlayed => self.tournaments_played,
            Counter::TournamentsWon => self.tournaments_won,
            Counter::Earnings => self.earnings,
            Counter::Kills => self.kills,
            Counter::Deaths => self.deaths,
            Counter::Wins => self.wins,
            Counter::Losses => self.losses,
        }
    }

    fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::TournamentsPlayed => &mut self.tournaments_played,
            Counter::TournamentsWon => &mut self.tournaments_won,
            Counter::Earnings => &mut self.earnings,
            Counter::Kills => &mut self.kills,
            Counter::Deaths => &mut self.deaths,
            Counter::Wins => &mut self.wins,
            Counter::Losses => &mut self.losses,
        }
    }

    pub fn counters(&self) -> impl Iterator<Item = (Counter, u64)> + '_ {
        Counter::iter().map(move |counter| (counter, self.counter(counter)))
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    pub fn wl(&self) -> f64 {
        self.wl
    }

    pub fn is_zeroed(&self) -> bool {
        self.counters().all(|(_, value)| value == 0)
    }

    /// Adds every delta to its counter. Fails without modifying the record
    /// if any counter would overflow.
    pub fn apply(&mut self, delta: &StatDelta) -> Result<(), StatsError> {
        let mut updated = Vec::with_capacity(delta.values.len());
        for (&counter, &amount) in &delta.values {
            let value = self
                .counter(counter)
                .checked_add(amount)
                .filter(|value| *value <= MAX_COUNTER_VALUE)
                .ok_or_else(|| {
                    StatsError::InvalidDelta(format!("'{}' would overflow", counter))
                })?;
            updated.push((counter, value));
        }

        for (counter, value) in updated {
            *self.counter_mut(counter) = value;
        }
        self.recompute_ratios();
        Ok(())
    }

    pub fn reset(&mut self) {
        for counter in Counter::iter() {
            *self.counter_mut(counter) = 0;
        }
        self.recompute_ratios();
    }

    fn recompute_ratios(&mut self) {
        self.kd = ratio(self.kills, self.deaths);
        self.wl = ratio(self.wins, self.losses);
    }
}

/// Division with a zero divisor defined as 0.0
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Validated, non-negative increments keyed by counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatDelta {
    values: BTreeMap<Counter, u64>,
}

impl StatDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `counter`. Fails instead of clamping when the total
    /// no longer fits a counter.
    pub fn with(mut self, counter: Counter, amount: u64) -> Result<Self, StatsError> {
        let entry = self.values.entry(counter).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .filter(|total| *total <= MAX_COUNTER_VALUE)
            .ok_or_else(|| StatsError::InvalidDelta(format!("'{}' would overflow", counter)))?;
        Ok(self)
    }

    /// Validates caller input. Unknown names, derived ratios and negative
    /// values are rejected rather than ignored or clamped.
    pub fn from_raw<I, K>(entries: I) -> Result<Self, StatsError>
    where
        I: IntoIterator<Item = (K, i64)>,
        K: AsRef<str>,
    {
        let mut values = BTreeMap::new();
        for (name, amount) in entries {
            let name = name.as_ref();
            let counter = Counter::from_str(name).map_err(|_| {
                if Metric::from_str(name).is_ok() {
                    StatsError::InvalidDelta(format!("'{}' is derived and cannot be set", name))
                } else {
                    StatsError::InvalidDelta(format!("Unknown counter '{}'", name))
                }
            })?;

            if amount < 0 {
                return Err(StatsError::InvalidDelta(format!(
                    "'{}' must not be negative (got {})",
                    name, amount
                )));
            }

            let entry: &mut u64 = values.entry(counter).or_insert(0);
            *entry = entry.checked_add(amount as u64).ok_or_else(|| {
                StatsError::InvalidDelta(format!("'{}' would overflow", name))
            })?;
        }
        Ok(Self { values })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Counter, u64)> + '_ {
        self.values.iter().map(|(counter, amount)| (*counter, *amount))
    }
}
