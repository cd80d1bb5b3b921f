use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::stats::{GameId, StatsError};

pub const MAX_BIO_LENGTH: usize = 200;
pub const MAX_TEAM_LENGTH: usize = 100;
pub const MAX_LINK_LENGTH: usize = 200;
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Timezones a profile may pick from
pub const SUPPORTED_TIMEZONES: &[&str] = &[
    "UTC",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Europe/Berlin",
    "Europe/London",
    "Australia/Sydney",
    "Asia/Tokyo",
];

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SocialPlatform {
    Twitch,
    Youtube,
    Twitter,
    Instagram,
    Tiktok,
}

/// 24-bit RGB color, written as `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmbedColor(u32);

impl EmbedColor {
    pub const DEFAULT: EmbedColor = EmbedColor(0x00d4ff);

    pub fn new(rgb: u32) -> Option<Self> {
        (rgb <= 0xffffff).then_some(Self(rgb))
    }
}

impl Default for EmbedColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for EmbedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}

impl FromStr for EmbedColor {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .or_else(|| trimmed.strip_prefix('#'))
            .unwrap_or(trimmed);

        u32::from_str_radix(hex, 16)
            .ok()
            .filter(|_| hex.len() == 6)
            .and_then(EmbedColor::new)
            .ok_or_else(|| StatsError::Validation(format!("Invalid embed color '{}'", s)))
    }
}

impl TryFrom<String> for EmbedColor {
    type Error = StatsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EmbedColor> for String {
    fn from(color: EmbedColor) -> Self {
        color.to_string()
    }
}

/// Game-specific cosmetic fields shown on a profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameAttributes {
    pub bf6_favorite_class: String,
    pub r6s_role: String,
    pub r6s_favorite_operator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub community_id: String,
    pub player_id: String,
    pub bio: String,
    pub main_game: Option<GameId>,
    pub social_links: BTreeMap<SocialPlatform, String>,
    pub embed_color: EmbedColor,
    pub timezone: String,
    pub team_affiliation: String,
    pub game_attributes: GameAttributes,
}

impl Profile {
    /// Profile handed to a member on first join or first access
    pub fn new_default(community_id: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            community_id: community_id.into(),
            player_id: player_id.into(),
            bio: String::new(),
            main_game: Some(GameId::FIRST),
            social_links: BTreeMap::new(),
            embed_color: EmbedColor::DEFAULT,
            timezone: DEFAULT_TIMEZONE.to_string(),
            team_affiliation: String::new(),
            game_attributes: GameAttributes::default(),
        }
    }
}

/// Partial profile edit; only the fields that are set are applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub main_game: Option<GameId>,
    /// Empty URLs remove the platform; platforms not listed are kept
    pub social_links: Option<BTreeMap<SocialPlatform, String>>,
    pub embed_color: Option<EmbedColor>,
    pub timezone: Option<String>,
    pub team_affiliation: Option<String>,
    pub bf6_favorite_class: Option<String>,
    pub r6s_role: Option<String>,
    pub r6s_favorite_operator: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }

    /// Validates every provided field, then applies them all. The profile is
    /// left unchanged if any field is rejected.
    pub fn apply_to(&self, profile: &mut Profile) -> Result<(), StatsError> {
        if let Some(bio) = &self.bio {
            check_length("bio", bio, MAX_BIO_LENGTH)?;
        }
        if let Some(team) = &self.team_affiliation {
            check_length("team_affiliation", team, MAX_TEAM_LENGTH)?;
        }
        if let Some(timezone) = &self.timezone {
            if !SUPPORTED_TIMEZONES.contains(&timezone.as_str()) {
                return Err(StatsError::Validation(format!(
                    "Unsupported timezone '{}'",
                    timezone
                )));
            }
        }
        if let Some(links) = &self.social_links {
            for (platform, url) in links {
                check_length(platform.as_ref(), url.trim(), MAX_LINK_LENGTH)?;
            }
        }

        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(game) = self.main_game {
            profile.main_game = Some(game);
        }
        if let Some(links) = &self.social_links {
            for (platform, url) in links {
                let url = url.trim();
                if url.is_empty() {
                    profile.social_links.remove(platform);
                } else {
                    profile.social_links.insert(*platform, url.to_string());
                }
            }
        }
        if let Some(color) = self.embed_color {
            profile.embed_color = color;
        }
        if let Some(timezone) = &self.timezone {
            profile.timezone = timezone.clone();
        }
        if let Some(team) = &self.team_affiliation {
            profile.team_affiliation = team.clone();
        }
        if let Some(class) = &self.bf6_favorite_class {
            profile.game_attributes.bf6_favorite_class = class.clone();
        }
        if let Some(role) = &self.r6s_role {
            profile.game_attributes.r6s_role = role.clone();
        }
        if let Some(operator) = &self.r6s_favorite_operator {
            profile.game_attributes.r6s_favorite_operator = operator.clone();
        }
        Ok(())
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), StatsError> {
    let length = value.chars().count();
    if length > max {
        return Err(StatsError::Validation(format!(
            "'{}' is {} characters, the limit is {}",
            field, length, max
        )));
    }
    Ok(())
}

/// Marks a member that left the community while their data is kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeftPlayerMarker {
    pub community_id: String,
    pub player_id: String,
    pub display_name: String,
    pub left_at: DateTime<Utc>,
}

impl LeftPlayerMarker {
    pub fn new(
        community_id: impl Into<String>,
        player_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            community_id: community_id.into(),
            player_id: player_id.into(),
            display_name: display_name.into(),
            left_at: Utc::now(),
        }
    }
}
