//! NBA box-score ingestion pipeline
//!
//! Fetches team, player and game data from the public stats API, derives
//! advanced metrics and daily-fantasy scores, and stores everything in SQLite.

pub mod data;
pub mod ingest;
pub mod pipeline;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unique identifier for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Unique identifier for a game, ordered by schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// Player position, collapsed to the two-letter storage vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
    Unlisted,
}

impl Position {
    pub fn code(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
            Position::Unlisted => "N",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            "N" => Some(Position::Unlisted),
            _ => None,
        }
    }

    /// Collapse the API's verbose granular position string.
    ///
    /// Multi-word strings reduce to their leading position name
    /// ("Power Forward Center" becomes "Power Forward", a doubled word
    /// collapses to one). Anything outside the known vocabulary is a
    /// data-integrity failure.
    pub fn from_granular(raw: &str) -> Result<Self> {
        let words: Vec<&str> = raw.split_whitespace().collect();
        let collapsed = match words.len() {
            0 => "None".to_string(),
            1 => words[0].to_string(),
            2 | 3 if words[0] == words[1] => words[0].to_string(),
            _ => format!("{} {}", words[0], words[1]),
        };

        match collapsed.as_str() {
            "Point Guard" => Ok(Position::PointGuard),
            "Shooting Guard" => Ok(Position::ShootingGuard),
            "Small Forward" => Ok(Position::SmallForward),
            "Power Forward" => Ok(Position::PowerForward),
            "Center" => Ok(Position::Center),
            "None" => Ok(Position::Unlisted),
            _ => Err(HoopsError::DataIntegrity(format!(
                "unrecognized position string '{}'",
                raw
            ))),
        }
    }
}

/// An NBA franchise
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Three-letter abbreviation, e.g. "BOS"
    pub abbreviation: String,
}

/// A player as listed in the league directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub position: Position,
    /// Age at ingestion time
    pub age: i64,
}

/// A scheduled or completed game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub date: chrono::NaiveDate,
    /// Season identifier, e.g. "2025-26"
    pub season: String,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl HoopsError {
    /// Whether the failure is a connectivity problem worth retrying.
    /// Status-code failures (a response we did receive) are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, HoopsError::Http(e) if !e.is_status())
    }
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub api: ApiConfig,
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the stats endpoints
    pub stats_base_url: String,
    /// Base URL for the JSONP player-card endpoint
    pub content_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// League identifier ("00" is the NBA)
    pub league: String,
    pub season: String,
}

/// The two daily-fantasy scoring tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub fanduel: ScoringWeights,
    pub draftkings: ScoringWeights,
}

/// Per-stat weights for one scoring format. Stats a format does not score
/// default to zero, so a partial table is valid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub reb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
    pub fg3m: f64,
    pub dd: f64,
    pub td: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/hoops.db".to_string(),
            },
            api: ApiConfig {
                stats_base_url: "https://stats.nba.com/stats".to_string(),
                content_base_url: "https://data.nba.com/jsonp/5s/json/cms/noseason/players"
                    .to_string(),
                timeout_secs: 30,
            },
            pipeline: PipelineConfig {
                league: "00".to_string(),
                season: "2025-26".to_string(),
            },
            scoring: ScoringConfig {
                fanduel: ScoringWeights {
                    reb: 1.2,
                    ast: 1.5,
                    stl: 2.0,
                    blk: 2.0,
                    tov: -1.0,
                    ..ScoringWeights::default()
                },
                draftkings: ScoringWeights {
                    reb: 1.25,
                    ast: 1.5,
                    stl: 2.0,
                    blk: 2.0,
                    tov: -0.5,
                    fg3m: 0.5,
                    dd: 1.5,
                    td: 3.0,
                },
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_codes_round_trip() {
        for pos in [
            Position::PointGuard,
            Position::ShootingGuard,
            Position::SmallForward,
            Position::PowerForward,
            Position::Center,
            Position::Unlisted,
        ] {
            assert_eq!(Position::from_code(pos.code()), Some(pos));
        }
        assert_eq!(Position::from_code("XX"), None);
    }

    #[test]
    fn test_position_from_granular() {
        assert_eq!(
            Position::from_granular("Point Guard").unwrap(),
            Position::PointGuard
        );
        assert_eq!(
            Position::from_granular("Small Forward").unwrap(),
            Position::SmallForward
        );
        assert_eq!(Position::from_granular("Center").unwrap(), Position::Center);
        assert_eq!(Position::from_granular("").unwrap(), Position::Unlisted);
    }

    #[test]
    fn test_position_collapses_multi_word_strings() {
        // Leading position name wins for compound listings
        assert_eq!(
            Position::from_granular("Power Forward Center").unwrap(),
            Position::PowerForward
        );
        assert_eq!(
            Position::from_granular("Point Guard Shooting Guard").unwrap(),
            Position::PointGuard
        );
        // A doubled word collapses to one
        assert_eq!(
            Position::from_granular("Center Center").unwrap(),
            Position::Center
        );
    }

    #[test]
    fn test_position_rejects_unknown_strings() {
        assert!(Position::from_granular("Sweeper").is_err());
        assert!(Position::from_granular("Guard Forward").is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.scoring.fanduel.reb, 1.2);
        assert_eq!(parsed.scoring.draftkings.td, 3.0);
        assert_eq!(parsed.pipeline.league, "00");
    }

    #[test]
    fn test_partial_scoring_table_defaults_to_zero() {
        let weights: ScoringWeights = toml::from_str("reb = 1.5\nast = 2.0").unwrap();
        assert_eq!(weights.reb, 1.5);
        assert_eq!(weights.dd, 0.0);
        assert_eq!(weights.fg3m, 0.0);
    }
}
