//! Batter hit-prediction feature pipeline
//!
//! Builds a point-in-time-correct feature table for predicting a batter's
//! hit count in an upcoming game, from game-log and pitch-level history.

pub mod data;
pub mod features;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::features::window::Window;

/// Unique identifier for a batter (Baseball-Reference style id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatterId(pub String);

impl fmt::Display for BatterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a pitcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PitcherId(pub String);

impl fmt::Display for PitcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team abbreviation, canonicalized to the pitch-data convention
///
/// Box-score sources and pitch-level sources disagree on several team
/// abbreviations (TBR vs TB, SDP vs SD, ...). All abbreviations are mapped
/// to one convention at construction so lookups across the two sources
/// line up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamAbbr(String);

impl TeamAbbr {
    pub fn new(raw: &str) -> Self {
        let canonical = match raw.trim().to_uppercase().as_str() {
            "TBR" => "TB",
            "SDP" => "SD",
            "KCR" => "KC",
            "WSN" => "WSH",
            "ARI" => "AZ",
            "CHW" => "CWS",
            "SFG" => "SF",
            other => return TeamAbbr(other.to_string()),
        };
        TeamAbbr(canonical.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamAbbr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pitcher throwing hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn code(&self) -> &'static str {
        match self {
            Handedness::Left => "L",
            Handedness::Right => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "L" => Some(Handedness::Left),
            "R" => Some(Handedness::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One line of a batter's box score for one game
///
/// Immutable after ingestion; the same row participates, unchanged, in the
/// window computations of many later target dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAppearance {
    pub batter: BatterId,
    pub date: NaiveDate,
    pub opponent: TeamAbbr,
    pub hits: u32,
    pub plate_appearances: u32,
    /// Throwing hand of the opposing starting pitcher, when resolvable
    pub starter_hand: Option<Handedness>,
}

/// One row of pitch-level data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PitchEvent {
    pub pitcher: PitcherId,
    pub date: NaiveDate,
    pub inning: u32,
    /// Outcome event name (`single`, `field_out`, ...); `None` for a
    /// no-result pitch
    pub outcome: Option<String>,
    /// Team the pitcher was pitching for
    pub team: TeamAbbr,
    pub pitcher_hand: Option<Handedness>,
    /// Earliest inning this pitcher worked on this date; identical for all
    /// events sharing a (pitcher, date) pair. `None` until assigned, or
    /// when the appearance has no resolvable inning.
    pub inning_start: Option<u32>,
}

impl PitchEvent {
    /// Whether the outcome is one of the four hit types
    pub fn is_hit(&self) -> bool {
        self.outcome.as_deref().map_or(false, is_hit_outcome)
    }

    /// Whether the pitch decided a plate appearance
    pub fn is_decided(&self) -> bool {
        self.outcome.is_some()
    }
}

/// One batter plate appearance with a decided outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateAppearance {
    pub batter: BatterId,
    pub date: NaiveDate,
    pub pitcher_hand: Handedness,
    /// True iff the outcome was single, double, triple, or home run
    pub hit: bool,
}

/// Outcome names that count as hits
pub fn is_hit_outcome(outcome: &str) -> bool {
    matches!(outcome, "single" | "double" | "triple" | "home_run")
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Required column missing from {table}: {column}")]
    MissingColumn { table: String, column: String },

    #[error("No game log history for batter: {0}")]
    UnknownBatter(BatterId),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub study: StudyConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyConfig {
    /// Season year used to repair year-less box-score dates
    pub season: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// How many tracked batters to build rows for (0 = all ingested)
    pub batters_tracked: usize,
    /// Lookback windows shared by every feature category
    pub windows: Vec<Window>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub output_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            study: StudyConfig {
                season: 2023,
                start_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
                batters_tracked: 15,
                windows: vec![
                    Window::Games(1),
                    Window::Games(3),
                    Window::Games(7),
                    Window::All,
                ],
            },
            data: DataConfig {
                database_path: "data/dugout.db".to_string(),
                output_path: "data/player_game_stats.csv".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_abbr_canonicalization() {
        assert_eq!(TeamAbbr::new("TBR"), TeamAbbr::new("TB"));
        assert_eq!(TeamAbbr::new("SFG").as_str(), "SF");
        assert_eq!(TeamAbbr::new("nyy").as_str(), "NYY");
    }

    #[test]
    fn test_handedness_codes() {
        assert_eq!(Handedness::from_code("L"), Some(Handedness::Left));
        assert_eq!(Handedness::from_code("r"), Some(Handedness::Right));
        assert_eq!(Handedness::from_code("S"), None);
        assert_eq!(Handedness::Left.code(), "L");
    }

    #[test]
    fn test_hit_outcomes() {
        assert!(is_hit_outcome("single"));
        assert!(is_hit_outcome("home_run"));
        assert!(!is_hit_outcome("field_out"));
        assert!(!is_hit_outcome("walk"));
    }

    #[test]
    fn test_default_config_windows() {
        let config = Config::default();
        assert_eq!(config.study.windows.len(), 4);
        assert_eq!(config.study.windows[3], Window::All);
    }
}
