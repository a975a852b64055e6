//! CSV ingestion of the raw input tables
//!
//! The raw tables come from external collaborators (box-score and
//! pitch-level fetchers) and carry their noise: repeated header rows with
//! non-numeric stats, doubleheader date markers, no-result pitches.
//! Cleaning happens here, once, before anything reaches the database.
//! Rows are dropped only when their identity (date, numeric stat line)
//! cannot be recovered; drop counts are logged. A missing required
//! column is a structural error and fails the whole load.

use crate::features::dates::DateNormalizer;
use crate::features::roles::{assign_starting_innings, starter_hands, starting_inning_from_entered};
use crate::{
    is_hit_outcome, BatterId, GameAppearance, Handedness, PipelineError, PitchEvent, PitcherId,
    PlateAppearance, Result, TeamAbbr,
};
use log::{info, warn};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawGameLog {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Opp")]
    opponent: String,
    #[serde(rename = "H")]
    hits: String,
    #[serde(rename = "PA")]
    plate_appearances: String,
}

#[derive(Debug, Deserialize)]
struct RawPitchEvent {
    #[serde(rename = "Pitcher")]
    pitcher: String,
    #[serde(rename = "game_date")]
    game_date: String,
    #[serde(rename = "inning")]
    inning: String,
    #[serde(rename = "events")]
    events: Option<String>,
    #[serde(rename = "Tm")]
    team: String,
    #[serde(rename = "p_throws")]
    p_throws: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPlateAppearance {
    #[serde(rename = "batter")]
    batter: String,
    #[serde(rename = "game_date")]
    game_date: String,
    #[serde(rename = "events")]
    events: Option<String>,
    #[serde(rename = "p_throws")]
    p_throws: Option<String>,
}

fn require_columns(
    reader: &mut csv::Reader<impl Read>,
    table: &str,
    required: &[&str],
) -> Result<()> {
    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(PipelineError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Read batter game logs, repairing dates and dropping header-junk rows
///
/// `season` disambiguates year-less box-score dates when a row carries no
/// usable Year column.
pub fn read_game_logs<R: Read>(reader: R, season: i32) -> Result<Vec<GameAppearance>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    require_columns(
        &mut csv_reader,
        "game_logs",
        &["Player", "Date", "Opp", "H", "PA"],
    )?;

    let normalizer = DateNormalizer::new();
    let mut games = Vec::new();
    let mut dropped = 0usize;

    for record in csv_reader.deserialize() {
        let raw: RawGameLog = record?;

        let year = raw
            .year
            .as_deref()
            .and_then(|y| y.trim().parse::<i32>().ok())
            .unwrap_or(season);
        let (date, hits, pas) = match (
            normalizer.normalize(&raw.date, year),
            raw.hits.trim().parse::<u32>(),
            raw.plate_appearances.trim().parse::<u32>(),
        ) {
            (Some(date), Ok(hits), Ok(pas)) => (date, hits, pas),
            _ => {
                dropped += 1;
                continue;
            }
        };

        games.push(GameAppearance {
            batter: BatterId(raw.player.trim().to_string()),
            date,
            opponent: TeamAbbr::new(&raw.opponent),
            hits,
            plate_appearances: pas,
            starter_hand: None,
        });
    }

    if dropped > 0 {
        warn!("game_logs: dropped {} unparseable rows", dropped);
    }
    info!("game_logs: ingested {} rows", games.len());
    Ok(games)
}

/// Read pitch events and assign per-appearance starting innings
///
/// No-result pitches (empty `events`) are kept; the aggregators skip
/// undecided outcomes. A row with an unparseable date or inning loses its
/// identity and is dropped.
pub fn read_pitch_events<R: Read>(reader: R, season: i32) -> Result<Vec<PitchEvent>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    require_columns(
        &mut csv_reader,
        "pitch_events",
        &["Pitcher", "game_date", "inning", "events", "Tm"],
    )?;

    let normalizer = DateNormalizer::new();
    let mut events = Vec::new();
    let mut dropped = 0usize;

    for record in csv_reader.deserialize() {
        let raw: RawPitchEvent = record?;

        // Innings arrive either as plain numbers (pitch-level data) or as
        // box-score "entered in inning N" ordinals
        let inning = raw
            .inning
            .trim()
            .parse::<u32>()
            .ok()
            .or_else(|| starting_inning_from_entered(&raw.inning));
        let (date, inning) = match (normalizer.normalize(&raw.game_date, season), inning) {
            (Some(date), Some(inning)) => (date, inning),
            _ => {
                dropped += 1;
                continue;
            }
        };

        events.push(PitchEvent {
            pitcher: PitcherId(raw.pitcher.trim().to_string()),
            date,
            inning,
            outcome: raw.events.filter(|e| !e.trim().is_empty()),
            team: TeamAbbr::new(&raw.team),
            pitcher_hand: raw.p_throws.as_deref().and_then(Handedness::from_code),
            inning_start: None,
        });
    }

    assign_starting_innings(&mut events);

    if dropped > 0 {
        warn!("pitch_events: dropped {} unparseable rows", dropped);
    }
    info!("pitch_events: ingested {} rows", events.len());
    Ok(events)
}

/// Read plate appearances, keeping only decided outcomes
///
/// The hit flag is derived here: true iff the outcome is one of the four
/// hit types. Rows with no outcome (no-result pitches) are excluded by
/// definition, not counted as drops.
pub fn read_plate_appearances<R: Read>(reader: R, season: i32) -> Result<Vec<PlateAppearance>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    require_columns(
        &mut csv_reader,
        "plate_appearances",
        &["batter", "game_date", "events", "p_throws"],
    )?;

    let normalizer = DateNormalizer::new();
    let mut pas = Vec::new();
    let mut dropped = 0usize;
    let mut undecided = 0usize;

    for record in csv_reader.deserialize() {
        let raw: RawPlateAppearance = record?;

        let outcome = match raw.events.filter(|e| !e.trim().is_empty()) {
            Some(outcome) => outcome,
            None => {
                undecided += 1;
                continue;
            }
        };
        let (date, hand) = match (
            normalizer.normalize(&raw.game_date, season),
            raw.p_throws.as_deref().and_then(Handedness::from_code),
        ) {
            (Some(date), Some(hand)) => (date, hand),
            _ => {
                dropped += 1;
                continue;
            }
        };

        pas.push(PlateAppearance {
            batter: BatterId(raw.batter.trim().to_string()),
            date,
            pitcher_hand: hand,
            hit: is_hit_outcome(outcome.trim()),
        });
    }

    if dropped > 0 {
        warn!("plate_appearances: dropped {} unparseable rows", dropped);
    }
    info!(
        "plate_appearances: ingested {} rows ({} no-result pitches excluded)",
        pas.len(),
        undecided
    );
    Ok(pas)
}

/// Attach the opposing starter's throwing hand to each game log row
///
/// The starter for (team, date) is the pitcher with the lowest starting
/// inning in that team's pitch events. Games whose opponent has no
/// resolvable starter keep `None`; the PA-rate feature goes null for
/// them instead of the row being dropped.
pub fn enrich_starter_hands(games: &mut [GameAppearance], events: &[PitchEvent]) {
    let hands = starter_hands(events);
    let mut unresolved = 0usize;

    for game in games.iter_mut() {
        game.starter_hand = hands.get(&(game.opponent.clone(), game.date)).copied();
        if game.starter_hand.is_none() {
            unresolved += 1;
        }
    }

    if unresolved > 0 {
        info!(
            "game_logs: {} rows with unresolved opposing starter hand",
            unresolved
        );
    }
}

// Path-based wrappers

pub fn load_game_logs<P: AsRef<Path>>(path: P, season: i32) -> Result<Vec<GameAppearance>> {
    read_game_logs(std::fs::File::open(path)?, season)
}

pub fn load_pitch_events<P: AsRef<Path>>(path: P, season: i32) -> Result<Vec<PitchEvent>> {
    read_pitch_events(std::fs::File::open(path)?, season)
}

pub fn load_plate_appearances<P: AsRef<Path>>(
    path: P,
    season: i32,
) -> Result<Vec<PlateAppearance>> {
    read_plate_appearances(std::fs::File::open(path)?, season)
}
