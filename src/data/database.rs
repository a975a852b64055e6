//! SQLite storage for cleaned history tables

use crate::{
    BatterId, GameAppearance, Handedness, PitchEvent, PitcherId, PlateAppearance, Result,
    TeamAbbr,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS game_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batter TEXT NOT NULL,
                date TEXT NOT NULL,
                opponent TEXT NOT NULL,
                hits INTEGER NOT NULL,
                plate_appearances INTEGER NOT NULL,
                starter_hand TEXT
            );

            CREATE TABLE IF NOT EXISTS pitch_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pitcher TEXT NOT NULL,
                date TEXT NOT NULL,
                inning INTEGER NOT NULL,
                outcome TEXT,
                team TEXT NOT NULL,
                pitcher_hand TEXT,
                inning_start INTEGER
            );

            CREATE TABLE IF NOT EXISTS plate_appearances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                batter TEXT NOT NULL,
                date TEXT NOT NULL,
                pitcher_hand TEXT NOT NULL,
                hit INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_game_logs_batter ON game_logs(batter, date);
            CREATE INDEX IF NOT EXISTS idx_pitch_events_team ON pitch_events(team, date);
            CREATE INDEX IF NOT EXISTS idx_plate_appearances_batter
                ON plate_appearances(batter, date);
            "#,
        )?;
        Ok(())
    }

    // ==================== Game Logs ====================

    pub fn insert_game_logs(&mut self, games: &[GameAppearance]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO game_logs
                 (batter, date, opponent, hits, plate_appearances, starter_hand)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for game in games {
                stmt.execute(params![
                    game.batter.0,
                    game.date.format("%Y-%m-%d").to_string(),
                    game.opponent.as_str(),
                    game.hits,
                    game.plate_appearances,
                    game.starter_hand.map(|h| h.code()),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_game_logs(&self) -> Result<Vec<GameAppearance>> {
        let mut stmt = self.conn.prepare(
            "SELECT batter, date, opponent, hits, plate_appearances, starter_hand
             FROM game_logs ORDER BY batter, date",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(1)?;
            let opponent: String = row.get(2)?;
            let hand: Option<String> = row.get(5)?;
            Ok(GameAppearance {
                batter: BatterId(row.get(0)?),
                date: parse_stored_date(&date)?,
                opponent: TeamAbbr::new(&opponent),
                hits: row.get(3)?,
                plate_appearances: row.get(4)?,
                starter_hand: hand.as_deref().and_then(Handedness::from_code),
            })
        })?;
        collect_rows(rows)
    }

    // ==================== Pitch Events ====================

    pub fn insert_pitch_events(&mut self, events: &[PitchEvent]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO pitch_events
                 (pitcher, date, inning, outcome, team, pitcher_hand, inning_start)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for event in events {
                stmt.execute(params![
                    event.pitcher.0,
                    event.date.format("%Y-%m-%d").to_string(),
                    event.inning,
                    event.outcome,
                    event.team.as_str(),
                    event.pitcher_hand.map(|h| h.code()),
                    event.inning_start,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_pitch_events(&self) -> Result<Vec<PitchEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT pitcher, date, inning, outcome, team, pitcher_hand, inning_start
             FROM pitch_events ORDER BY team, date",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(1)?;
            let team: String = row.get(4)?;
            let hand: Option<String> = row.get(5)?;
            Ok(PitchEvent {
                pitcher: PitcherId(row.get(0)?),
                date: parse_stored_date(&date)?,
                inning: row.get(2)?,
                outcome: row.get(3)?,
                team: TeamAbbr::new(&team),
                pitcher_hand: hand.as_deref().and_then(Handedness::from_code),
                inning_start: row.get(6)?,
            })
        })?;
        collect_rows(rows)
    }

    // ==================== Plate Appearances ====================

    pub fn insert_plate_appearances(&mut self, pas: &[PlateAppearance]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO plate_appearances (batter, date, pitcher_hand, hit)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for pa in pas {
                stmt.execute(params![
                    pa.batter.0,
                    pa.date.format("%Y-%m-%d").to_string(),
                    pa.pitcher_hand.code(),
                    pa.hit,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_plate_appearances(&self) -> Result<Vec<PlateAppearance>> {
        let mut stmt = self.conn.prepare(
            "SELECT batter, date, pitcher_hand, hit
             FROM plate_appearances ORDER BY batter, date",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: String = row.get(1)?;
            let hand: String = row.get(2)?;
            Ok(PlateAppearance {
                batter: BatterId(row.get(0)?),
                date: parse_stored_date(&date)?,
                pitcher_hand: Handedness::from_code(&hand).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        format!("invalid handedness: {}", hand).into(),
                    )
                })?,
                hit: row.get(3)?,
            })
        })?;
        collect_rows(rows)
    }

    // ==================== Status ====================

    /// Row counts per table
    pub fn status(&self) -> Result<DatabaseStatus> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n as usize)
        };
        Ok(DatabaseStatus {
            game_logs: count("game_logs")?,
            pitch_events: count("pitch_events")?,
            plate_appearances: count("plate_appearances")?,
        })
    }

    /// Tracked batter ids in stable order
    pub fn batters(&self) -> Result<Vec<BatterId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT batter FROM game_logs ORDER BY batter")?;
        let rows = stmt.query_map([], |row| Ok(BatterId(row.get(0)?)))?;
        collect_rows(rows)
    }

    /// Clear all ingested tables (re-ingest support)
    pub fn clear(&self) -> Result<()> {
        self.conn.execute_batch(
            "DELETE FROM game_logs; DELETE FROM pitch_events; DELETE FROM plate_appearances;",
        )?;
        Ok(())
    }
}

/// Per-table row counts
#[derive(Debug, Clone, Copy)]
pub struct DatabaseStatus {
    pub game_logs: usize,
    pub pitch_events: usize,
    pub plate_appearances: usize,
}

// Dates are stored as ISO text by the insert paths.
fn parse_stored_date(text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = std::result::Result<T, rusqlite::Error>>,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
