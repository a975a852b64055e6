//! Feature table construction and export
//!
//! Iterates the assembler over every tracked batter's games in the study
//! period, in (batter, date) order, and accumulates the final table. The
//! schema is fixed; consumers key on column order, so reordering or
//! renaming is a breaking change for the training scripts.

use crate::features::assembler::{FeatureAssembler, FeatureRow, HistoryContext};
use crate::features::window::Window;
use crate::{BatterId, PipelineError, Result};
use chrono::NaiveDate;
use log::{debug, info};
use std::io::Write;
use std::path::Path;

/// Build configuration for one study period
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Batters to build rows for; empty means every ingested batter
    pub batters: Vec<BatterId>,
    pub windows: Vec<Window>,
}

/// The complete feature table
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Null count per feature column, in column order
    ///
    /// Makes data sparsity visible to the modeling stage; sparsity alone
    /// never aborts a build.
    pub fn null_counts(&self) -> Vec<(String, usize)> {
        let feature_columns = &self.columns[3..self.columns.len() - 1];
        let mut counts = vec![0usize; feature_columns.len()];

        for row in &self.rows {
            for (i, value) in row.values().iter().enumerate() {
                if value.is_none() {
                    counts[i] += 1;
                }
            }
        }

        feature_columns.iter().cloned().zip(counts).collect()
    }

    /// Write the table as CSV; nulls become empty fields, floats are
    /// written unrounded
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;

        for row in &self.rows {
            let mut record: Vec<String> = Vec::with_capacity(self.columns.len());
            record.push(row.batter.to_string());
            record.push(row.date.format("%Y-%m-%d").to_string());
            record.push(row.opponent.to_string());
            for value in row.values() {
                record.push(value.map(|v| v.to_string()).unwrap_or_default());
            }
            record.push(row.hits.to_string());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.write_csv(std::fs::File::create(path)?)
    }
}

/// Canonical column list for a window spec
pub fn column_names(windows: &[Window]) -> Vec<String> {
    let mut columns = vec![
        "Player".to_string(),
        "Date".to_string(),
        "Opposing_Team".to_string(),
    ];
    for prefix in [
        "Hits_Per_Game",
        "Hits_Per_PA",
        "Starter_Hits_Per_Out",
        "Bullpen_Hits_Per_Out",
    ] {
        for window in windows {
            columns.push(format!("{}_{}", prefix, window));
        }
    }
    columns.push("Hits".to_string());
    columns
}

/// Builds the full feature table for a study period
pub struct FeatureTableBuilder {
    config: BuildConfig,
}

impl FeatureTableBuilder {
    pub fn new(config: BuildConfig) -> Self {
        FeatureTableBuilder { config }
    }

    /// Assemble rows for every tracked batter's games in the date range
    ///
    /// Rows come out in (batter, date) order. A tracked batter with no
    /// game log at all is a structural error; per-row null features are
    /// expected and never fail the build.
    pub fn build(&self, context: &HistoryContext) -> Result<FeatureTable> {
        let batters: Vec<BatterId> = if self.config.batters.is_empty() {
            context.batters().into_iter().cloned().collect()
        } else {
            self.config.batters.clone()
        };

        let assembler = FeatureAssembler::new(context, &self.config.windows);
        let mut rows = Vec::new();

        for batter in &batters {
            let games = context
                .games_for(batter)
                .ok_or_else(|| PipelineError::UnknownBatter(batter.clone()))?;

            let mut batter_rows = 0usize;
            for game in games {
                if game.date < self.config.start_date || game.date > self.config.end_date {
                    continue;
                }
                rows.push(assembler.assemble(game));
                batter_rows += 1;
            }
            debug!("{}: {} rows", batter, batter_rows);
        }

        let table = FeatureTable {
            columns: column_names(&self.config.windows),
            rows,
        };

        info!("Built feature table: {} rows", table.len());
        for (column, nulls) in table.null_counts() {
            if nulls > 0 {
                info!("  {}: {} null of {}", column, nulls, table.len());
            }
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameAppearance, Handedness, TeamAbbr};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn game(batter: &str, date: NaiveDate, hits: u32) -> GameAppearance {
        GameAppearance {
            batter: BatterId(batter.to_string()),
            date,
            opponent: TeamAbbr::new("BOS"),
            hits,
            plate_appearances: 4,
            starter_hand: Some(Handedness::Right),
        }
    }

    fn windows() -> Vec<Window> {
        vec![Window::Games(1), Window::Games(3), Window::Games(7), Window::All]
    }

    fn build_config(batters: Vec<BatterId>) -> BuildConfig {
        BuildConfig {
            start_date: d(4, 1),
            end_date: d(10, 1),
            batters,
            windows: windows(),
        }
    }

    fn simple_context() -> HistoryContext {
        let games = vec![
            game("aaronj01", d(4, 1), 2),
            game("aaronj01", d(4, 3), 0),
            game("aaronj01", d(4, 5), 1),
            game("bettsm01", d(4, 2), 3),
        ];
        HistoryContext::new(games, vec![], vec![])
    }

    #[test]
    fn test_column_names_fixed_order() {
        let columns = column_names(&windows());
        assert_eq!(columns.len(), 3 + 16 + 1);
        assert_eq!(columns[0], "Player");
        assert_eq!(columns[3], "Hits_Per_Game_1");
        assert_eq!(columns[6], "Hits_Per_Game_All");
        assert_eq!(columns[7], "Hits_Per_PA_1");
        assert_eq!(columns[11], "Starter_Hits_Per_Out_1");
        assert_eq!(columns[15], "Bullpen_Hits_Per_Out_1");
        assert_eq!(columns[19], "Hits");
    }

    #[test]
    fn test_rows_in_batter_date_order() {
        let context = simple_context();
        let builder = FeatureTableBuilder::new(build_config(vec![]));
        let table = builder.build(&context).unwrap();

        assert_eq!(table.len(), 4);
        let keys: Vec<(String, NaiveDate)> = table
            .rows()
            .iter()
            .map(|r| (r.batter.to_string(), r.date))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_date_range_filter() {
        let context = simple_context();
        let mut config = build_config(vec![BatterId("aaronj01".to_string())]);
        config.start_date = d(4, 2);
        config.end_date = d(4, 4);
        let table = FeatureTableBuilder::new(config).build(&context).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].date, d(4, 3));
    }

    #[test]
    fn test_unknown_batter_is_structural_error() {
        let context = simple_context();
        let config = build_config(vec![BatterId("nobody99".to_string())]);
        let result = FeatureTableBuilder::new(config).build(&context);

        assert!(matches!(result, Err(PipelineError::UnknownBatter(_))));
    }

    #[test]
    fn test_null_counts_cover_feature_columns() {
        let context = simple_context();
        let builder = FeatureTableBuilder::new(build_config(vec![]));
        let table = builder.build(&context).unwrap();

        let counts = table.null_counts();
        assert_eq!(counts.len(), 16);
        // No pitch events ingested: every pitching column is fully null
        let starter_all = counts
            .iter()
            .find(|(c, _)| c == "Starter_Hits_Per_Out_All")
            .unwrap();
        assert_eq!(starter_all.1, table.len());
    }

    #[test]
    fn test_csv_export_schema() {
        let context = simple_context();
        let builder = FeatureTableBuilder::new(build_config(vec![]));
        let table = builder.build(&context).unwrap();

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("Player,Date,Opposing_Team,Hits_Per_Game_1"));
        assert!(header.ends_with("Hits"));
        assert_eq!(lines.count(), table.len());

        // Nulls are empty fields, not sentinel strings
        assert!(!text.contains("NaN"));
        assert!(!text.contains("null"));
    }
}
