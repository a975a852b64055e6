//! Batter hit-prediction pipeline CLI
//!
//! Ingests raw game-log and pitch-level CSVs, then builds the
//! point-in-time feature table consumed by the training scripts.

use clap::{Parser, Subcommand};
use dugout::{Config, Result};

#[derive(Parser)]
#[command(name = "dugout")]
#[command(about = "Point-in-time feature engineering for batter hit prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Feature table commands
    Features {
        #[command(subcommand)]
        action: FeatureCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Load raw CSV tables into the database
    Load {
        /// Batter game-log CSV
        #[arg(long)]
        game_logs: Option<String>,
        /// Pitch-event CSV
        #[arg(long)]
        pitch_events: Option<String>,
        /// Plate-appearance CSV
        #[arg(long)]
        plate_appearances: Option<String>,
        /// Clear previously ingested rows first
        #[arg(long)]
        replace: bool,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum FeatureCommands {
    /// Build the feature table for the configured study period
    Build {
        /// Output CSV path (overrides config)
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Load {
                game_logs,
                pitch_events,
                plate_appearances,
                replace,
            } => commands::data_load(&config, game_logs, pitch_events, plate_appearances, replace),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Features { action } => match action {
            FeatureCommands::Build { output } => commands::features_build(&config, output),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use dugout::data::{ingest, Database};
    use dugout::features::table::{BuildConfig, FeatureTableBuilder};
    use dugout::features::HistoryContext;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to set the study period and windows", config_path);
        println!("  2. Run 'dugout data load' with the raw CSV tables");
        println!("  3. Run 'dugout features build' to produce the feature table");
        Ok(())
    }

    pub fn data_load(
        config: &Config,
        game_logs: Option<String>,
        pitch_events: Option<String>,
        plate_appearances: Option<String>,
        replace: bool,
    ) -> Result<()> {
        let mut db = Database::open(&config.data.database_path)?;
        if replace {
            db.clear()?;
        }
        let season = config.study.season;

        // Pitch events first so game logs can be enriched with the
        // opposing starter's hand
        let events = match pitch_events {
            Some(path) => {
                let events = ingest::load_pitch_events(&path, season)?;
                db.insert_pitch_events(&events)?;
                println!("Loaded {} pitch events from {}", events.len(), path);
                events
            }
            None => db.load_pitch_events()?,
        };

        if let Some(path) = game_logs {
            let mut games = ingest::load_game_logs(&path, season)?;
            ingest::enrich_starter_hands(&mut games, &events);
            db.insert_game_logs(&games)?;
            println!("Loaded {} game log rows from {}", games.len(), path);
        }

        if let Some(path) = plate_appearances {
            let pas = ingest::load_plate_appearances(&path, season)?;
            db.insert_plate_appearances(&pas)?;
            println!("Loaded {} plate appearances from {}", pas.len(), path);
        }

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let status = db.status()?;

        println!("Database: {}", config.data.database_path);
        println!("  game_logs:          {}", status.game_logs);
        println!("  pitch_events:       {}", status.pitch_events);
        println!("  plate_appearances:  {}", status.plate_appearances);
        println!("  tracked batters:    {}", db.batters()?.len());
        Ok(())
    }

    pub fn features_build(config: &Config, output: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;

        let games = db.load_game_logs()?;
        let pas = db.load_plate_appearances()?;
        let events = db.load_pitch_events()?;
        let context = HistoryContext::new(games, pas, events);

        let mut batters: Vec<_> = context.batters().into_iter().cloned().collect();
        if config.study.batters_tracked > 0 {
            batters.truncate(config.study.batters_tracked);
        }

        let builder = FeatureTableBuilder::new(BuildConfig {
            start_date: config.study.start_date,
            end_date: config.study.end_date,
            batters,
            windows: config.study.windows.clone(),
        });
        let table = builder.build(&context)?;

        let output_path = output.unwrap_or_else(|| config.data.output_path.clone());
        table.write_csv_path(&output_path)?;
        println!(
            "Wrote {} feature rows x {} columns to {}",
            table.len(),
            table.columns().len(),
            output_path
        );
        Ok(())
    }
}
