//! NBA stats database CLI
//!
//! Builds and updates a SQLite database of box scores, advanced metrics
//! and daily-fantasy scores from the public stats API.

use clap::{Parser, Subcommand};
use hoopsdb::pipeline::UpdateTable;
use hoopsdb::{Config, Result};

#[derive(Parser)]
#[command(name = "hoopsdb")]
#[command(about = "NBA box-score database builder", long_about = None)]
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
    /// Build the database from scratch for one season
    Build {
        /// Override the league id from config ("00" is the NBA)
        #[arg(long)]
        league: Option<String>,
        /// Override the season from config, e.g. "2025-26"
        #[arg(long)]
        season: Option<String>,
    },
    /// Fetch rows newer than what is already stored
    Update {
        /// Tables to refresh, in order (default: games, then game_logs)
        #[arg(value_name = "TABLE")]
        tables: Vec<UpdateTable>,
    },
    /// Show database row counts
    Status,
    /// Initialize a new project with default config
    Init,
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
        Commands::Build { league, season } => commands::build(&config, league, season),
        Commands::Update { tables } => commands::update(&config, tables),
        Commands::Status => commands::status(&config),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use hoopsdb::data::{Database, StatsApi};
    use hoopsdb::pipeline::Pipeline;

    pub fn build(config: &Config, league: Option<String>, season: Option<String>) -> Result<()> {
        let mut config = config.clone();
        if let Some(league) = league {
            config.pipeline.league = league;
        }
        if let Some(season) = season {
            config.pipeline.season = season;
        }

        let db = Database::open(&config.data.database_path)?;
        let api = StatsApi::new(&config.api);
        let pipeline = Pipeline::new(api, db, &config);

        log::info!(
            "Building database for league {} and season {}",
            config.pipeline.league,
            config.pipeline.season
        );
        pipeline.build()?;
        log::info!(
            "Finished building database for league {} and season {}",
            config.pipeline.league,
            config.pipeline.season
        );
        Ok(())
    }

    pub fn update(config: &Config, tables: Vec<UpdateTable>) -> Result<()> {
        let tables = if tables.is_empty() {
            vec![UpdateTable::Games, UpdateTable::GameLogs]
        } else {
            tables
        };

        let db = Database::open(&config.data.database_path)?;
        let api = StatsApi::new(&config.api);
        let pipeline = Pipeline::new(api, db, config);

        pipeline.update(&tables)?;
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:         {}", config.data.database_path);
        println!("  Teams:        {}", stats.team_count);
        println!("  Players:      {}", stats.player_count);
        println!("  Games:        {}", stats.game_count);
        println!("  Team lines:   {}", stats.team_game_count);
        println!("  Player lines: {}", stats.player_game_count);

        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'hoopsdb build' to build the database for the configured season");
        println!("  3. Run 'hoopsdb update' after game days to pull new box scores");
        println!("  4. Run 'hoopsdb status' to check row counts");

        Ok(())
    }
}
