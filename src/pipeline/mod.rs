//! Build and update orchestration
//!
//! Drives the full pipeline: teams, games and players first, then one
//! box-score ingest per game, strictly sequentially. All retry policy
//! lives here; the ingest core itself is retry-free and side-effect-free.

use crate::data::api::{cell_i64, cell_str, StatsApi};
use crate::data::Database;
use crate::ingest::{self, PlayerGameRecord, TeamGameRecord};
use crate::{
    Config, Game, GameId, HoopsError, Player, PlayerId, Position, Result, ScoringConfig, Team,
    TeamId,
};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Whether a phase processes everything or only rows newer than what is
/// already stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    Build,
    Update,
}

/// Tables the update command can refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTable {
    Games,
    GameLogs,
}

impl FromStr for UpdateTable {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "games" => Ok(UpdateTable::Games),
            "game_logs" => Ok(UpdateTable::GameLogs),
            _ => Err(format!("Unknown table: {}. Use games or game_logs.", s)),
        }
    }
}

impl fmt::Display for UpdateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateTable::Games => write!(f, "games"),
            UpdateTable::GameLogs => write!(f, "game_logs"),
        }
    }
}

/// The pipeline orchestrator
pub struct Pipeline {
    api: StatsApi,
    db: Database,
    league: String,
    season: String,
    scoring: ScoringConfig,
}

impl Pipeline {
    pub fn new(api: StatsApi, db: Database, config: &Config) -> Self {
        Pipeline {
            api,
            db,
            league: config.pipeline.league.clone(),
            season: config.pipeline.season.clone(),
            scoring: config.scoring.clone(),
        }
    }

    /// Full historical build: teams, games, players, then every game's
    /// box score.
    pub fn build(&self) -> Result<()> {
        log::info!("Building the teams table");
        self.build_teams()?;
        log::info!("Building the games table");
        self.build_games(PipelineMode::Build)?;
        log::info!("Building the players table");
        self.build_players()?;
        log::info!("Building the team and player game logs");
        self.build_game_logs(PipelineMode::Build)?;
        Ok(())
    }

    /// Incremental update of the requested tables, in the order given.
    pub fn update(&self, tables: &[UpdateTable]) -> Result<()> {
        for table in tables {
            log::info!("Started updating {}", table);
            match table {
                UpdateTable::Games => self.build_games(PipelineMode::Update)?,
                UpdateTable::GameLogs => self.build_game_logs(PipelineMode::Update)?,
            }
            log::info!("Finished updating {}", table);
        }
        Ok(())
    }

    /// Fetch one game's box score and run the ingest core over it.
    pub fn ingest_game(
        &self,
        game_id: GameId,
    ) -> Result<(Vec<TeamGameRecord>, Vec<PlayerGameRecord>)> {
        let response = self.api.box_score(game_id)?;
        ingest::box_score_records(game_id, &response, &self.scoring)
    }

    // ==================== Phases ====================

    fn build_teams(&self) -> Result<()> {
        let response = self.api.team_years(&self.league)?;
        let table = response.table(0, "team years")?;
        let id_col = table.column("TEAM_ID")?;
        let abbr_col = table.column("ABBREVIATION")?;

        let mut stored = 0;
        for row in &table.rows {
            // Defunct franchises carry no current abbreviation
            let Some(abbreviation) = cell_str(row, abbr_col) else {
                continue;
            };
            self.db.insert_team(&Team {
                id: TeamId(cell_i64(row, id_col)),
                abbreviation: abbreviation.to_string(),
            })?;
            stored += 1;
        }
        log::info!("Stored {} teams", stored);
        Ok(())
    }

    fn build_games(&self, mode: PipelineMode) -> Result<()> {
        let floor = match mode {
            PipelineMode::Build => 0,
            PipelineMode::Update => self.db.max_game_id()?.map(|g| g.0).unwrap_or(0),
        };

        // The same game appears in both teams' logs
        let mut seen: HashSet<i64> = HashSet::new();
        let mut stored = 0;
        for team_id in self.db.team_ids()? {
            let response = self.api.team_game_log(team_id, &self.season)?;
            let table = response.table(0, "team game log")?;
            let id_col = table.column("Game_ID")?;
            let date_col = table.column("GAME_DATE")?;

            for row in &table.rows {
                let game_id = cell_i64(row, id_col);
                if game_id <= floor || !seen.insert(game_id) {
                    continue;
                }
                let date = parse_game_date(cell_str(row, date_col).unwrap_or(""))?;
                if mode == PipelineMode::Update {
                    log::info!("Adding {} to the games table", GameId(game_id));
                }
                self.db.insert_game(&Game {
                    id: GameId(game_id),
                    date,
                    season: self.season.clone(),
                })?;
                stored += 1;
            }
        }
        log::info!("Stored {} games", stored);
        Ok(())
    }

    fn build_players(&self) -> Result<()> {
        let response = self.api.all_players(&self.league, &self.season)?;
        let table = response.table(0, "player directory")?;
        let id_col = table.column("PERSON_ID")?;
        let code_col = table.column("PLAYERCODE")?;

        let mut stored = 0;
        let mut skipped = 0;
        for row in &table.rows {
            let player_id = PlayerId(cell_i64(row, id_col));
            let Some(code) = cell_str(row, code_col) else {
                log::warn!("{} has no player code; skipping", player_id);
                skipped += 1;
                continue;
            };
            match self.build_player(player_id, code) {
                Ok(()) => stored += 1,
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => {
                    // Bad data for one player never aborts the directory
                    log::error!("Failed to ingest {}: {}", player_id, e);
                    skipped += 1;
                }
            }
        }
        log::info!("Stored {} players ({} skipped)", stored, skipped);
        Ok(())
    }

    fn build_player(&self, player_id: PlayerId, code: &str) -> Result<()> {
        let card = self.api.player_card(code)?;
        let meta = card.sports_content.player.meta;
        let position = Position::from_granular(&meta.position_granular_full)?;
        let (first_name, last_name) = normalize_name(meta.first_name, meta.last_name);
        let age = self.player_age(player_id)?;

        self.db.insert_player(&Player {
            id: player_id,
            first_name,
            last_name,
            position,
            age,
        })?;
        Ok(())
    }

    /// Age from the last season row of the player's profile; players with
    /// no recorded seasons read as zero.
    fn player_age(&self, player_id: PlayerId) -> Result<i64> {
        let response = self.api.player_profile(player_id)?;
        let table = response.table(0, "season totals")?;
        let age_col = table.column("PLAYER_AGE")?;
        Ok(table
            .rows
            .last()
            .map(|row| cell_i64(row, age_col))
            .unwrap_or(0))
    }

    fn build_game_logs(&self, mode: PipelineMode) -> Result<()> {
        let games = match mode {
            PipelineMode::Build => self.db.all_game_ids()?,
            PipelineMode::Update => self.db.unprocessed_game_ids()?,
        };
        log::info!("Ingesting box scores for {} games", games.len());

        let mut retry = Vec::new();
        for game_id in games {
            match self.process_game(game_id) {
                Ok(()) => {}
                Err(e) if e.is_transient() => {
                    log::warn!("Connectivity failure for {}: {}", game_id, e);
                    retry.push(game_id);
                }
                // A bad response loses that game only, never the batch
                Err(e) => log::error!("Failed to ingest {}: {}", game_id, e),
            }
        }

        // One deferred re-attempt per failed game; a second failure is
        // permanent for this run.
        for game_id in retry {
            if let Err(e) = self.process_game(game_id) {
                log::error!("{} failed permanently this run: {}", game_id, e);
            }
        }
        Ok(())
    }

    fn process_game(&self, game_id: GameId) -> Result<()> {
        log::info!("Starting processing of {}", game_id);
        let (team_records, player_records) = self.ingest_game(game_id)?;

        // Two team rows first, then the player rows
        for record in &team_records {
            self.db.insert_team_game(record)?;
        }
        for record in &player_records {
            self.db.insert_player_game(record)?;
        }
        log::info!(
            "Finished processing of {} ({} player rows)",
            game_id,
            player_records.len()
        );
        Ok(())
    }
}

fn parse_game_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%b %d, %Y")
        .map_err(|e| HoopsError::Parse(format!("bad game date '{}': {}", raw, e)))
}

fn normalize_name(first: String, last: String) -> (String, String) {
    // The directory lists Ishmael Smith under his nickname
    if first == "Ish" && last == "Smith" {
        ("Ishmael".to_string(), last)
    } else {
        (first, last)
    }
}
