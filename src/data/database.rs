//! SQLite database management
//!
//! Ingestion is insert-only: game-log rows are written once and never
//! updated. Re-running a build over already-stored games is the caller's
//! responsibility to avoid.

use crate::ingest::{PlayerGameRecord, TeamGameRecord};
use crate::{Game, GameId, HoopsError, Player, PlayerId, Position, Result, Team, TeamId};
use rusqlite::{params, Connection, OptionalExtension};
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
            CREATE TABLE IF NOT EXISTS teams (
                team_id INTEGER PRIMARY KEY,
                abbreviation TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS players (
                player_id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                position TEXT NOT NULL,
                age INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS games (
                game_id INTEGER PRIMARY KEY,
                game_date TEXT NOT NULL,
                season_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS team_games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                team_id INTEGER NOT NULL REFERENCES teams(team_id),
                game_id INTEGER NOT NULL REFERENCES games(game_id),
                fgm INTEGER NOT NULL,
                fga INTEGER NOT NULL,
                fg_pct REAL NOT NULL,
                fg3m INTEGER NOT NULL,
                fg3a INTEGER NOT NULL,
                fg3_pct REAL NOT NULL,
                ftm INTEGER NOT NULL,
                fta INTEGER NOT NULL,
                ft_pct REAL NOT NULL,
                oreb INTEGER NOT NULL,
                dreb INTEGER NOT NULL,
                reb INTEGER NOT NULL,
                ast INTEGER NOT NULL,
                stl INTEGER NOT NULL,
                blk INTEGER NOT NULL,
                tov INTEGER NOT NULL,
                pts INTEGER NOT NULL,
                possessions REAL NOT NULL,
                off_efficiency REAL NOT NULL,
                off_rating REAL NOT NULL,
                def_rating REAL NOT NULL,
                oreb_pct REAL NOT NULL,
                efg_pct REAL NOT NULL,
                ts_pct REAL NOT NULL,
                pace REAL NOT NULL,
                opponent INTEGER NOT NULL REFERENCES teams(team_id)
            );

            CREATE TABLE IF NOT EXISTS player_games (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_id INTEGER NOT NULL REFERENCES players(player_id),
                game_id INTEGER NOT NULL REFERENCES games(game_id),
                team_id INTEGER NOT NULL REFERENCES teams(team_id),
                minutes INTEGER NOT NULL,
                fgm INTEGER NOT NULL,
                fga INTEGER NOT NULL,
                fg_pct REAL NOT NULL,
                fg3m INTEGER NOT NULL,
                fg3a INTEGER NOT NULL,
                fg3_pct REAL NOT NULL,
                ftm INTEGER NOT NULL,
                fta INTEGER NOT NULL,
                ft_pct REAL NOT NULL,
                oreb INTEGER NOT NULL,
                dreb INTEGER NOT NULL,
                reb INTEGER NOT NULL,
                ast INTEGER NOT NULL,
                stl INTEGER NOT NULL,
                blk INTEGER NOT NULL,
                tov INTEGER NOT NULL,
                pts INTEGER NOT NULL,
                efg_pct REAL NOT NULL,
                ts_pct REAL NOT NULL,
                usg_pct REAL NOT NULL,
                pace REAL NOT NULL,
                fd_fp REAL NOT NULL,
                dk_fp REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_team_games_game ON team_games(game_id);
            CREATE INDEX IF NOT EXISTS idx_player_games_game ON player_games(game_id);
            CREATE INDEX IF NOT EXISTS idx_player_games_player ON player_games(player_id);
            "#,
        )?;
        Ok(())
    }

    // ==================== Team Operations ====================

    pub fn insert_team(&self, team: &Team) -> Result<()> {
        self.conn.execute(
            "INSERT INTO teams (team_id, abbreviation) VALUES (?1, ?2)",
            params![team.id.0, team.abbreviation],
        )?;
        Ok(())
    }

    /// All stored team ids, in id order
    pub fn team_ids(&self) -> Result<Vec<TeamId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT team_id FROM teams ORDER BY team_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0).map(TeamId))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ==================== Player Operations ====================

    pub fn insert_player(&self, player: &Player) -> Result<()> {
        self.conn.execute(
            "INSERT INTO players (player_id, first_name, last_name, position, age)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                player.id.0,
                player.first_name,
                player.last_name,
                player.position.code(),
                player.age,
            ],
        )?;
        Ok(())
    }

    pub fn get_player(&self, id: PlayerId) -> Result<Option<Player>> {
        let player = self
            .conn
            .query_row(
                "SELECT player_id, first_name, last_name, position, age
                 FROM players WHERE player_id = ?1",
                params![id.0],
                |row| {
                    let code: String = row.get(3)?;
                    Ok(Player {
                        id: PlayerId(row.get(0)?),
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        position: Position::from_code(&code).unwrap_or(Position::Unlisted),
                        age: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(player)
    }

    // ==================== Game Operations ====================

    pub fn insert_game(&self, game: &Game) -> Result<()> {
        self.conn.execute(
            "INSERT INTO games (game_id, game_date, season_id) VALUES (?1, ?2, ?3)",
            params![
                game.id.0,
                game.date.format("%Y-%m-%d").to_string(),
                game.season,
            ],
        )?;
        Ok(())
    }

    /// Highest stored game id, if any games exist
    pub fn max_game_id(&self) -> Result<Option<GameId>> {
        let max: Option<i64> = self
            .conn
            .query_row("SELECT MAX(game_id) FROM games", [], |row| row.get(0))?;
        Ok(max.map(GameId))
    }

    /// Every stored game id, in id order
    pub fn all_game_ids(&self) -> Result<Vec<GameId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT game_id FROM games ORDER BY game_id")?;
        let ids = stmt
            .query_map([], |row| row.get(0).map(GameId))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Game ids newer than the newest game already ingested into team_games.
    /// With nothing ingested yet this is every stored game.
    pub fn unprocessed_game_ids(&self) -> Result<Vec<GameId>> {
        let mut stmt = self.conn.prepare(
            "SELECT game_id FROM games
             WHERE game_id > (SELECT COALESCE(MAX(game_id), 0) FROM team_games)
             ORDER BY game_id",
        )?;
        let ids = stmt
            .query_map([], |row| row.get(0).map(GameId))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    // ==================== Game-Log Operations ====================

    /// Insert one team's line for one game. Columns bind positionally in
    /// the record's declared order.
    pub fn insert_team_game(&self, record: &TeamGameRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO team_games
                 (team_id, game_id, fgm, fga, fg_pct, fg3m, fg3a, fg3_pct,
                  ftm, fta, ft_pct, oreb, dreb, reb, ast, stl, blk, tov, pts,
                  possessions, off_efficiency, off_rating, def_rating,
                  oreb_pct, efg_pct, ts_pct, pace, opponent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26, ?27, ?28)",
            params![
                record.team_id.0,
                record.game_id.0,
                record.fgm,
                record.fga,
                record.fg_pct,
                record.fg3m,
                record.fg3a,
                record.fg3_pct,
                record.ftm,
                record.fta,
                record.ft_pct,
                record.oreb,
                record.dreb,
                record.reb,
                record.ast,
                record.stl,
                record.blk,
                record.tov,
                record.pts,
                record.possessions,
                record.off_efficiency,
                record.off_rating,
                record.def_rating,
                record.oreb_pct,
                record.efg_pct,
                record.ts_pct,
                record.pace,
                record.opponent.0,
            ],
        )?;
        Ok(())
    }

    /// Insert one player's line for one game, same positional convention.
    pub fn insert_player_game(&self, record: &PlayerGameRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO player_games
                 (player_id, game_id, team_id, minutes, fgm, fga, fg_pct,
                  fg3m, fg3a, fg3_pct, ftm, fta, ft_pct, oreb, dreb, reb,
                  ast, stl, blk, tov, pts, efg_pct, ts_pct, usg_pct, pace,
                  fd_fp, dk_fp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24,
                     ?25, ?26, ?27)",
            params![
                record.player_id.0,
                record.game_id.0,
                record.team_id.0,
                record.minutes,
                record.fgm,
                record.fga,
                record.fg_pct,
                record.fg3m,
                record.fg3a,
                record.fg3_pct,
                record.ftm,
                record.fta,
                record.ft_pct,
                record.oreb,
                record.dreb,
                record.reb,
                record.ast,
                record.stl,
                record.blk,
                record.tov,
                record.pts,
                record.efg_pct,
                record.ts_pct,
                record.usg_pct,
                record.pace,
                record.fd_fp,
                record.dk_fp,
            ],
        )?;
        Ok(())
    }

    /// Opponent listed for a team in a game, if the row exists
    pub fn team_game_opponent(&self, team: TeamId, game: GameId) -> Result<Option<TeamId>> {
        let opponent: Option<i64> = self
            .conn
            .query_row(
                "SELECT opponent FROM team_games WHERE team_id = ?1 AND game_id = ?2",
                params![team.0, game.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(opponent.map(TeamId))
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })
                .map_err(HoopsError::Database)?;
            Ok(n as usize)
        };

        Ok(DatabaseStats {
            team_count: count("teams")?,
            player_count: count("players")?,
            game_count: count("games")?,
            team_game_count: count("team_games")?,
            player_game_count: count("player_games")?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub team_count: usize,
    pub player_count: usize,
    pub game_count: usize,
    pub team_game_count: usize,
    pub player_game_count: usize,
}
