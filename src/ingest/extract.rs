//! Box-score field extraction
//!
//! Pulls the raw team and player counting stats out of one game's
//! box-score response. Pure: nothing here touches the network or the
//! database. Null cells count as zero throughout.

use crate::data::api::{cell_f64, cell_i64, ResultSet, StatsResponse};
use crate::{HoopsError, PlayerId, Result, TeamId};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

// Fixed table positions within a box-score response.
pub const TABLE_GAME_SUMMARY: usize = 0;
pub const TABLE_PLAYER_BASIC: usize = 4;
pub const TABLE_TEAM_BASIC: usize = 5;
pub const TABLE_PLAYER_ADVANCED: usize = 13;
pub const TABLE_TEAM_ADVANCED: usize = 14;

/// One team's cleaned raw line: basic counts plus the service-computed
/// advanced ratings. Built once per game, never mutated after extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamRaw {
    pub fgm: i64,
    pub fga: i64,
    pub fg_pct: f64,
    pub fg3m: i64,
    pub fg3a: i64,
    pub fg3_pct: f64,
    pub ftm: i64,
    pub fta: i64,
    pub ft_pct: f64,
    pub oreb: i64,
    pub dreb: i64,
    pub reb: i64,
    pub ast: i64,
    pub stl: i64,
    pub blk: i64,
    pub tov: i64,
    pub pts: i64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub oreb_pct: f64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub pace: f64,
}

/// One player's cleaned raw line. Advanced percentages stay zero for
/// players who did not appear in (or play minutes in) the advanced table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRaw {
    pub player_id: PlayerId,
    pub team_id: TeamId,
    /// Whole minutes played, truncated from the MM:SS clock field
    pub minutes: i64,
    pub fgm: i64,
    pub fga: i64,
    pub fg_pct: f64,
    pub fg3m: i64,
    pub fg3a: i64,
    pub fg3_pct: f64,
    pub ftm: i64,
    pub fta: i64,
    pub ft_pct: f64,
    pub oreb: i64,
    pub dreb: i64,
    pub reb: i64,
    pub ast: i64,
    pub stl: i64,
    pub blk: i64,
    pub tov: i64,
    pub pts: i64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub usg_pct: f64,
    pub pace: f64,
}

/// Everything extracted from one game's box score
#[derive(Debug, Clone)]
pub struct GameBox {
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub teams: HashMap<TeamId, TeamRaw>,
    pub players: BTreeMap<PlayerId, PlayerRaw>,
}

struct TeamBasicCols {
    team_id: usize,
    fgm: usize,
    fga: usize,
    fg_pct: usize,
    fg3m: usize,
    fg3a: usize,
    fg3_pct: usize,
    ftm: usize,
    fta: usize,
    ft_pct: usize,
    oreb: usize,
    dreb: usize,
    reb: usize,
    ast: usize,
    stl: usize,
    blk: usize,
    tov: usize,
    pts: usize,
}

impl TeamBasicCols {
    fn resolve(table: &ResultSet) -> Result<Self> {
        Ok(TeamBasicCols {
            team_id: table.column("TEAM_ID")?,
            fgm: table.column("FGM")?,
            fga: table.column("FGA")?,
            fg_pct: table.column("FG_PCT")?,
            fg3m: table.column("FG3M")?,
            fg3a: table.column("FG3A")?,
            fg3_pct: table.column("FG3_PCT")?,
            ftm: table.column("FTM")?,
            fta: table.column("FTA")?,
            ft_pct: table.column("FT_PCT")?,
            oreb: table.column("OREB")?,
            dreb: table.column("DREB")?,
            reb: table.column("REB")?,
            ast: table.column("AST")?,
            stl: table.column("STL")?,
            blk: table.column("BLK")?,
            tov: table.column("TO")?,
            pts: table.column("PTS")?,
        })
    }
}

struct TeamAdvancedCols {
    team_id: usize,
    off_rating: usize,
    def_rating: usize,
    oreb_pct: usize,
    efg_pct: usize,
    ts_pct: usize,
    pace: usize,
}

impl TeamAdvancedCols {
    fn resolve(table: &ResultSet) -> Result<Self> {
        Ok(TeamAdvancedCols {
            team_id: table.column("TEAM_ID")?,
            off_rating: table.column("OFF_RATING")?,
            def_rating: table.column("DEF_RATING")?,
            oreb_pct: table.column("OREB_PCT")?,
            efg_pct: table.column("EFG_PCT")?,
            ts_pct: table.column("TS_PCT")?,
            pace: table.column("PACE")?,
        })
    }
}

struct PlayerBasicCols {
    player_id: usize,
    team_id: usize,
    min: usize,
    fgm: usize,
    fga: usize,
    fg_pct: usize,
    fg3m: usize,
    fg3a: usize,
    fg3_pct: usize,
    ftm: usize,
    fta: usize,
    ft_pct: usize,
    oreb: usize,
    dreb: usize,
    reb: usize,
    ast: usize,
    stl: usize,
    blk: usize,
    tov: usize,
    pts: usize,
}

impl PlayerBasicCols {
    fn resolve(table: &ResultSet) -> Result<Self> {
        Ok(PlayerBasicCols {
            player_id: table.column("PLAYER_ID")?,
            team_id: table.column("TEAM_ID")?,
            min: table.column("MIN")?,
            fgm: table.column("FGM")?,
            fga: table.column("FGA")?,
            fg_pct: table.column("FG_PCT")?,
            fg3m: table.column("FG3M")?,
            fg3a: table.column("FG3A")?,
            fg3_pct: table.column("FG3_PCT")?,
            ftm: table.column("FTM")?,
            fta: table.column("FTA")?,
            ft_pct: table.column("FT_PCT")?,
            oreb: table.column("OREB")?,
            dreb: table.column("DREB")?,
            reb: table.column("REB")?,
            ast: table.column("AST")?,
            stl: table.column("STL")?,
            blk: table.column("BLK")?,
            tov: table.column("TO")?,
            pts: table.column("PTS")?,
        })
    }
}

struct PlayerAdvancedCols {
    player_id: usize,
    min: usize,
    efg_pct: usize,
    ts_pct: usize,
    usg_pct: usize,
    pace: usize,
}

impl PlayerAdvancedCols {
    fn resolve(table: &ResultSet) -> Result<Self> {
        Ok(PlayerAdvancedCols {
            player_id: table.column("PLAYER_ID")?,
            min: table.column("MIN")?,
            efg_pct: table.column("EFG_PCT")?,
            ts_pct: table.column("TS_PCT")?,
            usg_pct: table.column("USG_PCT")?,
            pace: table.column("PACE")?,
        })
    }
}

/// Extract the cleaned team and player lines from one box-score response.
pub fn extract_box(response: &StatsResponse) -> Result<GameBox> {
    let (home_team, away_team) = extract_matchup(response)?;
    let teams = extract_teams(response)?;
    let players = extract_players(response)?;

    Ok(GameBox {
        home_team,
        away_team,
        teams,
        players,
    })
}

/// Home and away team ids from the first game-summary row.
fn extract_matchup(response: &StatsResponse) -> Result<(TeamId, TeamId)> {
    let summary = response.table(TABLE_GAME_SUMMARY, "game summary")?;
    let home_col = summary.column("HOME_TEAM_ID")?;
    let away_col = summary.column("VISITOR_TEAM_ID")?;
    let first = summary.rows.first().ok_or_else(|| {
        HoopsError::MalformedResponse("game summary table has no rows".to_string())
    })?;
    Ok((
        TeamId(cell_i64(first, home_col)),
        TeamId(cell_i64(first, away_col)),
    ))
}

fn extract_teams(response: &StatsResponse) -> Result<HashMap<TeamId, TeamRaw>> {
    let basic = response.table(TABLE_TEAM_BASIC, "team stats")?;
    let cols = TeamBasicCols::resolve(basic)?;

    let mut teams = HashMap::new();
    for row in &basic.rows {
        let team_id = TeamId(cell_i64(row, cols.team_id));
        let raw = TeamRaw {
            fgm: cell_i64(row, cols.fgm),
            fga: cell_i64(row, cols.fga),
            fg_pct: cell_f64(row, cols.fg_pct),
            fg3m: cell_i64(row, cols.fg3m),
            fg3a: cell_i64(row, cols.fg3a),
            fg3_pct: cell_f64(row, cols.fg3_pct),
            ftm: cell_i64(row, cols.ftm),
            fta: cell_i64(row, cols.fta),
            ft_pct: cell_f64(row, cols.ft_pct),
            oreb: cell_i64(row, cols.oreb),
            dreb: cell_i64(row, cols.dreb),
            reb: cell_i64(row, cols.reb),
            ast: cell_i64(row, cols.ast),
            stl: cell_i64(row, cols.stl),
            blk: cell_i64(row, cols.blk),
            tov: cell_i64(row, cols.tov),
            pts: cell_i64(row, cols.pts),
            ..TeamRaw::default()
        };
        teams.insert(team_id, raw);
    }

    let advanced = response.table(TABLE_TEAM_ADVANCED, "team advanced stats")?;
    let cols = TeamAdvancedCols::resolve(advanced)?;
    for row in &advanced.rows {
        let team_id = TeamId(cell_i64(row, cols.team_id));
        // A team with no advanced row keeps zeroed ratings.
        if let Some(raw) = teams.get_mut(&team_id) {
            raw.off_rating = cell_f64(row, cols.off_rating);
            raw.def_rating = cell_f64(row, cols.def_rating);
            raw.oreb_pct = cell_f64(row, cols.oreb_pct);
            raw.efg_pct = cell_f64(row, cols.efg_pct);
            raw.ts_pct = cell_f64(row, cols.ts_pct);
            raw.pace = cell_f64(row, cols.pace);
        }
    }

    Ok(teams)
}

fn extract_players(response: &StatsResponse) -> Result<BTreeMap<PlayerId, PlayerRaw>> {
    let basic = response.table(TABLE_PLAYER_BASIC, "player stats")?;
    let cols = PlayerBasicCols::resolve(basic)?;

    let mut players = BTreeMap::new();
    for row in &basic.rows {
        let player_id = PlayerId(cell_i64(row, cols.player_id));
        let raw = PlayerRaw {
            player_id,
            team_id: TeamId(cell_i64(row, cols.team_id)),
            minutes: whole_minutes(row.get(cols.min).unwrap_or(&Value::Null)),
            fgm: cell_i64(row, cols.fgm),
            fga: cell_i64(row, cols.fga),
            fg_pct: cell_f64(row, cols.fg_pct),
            fg3m: cell_i64(row, cols.fg3m),
            fg3a: cell_i64(row, cols.fg3a),
            fg3_pct: cell_f64(row, cols.fg3_pct),
            ftm: cell_i64(row, cols.ftm),
            fta: cell_i64(row, cols.fta),
            ft_pct: cell_f64(row, cols.ft_pct),
            oreb: cell_i64(row, cols.oreb),
            dreb: cell_i64(row, cols.dreb),
            reb: cell_i64(row, cols.reb),
            ast: cell_i64(row, cols.ast),
            stl: cell_i64(row, cols.stl),
            blk: cell_i64(row, cols.blk),
            tov: cell_i64(row, cols.tov),
            pts: cell_i64(row, cols.pts),
            efg_pct: 0.0,
            ts_pct: 0.0,
            usg_pct: 0.0,
            pace: 0.0,
        };
        players.insert(player_id, raw);
    }

    let advanced = response.table(TABLE_PLAYER_ADVANCED, "player advanced stats")?;
    let cols = PlayerAdvancedCols::resolve(advanced)?;
    for row in &advanced.rows {
        let player_id = PlayerId(cell_i64(row, cols.player_id));
        let Some(raw) = players.get_mut(&player_id) else {
            // The basic table is the superset; anything else is noise.
            log::debug!("{} appears only in the advanced table; skipping", player_id);
            continue;
        };
        // Only players with actual court time carry advanced percentages;
        // DNP rows have a bare status in the minutes cell and stay zeroed.
        if is_clock(row.get(cols.min).unwrap_or(&Value::Null)) {
            raw.efg_pct = cell_f64(row, cols.efg_pct);
            raw.ts_pct = cell_f64(row, cols.ts_pct);
            raw.usg_pct = cell_f64(row, cols.usg_pct);
            raw.pace = cell_f64(row, cols.pace);
        }
    }

    Ok(players)
}

/// Whole-minute component of a "MM:SS" clock cell. Null and non-clock
/// values (a player who never checked in) read as zero.
fn whole_minutes(cell: &Value) -> i64 {
    match cell {
        Value::String(s) => s
            .split(':')
            .next()
            .and_then(|m| m.trim().parse().ok())
            .unwrap_or(0),
        Value::Number(n) => n.as_i64().unwrap_or(0),
        _ => 0,
    }
}

fn is_clock(cell: &Value) -> bool {
    matches!(cell, Value::String(s) if s.contains(':'))
}
