//! Flat storage records
//!
//! Merges the cleaned raw lines with the derived metrics into the records
//! the database expects. Field order on both record types mirrors the
//! insert column order, which binds positionally.

use super::derive::{
    double_counts, draftkings_points, fanduel_points, offensive_efficiency, possessions,
};
use super::extract::GameBox;
use crate::{GameId, HoopsError, PlayerId, Result, ScoringConfig, TeamId};

/// One team's stored line for one game
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGameRecord {
    pub team_id: TeamId,
    pub game_id: GameId,
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
    pub possessions: f64,
    pub off_efficiency: f64,
    pub off_rating: f64,
    pub def_rating: f64,
    pub oreb_pct: f64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub pace: f64,
    /// The other team in the same game
    pub opponent: TeamId,
}

/// One player's stored line for one game
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerGameRecord {
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub team_id: TeamId,
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
    pub fd_fp: f64,
    pub dk_fp: f64,
}

/// Build the two team records for a game, each naming the other as its
/// opponent. A participating team with no stats row is a shape failure.
pub fn team_records(game_id: GameId, game: &GameBox) -> Result<Vec<TeamGameRecord>> {
    let matchup = [
        (game.home_team, game.away_team),
        (game.away_team, game.home_team),
    ];

    let mut records = Vec::with_capacity(2);
    for (team_id, opponent) in matchup {
        let raw = game.teams.get(&team_id).ok_or_else(|| {
            HoopsError::MalformedResponse(format!(
                "no team stats row for {} in {}",
                team_id, game_id
            ))
        })?;
        let possessions = possessions(raw);

        records.push(TeamGameRecord {
            team_id,
            game_id,
            fgm: raw.fgm,
            fga: raw.fga,
            fg_pct: raw.fg_pct,
            fg3m: raw.fg3m,
            fg3a: raw.fg3a,
            fg3_pct: raw.fg3_pct,
            ftm: raw.ftm,
            fta: raw.fta,
            ft_pct: raw.ft_pct,
            oreb: raw.oreb,
            dreb: raw.dreb,
            reb: raw.reb,
            ast: raw.ast,
            stl: raw.stl,
            blk: raw.blk,
            tov: raw.tov,
            pts: raw.pts,
            possessions,
            off_efficiency: offensive_efficiency(raw.pts, possessions),
            off_rating: raw.off_rating,
            def_rating: raw.def_rating,
            oreb_pct: raw.oreb_pct,
            efg_pct: raw.efg_pct,
            ts_pct: raw.ts_pct,
            pace: raw.pace,
            opponent,
        });
    }

    Ok(records)
}

/// Build one record per player in the basic stats table, with both
/// fantasy scores computed from the supplied weight tables.
pub fn player_records(
    game_id: GameId,
    game: &GameBox,
    scoring: &ScoringConfig,
) -> Vec<PlayerGameRecord> {
    game.players
        .values()
        .map(|raw| {
            let (dd, td) = double_counts(raw);
            PlayerGameRecord {
                player_id: raw.player_id,
                game_id,
                team_id: raw.team_id,
                minutes: raw.minutes,
                fgm: raw.fgm,
                fga: raw.fga,
                fg_pct: raw.fg_pct,
                fg3m: raw.fg3m,
                fg3a: raw.fg3a,
                fg3_pct: raw.fg3_pct,
                ftm: raw.ftm,
                fta: raw.fta,
                ft_pct: raw.ft_pct,
                oreb: raw.oreb,
                dreb: raw.dreb,
                reb: raw.reb,
                ast: raw.ast,
                stl: raw.stl,
                blk: raw.blk,
                tov: raw.tov,
                pts: raw.pts,
                efg_pct: raw.efg_pct,
                ts_pct: raw.ts_pct,
                usg_pct: raw.usg_pct,
                pace: raw.pace,
                fd_fp: fanduel_points(raw, &scoring.fanduel),
                dk_fp: draftkings_points(raw, dd, td, &scoring.draftkings),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extract::TeamRaw;
    use crate::Config;
    use std::collections::{BTreeMap, HashMap};

    fn game_with_teams(teams: &[(i64, TeamRaw)]) -> GameBox {
        GameBox {
            home_team: TeamId(teams[0].0),
            away_team: TeamId(teams[1].0),
            teams: teams
                .iter()
                .map(|(id, raw)| (TeamId(*id), raw.clone()))
                .collect::<HashMap<_, _>>(),
            players: BTreeMap::new(),
        }
    }

    #[test]
    fn test_team_records_cross_reference_opponents() {
        let game = game_with_teams(&[
            (1, TeamRaw { fga: 80, pts: 100, ..TeamRaw::default() }),
            (2, TeamRaw { fga: 82, pts: 90, ..TeamRaw::default() }),
        ]);
        let records = team_records(GameId(21500001), &game).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].team_id, TeamId(1));
        assert_eq!(records[0].opponent, TeamId(2));
        assert_eq!(records[1].team_id, TeamId(2));
        assert_eq!(records[1].opponent, TeamId(1));
    }

    #[test]
    fn test_missing_team_row_is_a_shape_error() {
        let mut game = game_with_teams(&[
            (1, TeamRaw::default()),
            (2, TeamRaw::default()),
        ]);
        game.teams.remove(&TeamId(2));

        let err = team_records(GameId(21500001), &game).unwrap_err();
        assert!(matches!(err, HoopsError::MalformedResponse(_)));
        assert!(err.to_string().contains("Team(2)"));
    }

    #[test]
    fn test_player_records_carry_both_fantasy_scores() {
        use crate::ingest::extract::PlayerRaw;

        let mut game = game_with_teams(&[(1, TeamRaw::default()), (2, TeamRaw::default())]);
        game.players.insert(
            PlayerId(100),
            PlayerRaw {
                player_id: PlayerId(100),
                team_id: TeamId(1),
                minutes: 34,
                fgm: 9,
                fga: 18,
                fg_pct: 0.5,
                fg3m: 0,
                fg3a: 2,
                fg3_pct: 0.0,
                ftm: 4,
                fta: 5,
                ft_pct: 0.8,
                oreb: 2,
                dreb: 9,
                reb: 11,
                ast: 10,
                stl: 1,
                blk: 0,
                tov: 2,
                pts: 22,
                efg_pct: 0.5,
                ts_pct: 0.55,
                usg_pct: 0.28,
                pace: 95.5,
            },
        );

        let scoring = Config::default().scoring;
        let records = player_records(GameId(21500001), &game, &scoring);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.minutes, 34);
        // pts, reb and ast all reach ten: triple-double under both formats
        assert!((record.fd_fp - 50.2).abs() < 1e-9);
        assert!((record.dk_fp - 56.25).abs() < 1e-9);
    }
}
