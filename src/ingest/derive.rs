//! Advanced-metric and fantasy-score computation
//!
//! Pure arithmetic over the cleaned raw lines. The scoring functions are
//! deterministic in their inputs and read only the stats their format
//! scores, so the same weight-table type serves both formats.

use super::extract::{PlayerRaw, TeamRaw};
use crate::ScoringWeights;

/// Estimated possessions for one team's game line.
pub fn possessions(team: &TeamRaw) -> f64 {
    team.fga as f64 + 0.44 * team.fta as f64 + team.tov as f64 - team.oreb as f64
}

/// Points per 100 possessions. A zero-possession line scores zero rather
/// than dividing by zero.
pub fn offensive_efficiency(points: i64, possessions: f64) -> f64 {
    if possessions == 0.0 {
        0.0
    } else {
        100.0 * points as f64 / possessions
    }
}

/// Double-double / triple-double flags for a player's line.
///
/// Turnovers count as a qualifying category alongside points, rebounds,
/// assists and steals; blocks do not. Exactly two categories at ten or
/// more is a double-double, exactly three is also a triple-double, any
/// other count is neither.
pub fn double_counts(player: &PlayerRaw) -> (i64, i64) {
    let categories = [player.pts, player.reb, player.ast, player.stl, player.tov];
    let qualifying = categories.iter().filter(|&&stat| stat >= 10).count();
    match qualifying {
        2 => (1, 0),
        3 => (1, 1),
        _ => (0, 0),
    }
}

/// FanDuel fantasy points for a player's line.
pub fn fanduel_points(player: &PlayerRaw, weights: &ScoringWeights) -> f64 {
    player.pts as f64
        + player.reb as f64 * weights.reb
        + player.ast as f64 * weights.ast
        + player.blk as f64 * weights.blk
        + player.stl as f64 * weights.stl
        + player.tov as f64 * weights.tov
}

/// DraftKings fantasy points for a player's line, including the
/// double-double and triple-double bonuses.
pub fn draftkings_points(player: &PlayerRaw, dd: i64, td: i64, weights: &ScoringWeights) -> f64 {
    player.pts as f64
        + player.reb as f64 * weights.reb
        + player.fg3m as f64 * weights.fg3m
        + player.ast as f64 * weights.ast
        + player.stl as f64 * weights.stl
        + player.blk as f64 * weights.blk
        + dd as f64 * weights.dd
        + td as f64 * weights.td
        + player.tov as f64 * weights.tov
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, PlayerId, TeamId};

    fn team_line(fga: i64, fta: i64, tov: i64, oreb: i64, pts: i64) -> TeamRaw {
        TeamRaw {
            fga,
            fta,
            tov,
            oreb,
            pts,
            ..TeamRaw::default()
        }
    }

    fn player_line(pts: i64, reb: i64, ast: i64, stl: i64, blk: i64, tov: i64) -> PlayerRaw {
        PlayerRaw {
            player_id: PlayerId(1),
            team_id: TeamId(1),
            minutes: 30,
            fgm: 0,
            fga: 0,
            fg_pct: 0.0,
            fg3m: 0,
            fg3a: 0,
            fg3_pct: 0.0,
            ftm: 0,
            fta: 0,
            ft_pct: 0.0,
            oreb: 0,
            dreb: reb,
            reb,
            ast,
            stl,
            blk,
            tov,
            pts,
            efg_pct: 0.0,
            ts_pct: 0.0,
            usg_pct: 0.0,
            pace: 0.0,
        }
    }

    #[test]
    fn test_possessions_formula() {
        // 80 + 0.44*25 + 4 - 10 = 85
        let team = team_line(80, 25, 4, 10, 100);
        assert_eq!(possessions(&team), 85.0);
    }

    #[test]
    fn test_offensive_efficiency() {
        assert!((offensive_efficiency(100, 85.0) - 117.647).abs() < 0.001);
        assert!((offensive_efficiency(90, 88.0) - 102.273).abs() < 0.001);
    }

    #[test]
    fn test_zero_possessions_scores_zero() {
        let team = team_line(0, 0, 0, 0, 12);
        assert_eq!(possessions(&team), 0.0);
        assert_eq!(offensive_efficiency(team.pts, possessions(&team)), 0.0);
    }

    #[test]
    fn test_double_double_and_triple_double() {
        // Exactly two categories at ten or more
        let (dd, td) = double_counts(&player_line(22, 11, 4, 1, 0, 2));
        assert_eq!((dd, td), (1, 0));

        // Exactly three
        let (dd, td) = double_counts(&player_line(22, 11, 10, 1, 0, 2));
        assert_eq!((dd, td), (1, 1));

        // Zero or one qualifying category
        assert_eq!(double_counts(&player_line(8, 3, 2, 0, 0, 1)), (0, 0));
        assert_eq!(double_counts(&player_line(30, 4, 5, 1, 0, 2)), (0, 0));

        // Four or more qualifying categories also clears both flags
        assert_eq!(double_counts(&player_line(20, 12, 11, 10, 0, 2)), (0, 0));
    }

    #[test]
    fn test_turnovers_count_toward_the_tally() {
        // 12 points and 10 turnovers make a double-double
        let (dd, td) = double_counts(&player_line(12, 4, 3, 1, 0, 10));
        assert_eq!((dd, td), (1, 0));
    }

    #[test]
    fn test_blocks_do_not_count_toward_the_tally() {
        let (dd, td) = double_counts(&player_line(15, 4, 3, 1, 10, 2));
        assert_eq!((dd, td), (0, 0));
    }

    #[test]
    fn test_fanduel_worked_example() {
        // 22 + 11*1.2 + 10*1.5 + 0*2 + 1*2 - 2 = 50.2
        let scoring = Config::default().scoring;
        let player = player_line(22, 11, 10, 1, 0, 2);
        assert!((fanduel_points(&player, &scoring.fanduel) - 50.2).abs() < 1e-9);
    }

    #[test]
    fn test_draftkings_worked_example() {
        // 22 + 11*1.25 + 10*1.5 + 1*2 + 1.5 + 3 + 2*-0.5 = 56.25
        let scoring = Config::default().scoring;
        let player = player_line(22, 11, 10, 1, 0, 2);
        let (dd, td) = double_counts(&player);
        assert_eq!((dd, td), (1, 1));
        assert!((draftkings_points(&player, dd, td, &scoring.draftkings) - 56.25).abs() < 1e-9);
    }

    #[test]
    fn test_fantasy_scores_are_deterministic() {
        let scoring = Config::default().scoring;
        let player = player_line(31, 7, 12, 3, 2, 5);
        let (dd, td) = double_counts(&player);

        let fd_first = fanduel_points(&player, &scoring.fanduel);
        let dk_first = draftkings_points(&player, dd, td, &scoring.draftkings);
        for _ in 0..5 {
            assert_eq!(fanduel_points(&player, &scoring.fanduel), fd_first);
            assert_eq!(
                draftkings_points(&player, dd, td, &scoring.draftkings),
                dk_first
            );
        }
    }

    #[test]
    fn test_three_pointers_only_score_on_draftkings() {
        let scoring = Config::default().scoring;
        let mut player = player_line(10, 0, 0, 0, 0, 0);
        let without = (
            fanduel_points(&player, &scoring.fanduel),
            draftkings_points(&player, 0, 0, &scoring.draftkings),
        );
        player.fg3m = 4;
        assert_eq!(fanduel_points(&player, &scoring.fanduel), without.0);
        assert_eq!(
            draftkings_points(&player, 0, 0, &scoring.draftkings),
            without.1 + 4.0 * 0.5
        );
    }
}
