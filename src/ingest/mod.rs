//! Box-score ingestion core
//!
//! Turns one game's raw API response into the flat team and player records
//! the database stores: extraction, derived metrics, then assembly. The
//! whole module is a pure transform over an already-fetched response.

pub mod assemble;
pub mod derive;
pub mod extract;

pub use assemble::{PlayerGameRecord, TeamGameRecord};
pub use extract::{GameBox, PlayerRaw, TeamRaw};

use crate::data::api::StatsResponse;
use crate::{GameId, Result, ScoringConfig};

/// Transform one game's box-score response into its storage records:
/// two team records (each naming the other as opponent) and one record
/// per player in the basic stats table.
pub fn box_score_records(
    game_id: GameId,
    response: &StatsResponse,
    scoring: &ScoringConfig,
) -> Result<(Vec<TeamGameRecord>, Vec<PlayerGameRecord>)> {
    let game = extract::extract_box(response)?;
    let teams = assemble::team_records(game_id, &game)?;
    let players = assemble::player_records(game_id, &game, scoring);
    Ok((teams, players))
}
