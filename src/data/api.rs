//! HTTP client for the public NBA stats API
//!
//! Responses arrive as `resultSets`: an ordered list of tables, each a
//! header list plus a row list of loosely-typed cells. Tables are addressed
//! by their fixed position in the list; columns are resolved by header name
//! so a shape change fails fast instead of reading the wrong field.

use crate::{ApiConfig, GameId, HoopsError, PlayerId, Result, TeamId};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Decoded stats-API response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

/// One named table within a response
#[derive(Debug, Clone, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub rows: Vec<Vec<Value>>,
}

impl StatsResponse {
    /// Table at a fixed position, or a descriptive shape error.
    pub fn table(&self, index: usize, what: &str) -> Result<&ResultSet> {
        self.result_sets.get(index).ok_or_else(|| {
            HoopsError::MalformedResponse(format!("missing {} table at index {}", what, index))
        })
    }
}

impl ResultSet {
    /// Column index for a header, or a descriptive shape error.
    pub fn column(&self, header: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| {
                HoopsError::MalformedResponse(format!(
                    "table '{}' has no '{}' column",
                    self.name, header
                ))
            })
    }
}

/// Integer view of a cell. Absent and null cells count as zero; numeric
/// strings are parsed, fractional values truncate.
pub fn cell_i64(row: &[Value], index: usize) -> i64 {
    match row.get(index).unwrap_or(&Value::Null) {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().unwrap_or(0.0) as i64),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .or_else(|_| s.trim().parse::<f64>().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Float view of a cell, zero for absent/null.
pub fn cell_f64(row: &[Value], index: usize) -> f64 {
    match row.get(index).unwrap_or(&Value::Null) {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String view of a cell; absent, null and empty cells are None.
pub fn cell_str(row: &[Value], index: usize) -> Option<&str> {
    match row.get(index).unwrap_or(&Value::Null) {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

/// Player-card document served through the JSONP content endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerCard {
    pub sports_content: CardContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardContent {
    pub player: CardPlayer,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardPlayer {
    pub meta: CardMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardMeta {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub position_granular_full: String,
}

/// Client for the stats and content endpoints
pub struct StatsApi {
    client: reqwest::blocking::Client,
    stats_base: String,
    content_base: String,
}

impl StatsApi {
    pub fn new(config: &ApiConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("hoopsdb/0.1")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        StatsApi {
            client,
            stats_base: config.stats_base_url.trim_end_matches('/').to_string(),
            content_base: config.content_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Franchise directory for a league
    pub fn team_years(&self, league: &str) -> Result<StatsResponse> {
        self.get_stats(&format!(
            "{}/commonteamyears/?LeagueID={}",
            self.stats_base, league
        ))
    }

    /// One team's game log for a season
    pub fn team_game_log(&self, team: TeamId, season: &str) -> Result<StatsResponse> {
        self.get_stats(&format!(
            "{}/teamgamelog?TeamId={}&Season={}&SeasonType=Regular%20Season",
            self.stats_base, team.0, season
        ))
    }

    /// League-wide player directory for a season
    pub fn all_players(&self, league: &str, season: &str) -> Result<StatsResponse> {
        self.get_stats(&format!(
            "{}/commonallplayers/?LeagueID={}&Season={}&IsOnlyCurrentSeason=1",
            self.stats_base, league, season
        ))
    }

    /// Career season totals for a player (source of the age field)
    pub fn player_profile(&self, player: PlayerId) -> Result<StatsResponse> {
        self.get_stats(&format!(
            "{}/playerprofilev2/?PlayerID={}&PerMode=Totals",
            self.stats_base, player.0
        ))
    }

    /// Full box score for a game. The service expects the numeric id behind
    /// a "00" prefix.
    pub fn box_score(&self, game: GameId) -> Result<StatsResponse> {
        self.get_stats(&format!(
            "{}/boxscoreadvanced/?StartPeriod=1&EndPeriod=10&GameID=00{}&RangeType=0&StartRange=0&EndRange=10",
            self.stats_base, game.0
        ))
    }

    /// Player card (name + granular position), served as JSONP.
    pub fn player_card(&self, player_code: &str) -> Result<PlayerCard> {
        let url = format!("{}/{}/playercard.json", self.content_base, player_code);
        log::debug!("Fetching {}", url);
        let body = self.client.get(&url).send()?.error_for_status()?.text()?;
        serde_json::from_str(strip_jsonp(&body)).map_err(|e| {
            HoopsError::MalformedResponse(format!("invalid player card from {}: {}", url, e))
        })
    }

    fn get_stats(&self, url: &str) -> Result<StatsResponse> {
        log::debug!("Fetching {}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            HoopsError::MalformedResponse(format!("invalid stats response from {}: {}", url, e))
        })
    }
}

/// Strip the `callbackWrapper(...);` envelope from a JSONP body.
fn strip_jsonp(body: &str) -> &str {
    body.trim()
        .trim_start_matches("callbackWrapper(")
        .trim_end_matches(';')
        .trim_end_matches(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn api_for(server: &mockito::Server) -> StatsApi {
        let mut config = Config::default().api;
        config.stats_base_url = server.url();
        config.content_base_url = server.url();
        StatsApi::new(&config)
    }

    #[test]
    fn test_strip_jsonp() {
        assert_eq!(strip_jsonp(r#"callbackWrapper({"a": 1});"#), r#"{"a": 1}"#);
        assert_eq!(strip_jsonp(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_cell_coercion() {
        let row = vec![
            Value::Null,
            serde_json::json!(12),
            serde_json::json!("34"),
            serde_json::json!(0.425),
            serde_json::json!(""),
        ];
        assert_eq!(cell_i64(&row, 0), 0);
        assert_eq!(cell_i64(&row, 1), 12);
        assert_eq!(cell_i64(&row, 2), 34);
        assert_eq!(cell_f64(&row, 3), 0.425);
        assert_eq!(cell_f64(&row, 0), 0.0);
        assert_eq!(cell_str(&row, 4), None);
        assert_eq!(cell_str(&row, 2), Some("34"));
        // Off the end of a short row reads as absent
        assert_eq!(cell_i64(&row, 9), 0);
    }

    #[test]
    fn test_missing_table_is_a_shape_error() {
        let response = StatsResponse {
            result_sets: vec![],
        };
        let err = response.table(14, "team advanced stats").unwrap_err();
        assert!(err.to_string().contains("team advanced stats"));
    }

    #[test]
    fn test_missing_column_is_a_shape_error() {
        let table = ResultSet {
            name: "TeamStats".to_string(),
            headers: vec!["TEAM_ID".to_string()],
            rows: vec![],
        };
        assert_eq!(table.column("TEAM_ID").unwrap(), 0);
        let err = table.column("FGM").unwrap_err();
        assert!(err.to_string().contains("FGM"));
        assert!(err.to_string().contains("TeamStats"));
    }

    #[test]
    fn test_team_years_decodes_result_sets() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/commonteamyears/")
            .match_query(mockito::Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"resultSets": [{"name": "TeamYears",
                    "headers": ["LEAGUE_ID", "TEAM_ID", "MIN_YEAR", "MAX_YEAR", "ABBREVIATION"],
                    "rowSet": [["00", 1610612737, "1949", "2025", "ATL"],
                               ["00", 1610610023, "1947", "1950", null]]}]}"#,
            )
            .create();

        let api = api_for(&server);
        let response = api.team_years("00").unwrap();
        mock.assert();

        let table = response.table(0, "team years").unwrap();
        assert_eq!(table.rows.len(), 2);
        let id_col = table.column("TEAM_ID").unwrap();
        assert_eq!(cell_i64(&table.rows[0], id_col), 1610612737);
        let abbr_col = table.column("ABBREVIATION").unwrap();
        assert_eq!(cell_str(&table.rows[1], abbr_col), None);
    }

    #[test]
    fn test_player_card_unwraps_jsonp() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/ishmael_smith/playercard.json")
            .with_body(
                r#"callbackWrapper({"sports_content": {"player": {"meta":
                    {"first_name": "Ish", "last_name": "Smith",
                     "position_granular_full": "Point Guard"}}}});"#,
            )
            .create();

        let api = api_for(&server);
        let card = api.player_card("ishmael_smith").unwrap();
        assert_eq!(card.sports_content.player.meta.first_name, "Ish");
        assert_eq!(
            card.sports_content.player.meta.position_granular_full,
            "Point Guard"
        );
    }

    #[test]
    fn test_garbage_body_is_malformed_not_transient() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", mockito::Matcher::Regex("/boxscoreadvanced/.*".to_string()))
            .match_query(mockito::Matcher::Any)
            .with_body("<html>rate limited</html>")
            .create();

        let api = api_for(&server);
        let err = api.box_score(GameId(21500001)).unwrap_err();
        assert!(matches!(err, HoopsError::MalformedResponse(_)));
        assert!(!err.is_transient());
    }
}
