//! Static metadata for the IPL statistics database
//!
//! The database is populated by an external loader; this module only
//! records the tables and columns the prompt advertises so the live file
//! can be checked against them and engine errors can carry a hint.

use lazy_static::lazy_static;
use regex::Regex;
use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for an identifier suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const IPL_SCHEMA: &[TableDef] = &[
    TableDef {
        name: "ball_by_ball",
        columns: &[
            "season_id",
            "match_id",
            "batter",
            "bowler",
            "non_striker",
            "team_batting",
            "team_bowling",
            "over_number",
            "ball_number",
            "batter_runs",
            "extras",
            "total_runs",
            "batsman_type",
            "bowler_type",
            "player_out",
            "fielders_involved",
            "is_wicket",
            "is_wide_ball",
            "is_no_ball",
            "is_leg_bye",
            "is_bye",
            "is_penalty",
            "wide_ball_runs",
            "no_ball_runs",
            "leg_bye_runs",
            "bye_runs",
            "penalty_runs",
            "wicket_kind",
            "is_super_over",
            "innings",
        ],
    },
    TableDef {
        name: "match_data",
        columns: &[
            "match_id",
            "season_id",
            "balls_per_over",
            "city",
            "match_date",
            "event_name",
            "match_number",
            "gender",
            "match_type",
            "format",
            "overs",
            "season",
            "team_type",
            "venue",
            "toss_winner",
            "team1",
            "team2",
            "toss_decision",
            "match_winner",
            "win_by_runs",
            "win_by_wickets",
            "player_of_match",
            "result",
        ],
    },
    TableDef {
        name: "players",
        columns: &[
            "player_id",
            "player_name",
            "bat_style",
            "bowl_style",
            "field_pos",
            "player_full_name",
        ],
    },
    TableDef {
        name: "teams",
        columns: &["team_id", "team_name"],
    },
    TableDef {
        name: "team_aliases",
        columns: &["alias_id", "team_id", "alias_name"],
    },
];

lazy_static! {
    static ref UNKNOWN_IDENTIFIER: Regex =
        Regex::new(r"no such (?:column|table): ([A-Za-z0-9_.]+)").expect("valid regex");
}

/// Closest known table or column name to `name`, ignoring any `alias.` prefix.
pub fn suggest_identifier(name: &str) -> Option<&'static str> {
    let bare = name.rsplit('.').next().unwrap_or(name).to_lowercase();
    if bare.is_empty() {
        return None;
    }

    IPL_SCHEMA
        .iter()
        .flat_map(|t| std::iter::once(t.name).chain(t.columns.iter().copied()))
        .filter(|candidate| *candidate != bare)
        .map(|candidate| (candidate, jaro_winkler(&bare, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}

/// Extracts the unknown identifier from an engine error such as
/// `no such column: b.batsman` and suggests a known one.
pub fn hint_for_engine_error(error: &str) -> Option<String> {
    let caps = UNKNOWN_IDENTIFIER.captures(error)?;
    let unknown = caps.get(1)?.as_str();
    suggest_identifier(unknown).map(|known| format!("did you mean `{}`?", known))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_tables_are_in_bundled_prompt() {
        let prompt = crate::prompt::PromptTemplate::bundled();
        for table in IPL_SCHEMA {
            assert!(prompt.text().contains(table.name), "{} not advertised", table.name);
            for column in table.columns {
                assert!(prompt.text().contains(column), "{}.{} not advertised", table.name, column);
            }
        }
    }

    #[test]
    fn test_suggest_identifier() {
        assert_eq!(suggest_identifier("b.batter_run"), Some("batter_runs"));
        assert_eq!(suggest_identifier("player_nme"), Some("player_name"));
        assert_eq!(suggest_identifier("zzzz"), None);
    }

    #[test]
    fn test_hint_for_engine_error() {
        assert_eq!(
            hint_for_engine_error("no such column: m.seasn").as_deref(),
            Some("did you mean `season`?")
        );
        assert_eq!(
            hint_for_engine_error("no such table: team_alias").as_deref(),
            Some("did you mean `team_aliases`?")
        );
        assert!(hint_for_engine_error("near \"SELEC\": syntax error").is_none());
        assert!(hint_for_engine_error("no such column: foo").is_none());
    }
}
