//! Aggregations over a season's match records: standings, xG averages,
//! fixture selection and season arithmetic.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tipster_models::{MatchRecord, PredictError, Result};

/// Month in which a new season starts.
const SEASON_START_MONTH: u32 = 8;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRow {
    pub rank: usize,
    pub team: String,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i64,
    pub points: u32,
}

impl TableRow {
    fn record(&mut self, goals_for: u32, goals_against: u32) {
        self.played += 1;
        self.goals_for += goals_for;
        self.goals_against += goals_against;
        self.goal_difference = i64::from(self.goals_for) - i64::from(self.goals_against);
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => {
                self.won += 1;
                self.points += 3;
            }
            std::cmp::Ordering::Equal => {
                self.drawn += 1;
                self.points += 1;
            }
            std::cmp::Ordering::Less => self.lost += 1,
        }
    }
}

/// Standings from finished matches, sorted by points, goal difference and goals
/// scored. Every team that appears in a fixture gets a row, played or not.
pub fn league_table(matches: &[MatchRecord]) -> Vec<TableRow> {
    let mut rows: BTreeMap<&str, TableRow> = BTreeMap::new();

    for record in matches {
        for team in [record.home_team.as_str(), record.away_team.as_str()] {
            rows.entry(team).or_insert_with(|| TableRow { team: team.to_string(), ..TableRow::default() });
        }
        if record.outcome().is_none() {
            continue;
        }
        if let Some(row) = rows.get_mut(record.home_team.as_str()) {
            row.record(record.home_goals, record.away_goals);
        }
        if let Some(row) = rows.get_mut(record.away_team.as_str()) {
            row.record(record.away_goals, record.home_goals);
        }
    }

    // BTreeMap iteration is alphabetical, so equal rows keep name order.
    let mut table: Vec<TableRow> = rows.into_values().collect();
    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_difference.cmp(&a.goal_difference))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
    });
    for (i, row) in table.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    table
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XgStats {
    pub team: String,
    pub matches: u32,
    pub xg_for: f64,
    pub xg_against: f64,
    pub xg_for_per_match: f64,
    pub xg_against_per_match: f64,
    /// Matches where actual goals stood in for missing xG.
    pub goal_proxies: u32,
}

/// Per-match xG for one team over its finished matches. Goals stand in for a
/// match without xG; with no matches at all both averages are `default_xg`.
pub fn team_xg_stats(matches: &[MatchRecord], team: &str, default_xg: f64) -> XgStats {
    let mut stats = XgStats {
        team: team.to_string(),
        matches: 0,
        xg_for: 0.0,
        xg_against: 0.0,
        xg_for_per_match: default_xg,
        xg_against_per_match: default_xg,
        goal_proxies: 0,
    };

    for record in matches.iter().filter(|m| m.finished) {
        let (created, conceded) = match record.xg_for_team(team) {
            Some(xg) => xg,
            None => match record.goals_for_team(team) {
                Some((scored, against)) => {
                    stats.goal_proxies += 1;
                    (f64::from(scored), f64::from(against))
                }
                None => continue,
            },
        };
        stats.matches += 1;
        stats.xg_for += created;
        stats.xg_against += conceded;
    }

    if stats.matches > 0 {
        let n = f64::from(stats.matches);
        stats.xg_for_per_match = stats.xg_for / n;
        stats.xg_against_per_match = stats.xg_against / n;
    }
    stats
}

/// Finished matches between exactly these two teams, either venue.
pub fn head_to_head<'a>(matches: &'a [MatchRecord], team_a: &str, team_b: &str) -> Vec<&'a MatchRecord> {
    matches
        .iter()
        .filter(|m| m.finished && m.is_between(team_a, team_b))
        .collect()
}

pub fn matchday(matches: &[MatchRecord], week: u32) -> Vec<&MatchRecord> {
    matches.iter().filter(|m| m.week == week).collect()
}

pub fn finished(matches: &[MatchRecord]) -> Vec<&MatchRecord> {
    matches.iter().filter(|m| m.finished).collect()
}

/// First week with an unplayed fixture, or the last week when everything is played.
pub fn current_matchday(matches: &[MatchRecord]) -> Option<u32> {
    matches
        .iter()
        .filter(|m| !m.finished)
        .map(|m| m.week)
        .min()
        .or_else(|| matches.iter().map(|m| m.week).max())
}

pub fn season_start_year(date: NaiveDate) -> i32 {
    if date.month() >= SEASON_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    }
}

pub fn season_string(start_year: i32) -> String {
    format!("{}-{}", start_year, start_year + 1)
}

/// Start year of a `"YYYY-YYYY"` season label.
pub fn parse_season_string(season: &str) -> Result<i32> {
    season
        .split('-')
        .next()
        .and_then(|year| year.trim().parse().ok())
        .ok_or_else(|| PredictError::Config(format!("Invalid season string: {}", season)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn season() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new(1, 1, date(2024, 8, 24), "A", "B").with_score(2, 0).with_xg(1.9, 0.7),
            MatchRecord::new(2, 1, date(2024, 8, 24), "C", "D").with_score(1, 1),
            MatchRecord::new(3, 2, date(2024, 8, 31), "B", "C").with_score(0, 3).with_xg(0.4, 2.2),
            MatchRecord::new(4, 2, date(2024, 8, 31), "D", "A").with_score(2, 2),
            MatchRecord::new(5, 3, date(2024, 9, 14), "A", "C"),
            MatchRecord::new(6, 3, date(2024, 9, 14), "B", "D"),
        ]
    }

    #[test]
    fn test_league_table_ordering() {
        let table = league_table(&season());
        let order: Vec<&str> = table.iter().map(|r| r.team.as_str()).collect();

        // A and C both on 4 points; C has the better goal difference.
        assert_eq!(order, vec!["C", "A", "D", "B"]);
        assert_eq!(table[0].rank, 1);
        assert_eq!(table[0].goal_difference, 3);
        assert_eq!(table[3].points, 0);
        assert_eq!(table[3].played, 2);
    }

    #[test]
    fn test_league_table_lists_unplayed_teams() {
        let fixtures = vec![MatchRecord::new(1, 1, date(2024, 8, 24), "X", "Y")];
        let table = league_table(&fixtures);

        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|r| r.played == 0));
        assert_eq!(table[0].team, "X");
    }

    #[test]
    fn test_xg_stats_mix_xg_and_goal_proxy() {
        let stats = team_xg_stats(&season(), "A", 1.5);

        assert_eq!(stats.matches, 2);
        assert_eq!(stats.goal_proxies, 1);
        assert!((stats.xg_for_per_match - (1.9 + 2.0) / 2.0).abs() < 1e-12);
        assert!((stats.xg_against_per_match - (0.7 + 2.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_xg_stats_default_without_matches() {
        let stats = team_xg_stats(&season(), "Z", 1.5);
        assert_eq!(stats.matches, 0);
        assert_eq!(stats.xg_for_per_match, 1.5);
        assert_eq!(stats.xg_against_per_match, 1.5);
    }

    #[test]
    fn test_fixture_selection() {
        let matches = season();
        assert_eq!(head_to_head(&matches, "C", "A").len(), 0);
        assert_eq!(head_to_head(&matches, "B", "A").len(), 1);
        assert_eq!(matchday(&matches, 2).len(), 2);
        assert_eq!(finished(&matches).len(), 4);
        assert_eq!(current_matchday(&matches), Some(3));
        assert_eq!(current_matchday(&[]), None);
    }

    #[test]
    fn test_season_helpers() {
        assert_eq!(season_start_year(date(2025, 1, 15)), 2024);
        assert_eq!(season_start_year(date(2025, 7, 31)), 2024);
        assert_eq!(season_start_year(date(2025, 8, 1)), 2025);
        assert_eq!(season_start_year(date(2024, 10, 3)), 2024);

        assert_eq!(season_string(2024), "2024-2025");
        assert_eq!(parse_season_string("2024-2025").unwrap(), 2024);
        assert!(parse_season_string("next year").is_err());
    }
}
