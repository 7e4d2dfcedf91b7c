use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One fixture, finished or upcoming. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchRecord {
    pub match_id: u32,
    pub week: u32,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_xg: Option<f64>,
    pub away_xg: Option<f64>,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchOutcome {
    HomeWin,
    Draw,
    AwayWin,
}

impl MatchRecord {
    pub fn new(
        match_id: u32,
        week: u32,
        date: NaiveDate,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
    ) -> Self {
        Self {
            match_id,
            week,
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals: 0,
            away_goals: 0,
            home_xg: None,
            away_xg: None,
            finished: false,
        }
    }

    /// Records the final score and marks the match finished.
    pub fn with_score(mut self, home_goals: u32, away_goals: u32) -> Self {
        self.home_goals = home_goals;
        self.away_goals = away_goals;
        self.finished = true;
        self
    }

    pub fn with_xg(mut self, home_xg: f64, away_xg: f64) -> Self {
        self.home_xg = Some(home_xg);
        self.away_xg = Some(away_xg);
        self
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        if !self.finished {
            return None;
        }
        Some(match self.home_goals.cmp(&self.away_goals) {
            std::cmp::Ordering::Greater => MatchOutcome::HomeWin,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::AwayWin,
        })
    }

    /// True when the fixture is between exactly these two teams, either venue.
    pub fn is_between(&self, team_a: &str, team_b: &str) -> bool {
        (self.home_team == team_a && self.away_team == team_b)
            || (self.home_team == team_b && self.away_team == team_a)
    }

    /// Goals scored and conceded from `team`'s point of view.
    pub fn goals_for_team(&self, team: &str) -> Option<(u32, u32)> {
        if self.home_team == team {
            Some((self.home_goals, self.away_goals))
        } else if self.away_team == team {
            Some((self.away_goals, self.home_goals))
        } else {
            None
        }
    }

    /// xG created and conceded from `team`'s point of view, when the match carries xG.
    pub fn xg_for_team(&self, team: &str) -> Option<(f64, f64)> {
        let (home_xg, away_xg) = (self.home_xg?, self.away_xg?);
        if self.home_team == team {
            Some((home_xg, away_xg))
        } else if self.away_team == team {
            Some((away_xg, home_xg))
        } else {
            None
        }
    }
}
