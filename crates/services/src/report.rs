use tipster_models::{OddsMode, PredictionReport, StrengthPair};

const RULE_WIDTH: usize = 70;

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn pair_line(label: &str, pair: &StrengthPair) -> String {
    format!("  {:<12} Home {:>6} | Away {:>6}", label, pct(pair.home), pct(pair.away))
}

fn section(lines: &mut Vec<String>, title: String, light: &str) {
    lines.push(String::new());
    lines.push(title);
    lines.push(light.to_string());
}

/// Human-readable rendering of a prediction. Every number in the report is shown.
pub fn format_prediction_report(report: &PredictionReport) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let mut lines = vec![heavy.clone(), format!("MATCH PREDICTION: {} vs {}", report.home_team, report.away_team)];

    if let Some(info) = &report.match_info {
        let mut details = Vec::new();
        if let Some(week) = info.week {
            details.push(format!("Matchday {}", week));
        }
        if let Some(date) = info.date {
            details.push(date.format("%Y-%m-%d").to_string());
        }
        if let Some(venue) = &info.venue {
            details.push(venue.clone());
        }
        if !details.is_empty() {
            lines.push(details.join(" | "));
        }
    }
    lines.push(heavy.clone());

    section(&mut lines, "MATCH OUTCOME PROBABILITIES:".to_string(), &light);
    lines.push(format!("  Home Win: {:>6}", pct(report.outcome.home_win)));
    lines.push(format!("  Draw:     {:>6}", pct(report.outcome.draw)));
    lines.push(format!("  Away Win: {:>6}", pct(report.outcome.away_win)));

    section(&mut lines, "EXPECTED GOALS:".to_string(), &light);
    lines.push(format!("  {:<30}: {:.2}", report.home_team, report.home_lambda));
    lines.push(format!("  {:<30}: {:.2}", report.away_team, report.away_lambda));
    if let Some((home, away)) = report.odds_lambdas {
        lines.push(format!("  Odds-implied: {:.2} - {:.2}", home, away));
    }

    section(&mut lines, "MOST LIKELY SCORE:".to_string(), &light);
    lines.push(format!(
        "  {} ({})",
        report.most_likely_score.label(),
        pct(report.most_likely_score.probability)
    ));

    section(&mut lines, format!("TOP {} PROBABLE SCORES:", report.top_scores.len()), &light);
    lines.extend(
        report
            .top_scores
            .iter()
            .map(|score| format!("  {:>5} - {:>6}", score.label(), pct(score.probability))),
    );

    let ou = &report.over_under;
    section(&mut lines, "BETTING INSIGHTS:".to_string(), &light);
    lines.push(format!("  Total goals λ:   {:.2}", ou.total_lambda));
    lines.push(format!("  Over {} Goals:  {}", ou.threshold, pct(ou.over)));
    lines.push(format!("  Under {} Goals: {}", ou.threshold, pct(ou.under)));
    lines.push(format!("  BTTS Yes:        {}", pct(report.btts.yes)));
    lines.push(format!("  BTTS No:         {}", pct(report.btts.no)));
    lines.push(format!(
        "  Clean sheet:     Home {} | Away {}",
        pct(report.btts.away_zero),
        pct(report.btts.home_zero)
    ));

    let factors = &report.breakdown;
    section(&mut lines, "FACTOR BREAKDOWN:".to_string(), &light);
    lines.push(pair_line("Rating:", &factors.rating));
    lines.push(pair_line("xG:", &factors.xg));
    lines.push(pair_line("Squad Value:", &factors.squad_value));
    lines.push(pair_line("H2H:", &factors.h2h));
    if let Some(odds) = &factors.odds {
        lines.push(pair_line("Odds:", odds));
    }
    lines.push(format!(
        "  {:<12} Home -{} | Away -{}",
        "Injuries:",
        pct(factors.injury_penalty.home),
        pct(factors.injury_penalty.away)
    ));
    lines.push(String::new());
    lines.push(pair_line("Combined:", &report.combined));

    let mode = match report.odds_mode {
        OddsMode::Factor => "factor",
        OddsMode::Calibration => "calibration",
    };
    lines.push(String::new());
    lines.push(format!("  Odds mode: {}", mode));
    if let Some(source) = &report.home_source {
        lines.push(format!("  Source ({}): {}", report.home_team, source));
    }
    if let Some(source) = &report.away_source {
        lines.push(format!("  Source ({}): {}", report.away_team, source));
    }
    if !report.defaulted.is_empty() {
        lines.push(format!("  Defaults used: {}", report.defaulted.join(", ")));
    }

    lines.push(String::new());
    lines.push(heavy);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{EngineConfig, PredictionEngine};
    use chrono::NaiveDate;
    use tipster_models::{FactorSnapshot, MatchInfo};

    fn sample_report() -> PredictionReport {
        let engine = PredictionEngine::new(EngineConfig::default()).unwrap();
        let home = FactorSnapshot::new("Bayern München", 1900.0).with_xg(2.4, 0.9).with_source("mock");
        let away = FactorSnapshot::new("VfL Bochum", 1610.0);
        let info = MatchInfo {
            week: Some(16),
            date: NaiveDate::from_ymd_opt(2024, 12, 14),
            venue: Some("Allianz Arena".to_string()),
        };
        engine.predict_match("Bayern München", "VfL Bochum", &home, &away, &[], None, Some(info))
    }

    #[test]
    fn test_report_contains_every_section() {
        let report = sample_report();
        let text = format_prediction_report(&report);

        assert!(text.contains("MATCH PREDICTION: Bayern München vs VfL Bochum"));
        assert!(text.contains("Matchday 16 | 2024-12-14 | Allianz Arena"));
        assert!(text.contains(&pct(report.outcome.home_win)));
        assert!(text.contains(&pct(report.outcome.draw)));
        assert!(text.contains(&pct(report.outcome.away_win)));
        assert!(text.contains(&format!("{:.2}", report.home_lambda)));
        assert!(text.contains(&format!("{:.2}", report.away_lambda)));
        assert!(text.contains(&report.most_likely_score.label()));
        for score in &report.top_scores {
            assert!(text.contains(&score.label()));
        }
        assert!(text.contains(&format!("Over 2.5 Goals:  {}", pct(report.over_under.over))));
        assert!(text.contains(&format!("BTTS Yes:        {}", pct(report.btts.yes))));
        assert!(text.contains("Squad Value:"));
        assert!(text.contains("Injuries:"));
        assert!(text.contains("Combined:"));
        assert!(text.contains("Source (Bayern München): mock"));
        assert!(text.contains("VfL Bochum.squad_value"));
    }

    #[test]
    fn test_report_layout_is_line_based() {
        let text = format_prediction_report(&sample_report());
        let lines: Vec<&str> = text.lines().collect();
        let heavy = "=".repeat(RULE_WIDTH);

        assert_eq!(lines.first().copied(), Some(heavy.as_str()));
        assert_eq!(lines.last().copied(), Some(heavy.as_str()));
        assert!(!text.ends_with('\n'));
        for title in ["MATCH OUTCOME PROBABILITIES:", "EXPECTED GOALS:", "BETTING INSIGHTS:", "FACTOR BREAKDOWN:"] {
            let idx = lines.iter().position(|line| *line == title).unwrap();
            assert_eq!(lines[idx - 1], "");
            assert_eq!(lines[idx + 1], "-".repeat(RULE_WIDTH));
        }
    }

    #[test]
    fn test_report_is_deterministic() {
        let report = sample_report();
        assert_eq!(format_prediction_report(&report), format_prediction_report(&report));
    }
}
