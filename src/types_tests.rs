//! Tests for core types

#[cfg(test)]
mod tests {
    use super::super::types::*;

    #[test]
    fn test_form_result_values() {
        assert_eq!(FormResult::W.value(), 1.0);
        assert_eq!(FormResult::D.value(), 0.5);
        assert_eq!(FormResult::L.value(), 0.0);

        assert_eq!(FormResult::W.signal(), 1.0);
        assert_eq!(FormResult::D.signal(), 0.0);
        assert_eq!(FormResult::L.signal(), -1.0);
    }

    #[test]
    fn test_form_result_parsing() {
        assert_eq!(FormResult::from_char('W'), Some(FormResult::W));
        assert_eq!(FormResult::from_char('l'), Some(FormResult::L));
        assert_eq!(FormResult::from_char('d'), Some(FormResult::D));
        assert_eq!(FormResult::from_char('x'), None);
    }

    #[test]
    fn test_record_win_pct() {
        let team = |record: &str| TeamSnapshot {
            id: "t".to_string(),
            name: "t".to_string(),
            record: record.to_string(),
            recent_form: vec![],
            logo_url: None,
        };

        assert_eq!(team("15-5").record_win_pct(), Some(0.75));
        assert_eq!(team("0-10").record_win_pct(), Some(0.0));
        assert_eq!(team(" 12 - 8 ").record_win_pct(), Some(0.6));
        assert_eq!(team("0-0").record_win_pct(), None);
        assert_eq!(team("garbage").record_win_pct(), None);
        assert_eq!(team("").record_win_pct(), None);
    }

    #[test]
    fn test_odds_for_recommendation() {
        let odds = OddsSnapshot {
            home: 1.8,
            away: 2.1,
            draw: Some(3.4),
            spread: None,
            total: None,
        };

        assert_eq!(odds.for_recommendation(Recommendation::Home), Some(1.8));
        assert_eq!(odds.for_recommendation(Recommendation::Away), Some(2.1));
        assert_eq!(odds.for_recommendation(Recommendation::Draw), Some(3.4));
        assert_eq!(odds.for_recommendation(Recommendation::Skip), None);

        let no_draw = OddsSnapshot { draw: None, ..odds };
        assert_eq!(no_draw.for_recommendation(Recommendation::Draw), None);
    }

    #[test]
    fn test_head_to_head_win_pct() {
        let record = HeadToHeadRecord {
            home_wins: 6,
            away_wins: 3,
            draws: 1,
            total_games: 10,
            avg_home_score: 2.1,
            avg_away_score: 1.4,
        };
        assert_eq!(record.home_win_pct(), Some(0.6));

        assert_eq!(HeadToHeadRecord::default().home_win_pct(), None);
    }

    #[test]
    fn test_strength_metrics_overall() {
        let metrics = StrengthMetrics {
            offense: 70.0,
            defense: 60.0,
            momentum: 50.0,
        };
        assert_eq!(metrics.overall(), 60.0);
        assert_eq!(StrengthMetrics::NEUTRAL.overall(), 50.0);
    }

    #[test]
    fn test_algorithm_id_display() {
        assert_eq!(AlgorithmId::MlPowerIndex.to_string(), "ml_power_index");
        assert_eq!(AlgorithmId::ValuePickFinder.to_string(), "value_pick_finder");
        assert_eq!(AlgorithmId::StatisticalEdge.to_string(), "statistical_edge");
        assert_eq!(AlgorithmId::ALL.len(), 3);
    }

    #[test]
    fn test_equal_split_sums_to_one() {
        let weights = AlgorithmWeight::equal_split();
        let total: f64 = weights.iter().map(|w| w.weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(weights.iter().all(|w| w.reliability == 0.0));
    }

    #[test]
    fn test_match_input_deserializes_from_fixture_json() {
        let json = r#"{
            "id": "nba-2026-001",
            "home": {
                "id": "lal", "name": "Lakers", "record": "15-5",
                "recent_form": ["W", "W", "L", "W", "D"],
                "logo_url": null
            },
            "away": {
                "id": "bos", "name": "Celtics", "record": "12-8",
                "logo_url": null
            },
            "league": "NBA",
            "kickoff": "2026-09-01T19:00:00Z",
            "status": "scheduled",
            "current_score": null,
            "odds": { "home": 1.9, "away": 2.0, "draw": null, "spread": null, "total": null }
        }"#;

        let input: MatchInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.home.recent_form.len(), 5);
        // recent_form is optional in fixture files
        assert!(input.away.recent_form.is_empty());
        assert_eq!(input.status, MatchStatus::Scheduled);
        assert_eq!(input.odds.unwrap().home, 1.9);
    }
}
