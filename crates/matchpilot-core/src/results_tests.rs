use super::*;

fn outcome(round: u32, ours: u32, theirs: u32) -> RoundOutcome {
    RoundOutcome::new(round, ScorePair { ours, theirs })
}

#[test]
fn test_score_classification() {
    let layout = ScoreLayout::default();
    assert_eq!(layout.pair(&[100, 0]).unwrap().kind(), OutcomeKind::Win);
    assert_eq!(layout.pair(&[0, 100]).unwrap().kind(), OutcomeKind::Loss);
    assert_eq!(layout.pair(&[50, 50]).unwrap().kind(), OutcomeKind::Draw);
}

#[test]
fn test_score_layout_self_second() {
    let layout = ScoreLayout::self_at(1);
    let pair = layout.pair(&[100, 0]).unwrap();
    assert_eq!(pair, ScorePair { ours: 0, theirs: 100 });
    assert_eq!(pair.kind(), OutcomeKind::Loss);
}

#[test]
fn test_score_layout_needs_two_scores() {
    assert!(ScoreLayout::default().pair(&[100]).is_none());
    assert!(ScoreLayout::default().pair(&[]).is_none());
}

#[test]
fn test_aggregate_counts_sum_to_rounds() {
    let mut agg = ResultsAggregator::new();
    agg.record(outcome(1, 100, 0));
    agg.record(outcome(2, 0, 100));
    agg.record(outcome(3, 50, 50));
    agg.record(outcome(4, 100, 0));

    let counts = agg.counts();
    assert_eq!(counts, OutcomeCounts { wins: 2, draws: 1, losses: 1 });
    assert_eq!(counts.total(), 4);
    assert_eq!(agg.rounds().len(), 4);
}

#[test]
fn test_percentages_round_to_one_decimal() {
    let mut agg = ResultsAggregator::new();
    agg.record(outcome(1, 100, 0));
    agg.record(outcome(2, 0, 100));
    agg.record(outcome(3, 0, 100));

    let result = agg.finalize("TicTacToe3", "zj", 10);
    assert_eq!(result.total_rounds, 3);
    assert_eq!(result.rounds_requested, 10);
    let pct = result.percentages();
    assert_eq!(pct.wins, 33.3);
    assert_eq!(pct.draws, 0.0);
    assert_eq!(pct.losses, 66.7);
}

#[test]
fn test_percentages_with_no_rounds() {
    let result = ResultsAggregator::new().finalize("TicTacToe3", "zj", 10);
    let pct = result.percentages();
    assert_eq!((pct.wins, pct.draws, pct.losses), (0.0, 0.0, 0.0));
}

#[test]
fn test_persisted_record_shape() {
    let mut agg = ResultsAggregator::new();
    agg.record(outcome(1, 100, 0));
    let result = agg.finalize("TicTacToe3", "zj", 2);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["game"], "TicTacToe3");
    assert_eq!(value["opponent"], "zj");
    assert_eq!(value["totalGames"], 1);
    assert_eq!(value["results"]["wins"], 1);
    assert!(value["timestamp"].as_str().unwrap().contains('T'));
    assert!(value.get("aborted").is_none());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tournament_results.json");

    let mut agg = ResultsAggregator::new();
    agg.record(outcome(1, 50, 50));
    let result = agg.finalize("TicTacToe3", "zj", 4).with_abort("Round 2 did not finish");
    result.save(&path).unwrap();

    let loaded = TournamentResult::load(&path).unwrap();
    assert_eq!(loaded, result);
}

#[test]
fn test_report_lists_counts_and_abort() {
    let mut agg = ResultsAggregator::new();
    agg.record(outcome(1, 100, 0));
    agg.record(outcome(2, 0, 100));
    let report = agg
        .finalize("TicTacToe3", "zj", 10)
        .with_abort("Round 3 did not finish within 60s")
        .report();

    assert!(report.contains("Total Games: 2 of 10 requested"));
    assert!(report.contains("Wins: 1 (50.0%)"));
    assert!(report.contains("Losses: 1 (50.0%)"));
    assert!(report.contains("Aborted: Round 3"));
}
