use super::*;

use crate::classifier::HeuristicClassifier;
use crate::results::{OutcomeCounts, OutcomeKind};
use crate::testing::{Reaction, ScriptedPage};

fn settings(total_rounds: u32) -> MatchSettings {
    MatchSettings {
        total_rounds,
        round_timeout: Duration::from_secs(60),
        inter_round_delay: Duration::from_secs(1),
        poll_interval: Duration::from_millis(250),
        score_layout: ScoreLayout::default(),
    }
}

fn finished(ours: u32, theirs: u32) -> Vec<Reaction> {
    vec![
        Reaction::SetText(format!("aero {} zj {}", ours, theirs)),
        Reaction::SetCells(vec![
            "aero".into(),
            ours.to_string(),
            "zj".into(),
            theirs.to_string(),
        ]),
    ]
}

fn in_progress() -> Vec<Reaction> {
    vec![
        Reaction::SetText("Control: aero, step 4".into()),
        Reaction::SetCells(vec!["aero".into(), "zj".into()]),
    ]
}

fn manager_with(rounds: Vec<Vec<Reaction>>) -> Arc<ScriptedPage> {
    let page = ScriptedPage::new("manager");
    page.add_element(scripts::RUN_CONTROL);
    page.on_click(scripts::RUN_CONTROL, rounds);
    page
}

fn match_loop(total_rounds: u32) -> MatchLoop {
    MatchLoop::new(settings(total_rounds), Arc::new(HeuristicClassifier::new()))
}

#[tokio::test(start_paused = true)]
async fn test_alternating_results() {
    let rounds = (0..10)
        .map(|i| if i % 2 == 0 { finished(100, 0) } else { finished(0, 100) })
        .collect();
    let page = manager_with(rounds);
    let mut results = ResultsAggregator::new();

    let outcomes = match_loop(10).run_rounds(page.as_ref(), &mut results).await.unwrap();

    assert_eq!(outcomes.len(), 10);
    assert_eq!(outcomes[0].kind, OutcomeKind::Win);
    assert_eq!(outcomes[1].kind, OutcomeKind::Loss);
    assert_eq!(results.counts(), OutcomeCounts { wins: 5, draws: 0, losses: 5 });

    let summary = results.finalize("TicTacToe3", "zj", 10);
    let pct = summary.percentages();
    assert_eq!((pct.wins, pct.draws, pct.losses), (50.0, 0.0, 50.0));
    assert_eq!(page.click_count(scripts::RUN_CONTROL), 10);
}

#[tokio::test(start_paused = true)]
async fn test_draw() {
    let page = manager_with(vec![finished(50, 50)]);
    let mut results = ResultsAggregator::new();

    match_loop(1).run_rounds(page.as_ref(), &mut results).await.unwrap();
    assert_eq!(results.counts(), OutcomeCounts { wins: 0, draws: 1, losses: 0 });
}

#[tokio::test(start_paused = true)]
async fn test_round_timeout_keeps_partial_results() {
    let page = manager_with(vec![finished(100, 0), finished(50, 50), in_progress()]);
    let mut results = ResultsAggregator::new();
    let start = tokio::time::Instant::now();

    let err = match_loop(6)
        .run_rounds(page.as_ref(), &mut results)
        .await
        .unwrap_err();

    match err {
        WorkflowError::RoundTimeout { round, waited } => {
            assert_eq!(round, 3);
            assert_eq!(waited, Duration::from_secs(60));
        }
        other => panic!("expected round timeout, got {other:?}"),
    }
    assert_eq!(results.completed(), 2);
    assert_eq!(results.counts(), OutcomeCounts { wins: 1, draws: 1, losses: 0 });
    // two inter-round delays plus the full round deadline
    assert_eq!(start.elapsed(), Duration::from_secs(62));
}

#[tokio::test(start_paused = true)]
async fn test_missing_run_control_skips_rounds() {
    let page = ScriptedPage::new("manager");
    let mut results = ResultsAggregator::new();

    let outcomes = match_loop(4).run_rounds(page.as_ref(), &mut results).await.unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(results.completed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_score_counts_as_draw_and_play_continues() {
    let page = manager_with(vec![
        finished(100, 0),
        vec![
            Reaction::SetText("aero 100".into()),
            Reaction::SetCells(vec!["aero".into(), "100".into()]),
        ],
        finished(0, 100),
    ]);
    let mut results = ResultsAggregator::new();

    let outcomes = match_loop(3).run_rounds(page.as_ref(), &mut results).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[1].kind, OutcomeKind::Draw);
    assert_eq!(outcomes[1].unreadable, Some(vec![100]));
    assert_eq!(outcomes[2].unreadable, None);
    assert_eq!(results.completed(), 3);
    assert_eq!(results.counts(), OutcomeCounts { wins: 1, draws: 1, losses: 1 });
    assert_eq!(page.click_count(scripts::RUN_CONTROL), 3);
}

#[tokio::test(start_paused = true)]
async fn test_self_score_index_swaps_sides() {
    let page = manager_with(vec![finished(100, 0)]);
    let mut settings = settings(1);
    settings.score_layout = ScoreLayout::self_at(1);
    let mut results = ResultsAggregator::new();

    MatchLoop::new(settings, Arc::new(HeuristicClassifier::new()))
        .run_rounds(page.as_ref(), &mut results)
        .await
        .unwrap();
    assert_eq!(results.counts().losses, 1);
}
