use super::*;

use async_trait::async_trait;
use serde_json::json;

use crate::auth::LoginInstructions;
use crate::remote::DialogEvent;
use crate::results::OutcomeCounts;
use crate::scripts;
use crate::testing::{Reaction, ScriptedPage, ScriptedSession};

struct SilentPrompt;

#[async_trait]
impl OperatorPrompt for SilentPrompt {
    async fn announce_login(&self, _instructions: &LoginInstructions) {}
}

const PROFILE: &str = "http://gamemaster.stanford.edu/homepage/profile.php";

fn config(results_path: std::path::PathBuf) -> Config {
    let mut config = Config::default();
    config.tournament.self_credential = "secret".to_string();
    config.tournament.rounds_per_side = 2;
    config.tournament.results_path = results_path;
    config
}

fn finished(ours: u32, theirs: u32) -> Vec<Reaction> {
    vec![
        Reaction::SetText(format!("aero {} zj {}", ours, theirs)),
        Reaction::SetCells(vec![ours.to_string(), theirs.to_string()]),
    ]
}

/// A site where sign-in completes at once and the artifact is on file.
fn site(rounds: Vec<Vec<Reaction>>) -> (Arc<ScriptedSession>, Arc<ScriptedPage>) {
    let manager = ScriptedPage::at(
        "manager",
        "http://gamemaster.stanford.edu/homepage/manager.php?game=tictactoe3",
    );
    manager.on_evaluate("/* tag-slots */", vec![json!(2)]);
    manager.add_element(&scripts::slot_selector(0));
    manager.add_element(&scripts::slot_selector(1));
    manager.on_evaluate("/* bind-slot */", vec![json!("editor")]);
    manager.add_element(scripts::PING_CONTROL);
    manager.on_click(
        scripts::PING_CONTROL,
        vec![vec![Reaction::Dialog(DialogEvent {
            kind: "alert".into(),
            message: "All players ready".into(),
        })]],
    );
    manager.add_element(scripts::RUN_CONTROL);
    manager.on_click(scripts::RUN_CONTROL, rounds);

    let main = ScriptedPage::new("main");
    main.on_navigate(
        "signin",
        vec![
            Reaction::SetUrl(PROFILE.into()),
            Reaction::SetUploadLink(true),
            Reaction::SetText("Player: aero".into()),
        ],
    );
    main.on_navigate("profile", vec![Reaction::SetText("Player: aero (uploaded)".into())]);
    main.on_evaluate("/* mark-manager-link */", vec![json!(true)]);
    main.add_element(scripts::MANAGER_LINK);
    main.on_click(scripts::MANAGER_LINK, vec![vec![Reaction::OpenView(manager.clone())]]);

    let session = ScriptedSession::new();
    session.prepare(main);
    (session, manager)
}

#[tokio::test(start_paused = true)]
async fn test_full_tournament() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tournament_results.json");
    let (session, manager) = site(vec![
        finished(100, 0),
        finished(0, 100),
        finished(50, 50),
        finished(100, 0),
    ]);

    let result = Workflow::new(config(path.clone()), Arc::new(SilentPrompt))
        .run(session.clone())
        .await
        .unwrap();

    assert_eq!(result.total_rounds, 4);
    assert_eq!(result.results, OutcomeCounts { wins: 2, draws: 1, losses: 1 });
    assert!(result.aborted.is_none());
    assert_eq!(manager.click_count(scripts::RUN_CONTROL), 4);
    // already on file, so nothing was uploaded
    assert!(session.scripted_pages()[0].uploads().is_empty());

    let saved = TournamentResult::load(&path).unwrap();
    assert_eq!(saved, result);
}

#[tokio::test(start_paused = true)]
async fn test_aborted_loop_persists_partial_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tournament_results.json");
    let (session, _manager) = site(vec![
        finished(100, 0),
        vec![Reaction::SetText("Control: zj".into())],
    ]);

    let err = Workflow::new(config(path.clone()), Arc::new(SilentPrompt))
        .run(session)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::RoundTimeout { round: 2, .. }));

    let saved = TournamentResult::load(&path).unwrap();
    assert_eq!(saved.total_rounds, 1);
    assert_eq!(saved.rounds_requested, 4);
    assert_eq!(saved.results.total(), saved.total_rounds);
    assert!(saved.aborted.unwrap().contains("Round 2"));
}

#[tokio::test(start_paused = true)]
async fn test_reuses_existing_page() {
    let dir = tempfile::tempdir().unwrap();
    let (session, _manager) = site(vec![finished(100, 0)]);
    let mut config = config(dir.path().join("results.json"));
    config.tournament.rounds_per_side = 1;

    // open the main page up front, as a freshly launched browser would have
    let first = session.open_page(None).await.unwrap();
    Workflow::new(config, Arc::new(SilentPrompt))
        .run(session.clone())
        .await
        .unwrap();

    assert_eq!(first.id(), "main");
    // main + two participant endpoints; the manager view was opened by a click
    assert_eq!(session.opened(), 3);
}
