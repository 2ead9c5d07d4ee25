use super::*;

fn aero() -> ParticipantIdentity {
    ParticipantIdentity::new("aero", "secret")
}

fn snapshot(url: &str, text: &str) -> PageSnapshot {
    PageSnapshot {
        url: url.to_string(),
        text: text.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_dashboard_rejected_on_login_page() {
    let c = HeuristicClassifier::new();
    let mut snap = snapshot("http://site/homepage/signin.php", "Player: aero");
    snap.has_upload_link = true;
    assert!(!c.is_dashboard(&snap, &aero()));
}

#[test]
fn test_dashboard_needs_a_marker() {
    let c = HeuristicClassifier::new();
    let me = aero();

    assert!(!c.is_dashboard(&snapshot("http://site/homepage/index.php", "Welcome"), &me));
    assert!(c.is_dashboard(&snapshot("http://site/homepage/index.php", "Player: someone"), &me));
    assert!(c.is_dashboard(&snapshot("http://site/homepage/profile.php", "hello aero"), &me));

    let mut snap = snapshot("http://site/homepage/profile.php", "");
    snap.has_run_link = true;
    assert!(c.is_dashboard(&snap, &me));
}

#[test]
fn test_custom_login_marker() {
    let c = HeuristicClassifier::new().with_login_marker("login");
    let snap = snapshot("http://site/signin.php", "Player: aero");
    assert!(c.is_dashboard(&snap, &aero()));
}

#[test]
fn test_is_registered_markers() {
    let c = HeuristicClassifier::new();
    let me = aero();

    assert!(c.is_registered("Player aero already exists", &me));
    assert!(c.is_registered("aero.html uploaded", &me));
    assert!(c.is_registered("Aero: active", &me));
    assert!(c.is_registered("Player: AERO", &me));
    assert!(!c.is_registered("aero", &me));
    assert!(!c.is_registered("zj already exists", &me));
}

#[test]
fn test_mentions_identity() {
    let c = HeuristicClassifier::new();
    assert!(c.mentions_identity("Logged in as AERO", &aero()));
    assert!(!c.mentions_identity("Logged in", &aero()));
    assert!(!c.mentions_identity("anything", &ParticipantIdentity::named("")));
}

#[test]
fn test_upload_confirmation() {
    let c = HeuristicClassifier::new();
    assert_eq!(
        c.upload_confirmation("Error: player Already Exists"),
        Some(UploadConfirmation::AlreadyExists)
    );
    assert_eq!(c.upload_confirmation("File uploaded"), Some(UploadConfirmation::Accepted));
    assert_eq!(c.upload_confirmation("Success!"), Some(UploadConfirmation::Accepted));
    assert_eq!(c.upload_confirmation("Upload your player"), None);
}

#[test]
fn test_round_finished_heuristic() {
    let c = HeuristicClassifier::new();
    assert!(c.round_finished("aero 100 zj 0"));
    assert!(c.round_finished("aero 50 zj 50"));
    assert!(!c.round_finished("Control: aero 50"));
    assert!(c.round_finished("Control: aero 100"));
    assert!(!c.round_finished("Step 3"));
}

#[test]
fn test_parse_scores_keeps_numeric_cells() {
    let c = HeuristicClassifier::new();
    let cells: Vec<String> = ["aero", " 100 ", "zj", "0", "", "12a", "-5"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(c.parse_scores(&cells), vec![100, 0]);
}

#[test]
fn test_dialog_reports_ready() {
    let c = HeuristicClassifier::new();
    assert!(c.dialog_reports_ready("Both players Ready"));
    assert!(!c.dialog_reports_ready("aero did not respond"));
}

#[test]
fn test_snapshot_deserializes_camel_case() {
    let value = serde_json::json!({
        "url": "http://site/profile.php",
        "title": "Profile",
        "text": "Player: aero",
        "hasUploadLink": true,
        "hasRunLink": false
    });
    let snap: PageSnapshot = serde_json::from_value(value).unwrap();
    assert!(snap.has_upload_link);
    assert_eq!(snap.title, "Profile");
}
