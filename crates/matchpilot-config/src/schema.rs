//! Configuration schema definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub tournament: TournamentConfig,

    #[serde(default)]
    pub timing: TimingConfig,
}

/// Locations on the remote contest site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Page that shows whether the artifact is registered and hosts the upload form.
    #[serde(default = "default_status_path")]
    pub status_path: String,

    /// Listing of contests with links to their manager views.
    #[serde(default = "default_contests_path")]
    pub contests_path: String,

    /// Direct manager URL, `{contest}` is replaced by the lower-cased contest name.
    #[serde(default = "default_manager_url")]
    pub manager_url: String,

    /// Participant endpoint URL, `{name}` is replaced by the participant name.
    #[serde(default = "default_participant_url")]
    pub participant_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            status_path: default_status_path(),
            contests_path: default_contests_path(),
            manager_url: default_manager_url(),
            participant_url: default_participant_url(),
        }
    }
}

impl SiteConfig {
    fn join(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn login_url(&self) -> String {
        self.join(&self.login_path)
    }

    pub fn status_url(&self) -> String {
        self.join(&self.status_path)
    }

    pub fn contests_url(&self) -> String {
        self.join(&self.contests_path)
    }

    /// Manager URL for a contest.
    pub fn manager_url_for(&self, contest: &str) -> String {
        self.manager_url.replace("{contest}", &contest.to_lowercase())
    }

    /// Endpoint URL for a participant.
    pub fn participant_url_for(&self, name: &str) -> String {
        self.participant_url.replace("{name}", name)
    }
}

fn default_base_url() -> String {
    "http://gamemaster.stanford.edu/homepage".to_string()
}

fn default_login_path() -> String {
    "signin.php".to_string()
}

fn default_status_path() -> String {
    "profile.php".to_string()
}

fn default_contests_path() -> String {
    "showgames.php".to_string()
}

fn default_manager_url() -> String {
    "http://gamemaster.stanford.edu/homepage/manager.php?game={contest}".to_string()
}

fn default_participant_url() -> String {
    "http://gamemaster.stanford.edu/gameplayers/{name}.html".to_string()
}

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    #[serde(default)]
    pub headless: bool,

    /// Profile directory for persistent browser state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    #[serde(default = "default_ignore_https_errors")]
    pub ignore_https_errors: bool,

    /// Additional Chrome command-line flags.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            profile_dir: None,
            ignore_https_errors: default_ignore_https_errors(),
            extra_args: Vec::new(),
        }
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_ignore_https_errors() -> bool {
    true
}

/// What to play and who plays it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default = "default_contest_name")]
    pub contest_name: String,

    #[serde(default = "default_opponent_name")]
    pub opponent_name: String,

    #[serde(default = "default_self_name")]
    pub self_name: String,

    /// Credential confirming artifact uploads. Usually `${VAR}` expanded.
    #[serde(default)]
    pub self_credential: String,

    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,

    /// Rounds played per role; the run plays each side once.
    #[serde(default = "default_rounds_per_side")]
    pub rounds_per_side: u32,

    /// Start and play clock written into the manager's timer fields.
    #[serde(default = "default_clock_seconds")]
    pub clock_seconds: u32,

    /// Which numeric score cell belongs to us (0 or 1).
    #[serde(default)]
    pub self_score_index: usize,

    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,

    /// Selector for the timer inputs rewritten before the first round.
    #[serde(default = "default_clock_field_selector")]
    pub clock_field_selector: String,

    #[serde(default = "default_clock_field_limit")]
    pub clock_field_limit: usize,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            contest_name: default_contest_name(),
            opponent_name: default_opponent_name(),
            self_name: default_self_name(),
            self_credential: String::new(),
            artifact_path: default_artifact_path(),
            rounds_per_side: default_rounds_per_side(),
            clock_seconds: default_clock_seconds(),
            self_score_index: 0,
            results_path: default_results_path(),
            clock_field_selector: default_clock_field_selector(),
            clock_field_limit: default_clock_field_limit(),
        }
    }
}

impl TournamentConfig {
    /// Rounds requested across both sides.
    pub fn total_rounds(&self) -> u32 {
        self.rounds_per_side.saturating_mul(2)
    }
}

fn default_contest_name() -> String {
    "TicTacToe3".to_string()
}

fn default_opponent_name() -> String {
    "zj".to_string()
}

fn default_self_name() -> String {
    "aero".to_string()
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("./aero_final.html")
}

fn default_rounds_per_side() -> u32 {
    5
}

fn default_clock_seconds() -> u32 {
    5
}

fn default_results_path() -> PathBuf {
    PathBuf::from("tournament_results.json")
}

fn default_clock_field_selector() -> String {
    r#"input[value="10"]"#.to_string()
}

fn default_clock_field_limit() -> usize {
    2
}

/// Deadlines and delays, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_login_timeout")]
    pub login_timeout_ms: u64,

    /// How often the login wait reports progress.
    #[serde(default = "default_login_progress")]
    pub login_progress_ms: u64,

    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_entry_navigation_timeout")]
    pub entry_navigation_timeout_ms: u64,

    #[serde(default = "default_file_input_timeout")]
    pub file_input_timeout_ms: u64,

    #[serde(default = "default_credential_field_timeout")]
    pub credential_field_timeout_ms: u64,

    #[serde(default = "default_registration_timeout")]
    pub registration_timeout_ms: u64,

    #[serde(default = "default_new_view_timeout")]
    pub new_view_timeout_ms: u64,

    #[serde(default = "default_readiness_timeout")]
    pub readiness_timeout_ms: u64,

    #[serde(default = "default_round_timeout")]
    pub round_timeout_ms: u64,

    #[serde(default = "default_inter_round_delay")]
    pub inter_round_delay_ms: u64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_slot_engage_delay")]
    pub slot_engage_delay_ms: u64,

    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            login_timeout_ms: default_login_timeout(),
            login_progress_ms: default_login_progress(),
            navigation_timeout_ms: default_navigation_timeout(),
            entry_navigation_timeout_ms: default_entry_navigation_timeout(),
            file_input_timeout_ms: default_file_input_timeout(),
            credential_field_timeout_ms: default_credential_field_timeout(),
            registration_timeout_ms: default_registration_timeout(),
            new_view_timeout_ms: default_new_view_timeout(),
            readiness_timeout_ms: default_readiness_timeout(),
            round_timeout_ms: default_round_timeout(),
            inter_round_delay_ms: default_inter_round_delay(),
            settle_delay_ms: default_settle_delay(),
            slot_engage_delay_ms: default_slot_engage_delay(),
            keepalive_interval_ms: default_keepalive_interval(),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn login_progress(&self) -> Duration {
        Duration::from_millis(self.login_progress_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn entry_navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.entry_navigation_timeout_ms)
    }

    pub fn file_input_timeout(&self) -> Duration {
        Duration::from_millis(self.file_input_timeout_ms)
    }

    pub fn credential_field_timeout(&self) -> Duration {
        Duration::from_millis(self.credential_field_timeout_ms)
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }

    pub fn new_view_timeout(&self) -> Duration {
        Duration::from_millis(self.new_view_timeout_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }

    pub fn inter_round_delay(&self) -> Duration {
        Duration::from_millis(self.inter_round_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn slot_engage_delay(&self) -> Duration {
        Duration::from_millis(self.slot_engage_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

fn default_poll_interval() -> u64 {
    250
}

fn default_login_timeout() -> u64 {
    300_000
}

fn default_login_progress() -> u64 {
    2_000
}

fn default_navigation_timeout() -> u64 {
    10_000
}

fn default_entry_navigation_timeout() -> u64 {
    5_000
}

fn default_file_input_timeout() -> u64 {
    3_000
}

fn default_credential_field_timeout() -> u64 {
    5_000
}

fn default_registration_timeout() -> u64 {
    10_000
}

fn default_new_view_timeout() -> u64 {
    10_000
}

fn default_readiness_timeout() -> u64 {
    10_000
}

fn default_round_timeout() -> u64 {
    60_000
}

fn default_inter_round_delay() -> u64 {
    1_000
}

fn default_settle_delay() -> u64 {
    2_000
}

fn default_slot_engage_delay() -> u64 {
    100
}

fn default_keepalive_interval() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_urls() {
        let site = SiteConfig::default();
        assert_eq!(site.login_url(), "http://gamemaster.stanford.edu/homepage/signin.php");
        assert_eq!(site.status_url(), "http://gamemaster.stanford.edu/homepage/profile.php");
        assert_eq!(
            site.manager_url_for("TicTacToe3"),
            "http://gamemaster.stanford.edu/homepage/manager.php?game=tictactoe3"
        );
        assert_eq!(
            site.participant_url_for("zj"),
            "http://gamemaster.stanford.edu/gameplayers/zj.html"
        );
    }

    #[test]
    fn test_join_handles_slashes() {
        let site = SiteConfig {
            base_url: "http://example.test/".to_string(),
            contests_path: "/games.php".to_string(),
            ..Default::default()
        };
        assert_eq!(site.contests_url(), "http://example.test/games.php");
    }

    #[test]
    fn test_total_rounds_covers_both_sides() {
        let tournament = TournamentConfig {
            rounds_per_side: 7,
            ..Default::default()
        };
        assert_eq!(tournament.total_rounds(), 14);
    }

    #[test]
    fn test_timing_defaults() {
        let timing = TimingConfig::default();
        assert_eq!(timing.login_timeout(), Duration::from_secs(300));
        assert_eq!(timing.registration_timeout(), Duration::from_secs(10));
        assert_eq!(timing.round_timeout(), Duration::from_secs(60));
        assert_eq!(timing.keepalive_interval(), Duration::from_secs(30));
    }
}
