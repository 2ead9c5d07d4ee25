//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&expanded)?;
        config.tournament.artifact_path = Self::expand_pathbuf(&config.tournament.artifact_path);
        config.tournament.results_path = Self::expand_pathbuf(&config.tournament.results_path);
        if let Some(dir) = config.browser.profile_dir.take() {
            config.browser.profile_dir = Some(Self::expand_pathbuf(&dir));
        }
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.matchpilot`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    fn expand_pathbuf(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(Self::expand_path(s)),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.tournament.rounds_per_side, 5);
        assert_eq!(config.timing.login_timeout_ms, 300_000);
    }

    #[test]
    fn test_expand_path() {
        let expanded = ConfigLoader::expand_path("~/.matchpilot");
        assert!(!expanded.starts_with('~'));
    }

    #[test]
    fn test_load_tournament_section() {
        let content = r#"
            [tournament]
            contest_name = "Connect4"
            opponent_name = "rival"
            rounds_per_side = 3
            clock_seconds = 2
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.tournament.contest_name, "Connect4");
        assert_eq!(config.tournament.opponent_name, "rival");
        assert_eq!(config.tournament.total_rounds(), 6);
        assert_eq!(config.tournament.clock_seconds, 2);
        // untouched sections keep their defaults
        assert_eq!(config.timing.round_timeout_ms, 60_000);
    }

    #[test]
    fn test_load_timing_section() {
        let content = r#"
            [timing]
            poll_interval_ms = 100
            round_timeout_ms = 5000
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.timing.poll_interval().as_millis(), 100);
        assert_eq!(config.timing.round_timeout().as_millis(), 5000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[browser]").unwrap();
        writeln!(file, "debug_port = 9333").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.browser.debug_port, 9333);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/matchpilot.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_unset_env_var_is_an_error() {
        let content = r#"
            [tournament]
            self_credential = "${MATCHPILOT_TEST_SURELY_UNSET_VAR}"
        "#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(name)) if name == "MATCHPILOT_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_env_var_expansion() {
        // PATH is set in every test environment.
        let path = std::env::var("PATH").unwrap();
        let content = r#"
            [tournament]
            self_credential = "${PATH}"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.tournament.self_credential, path);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let sample = include_str!("../../../config/matchpilot.toml")
            .replace("${MATCHPILOT_CREDENTIAL}", "not-a-real-secret");
        let config = ConfigLoader::load_str(&sample).unwrap();

        assert_eq!(config.tournament.contest_name, "TicTacToe3");
        assert_eq!(config.tournament.total_rounds(), 10);
        assert_eq!(config.tournament.clock_field_limit, 2);

        let result = crate::ConfigValidator::validate(&config).unwrap();
        assert!(result.is_valid(), "{:?}", result.errors);
    }
}
