//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_site(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_tournament(config, &mut result);
        Self::validate_timing(config, &mut result);

        Ok(result)
    }

    fn validate_site(config: &Config, result: &mut ValidationResult) {
        let urls = [
            ("site.base_url", &config.site.base_url),
            ("site.manager_url", &config.site.manager_url),
            ("site.participant_url", &config.site.participant_url),
        ];
        for (path, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    path,
                    "URL must start with http:// or https://",
                ));
            }
        }

        if !config.site.participant_url.contains("{name}") {
            result.add_warning(ValidationWarning::new(
                "site.participant_url",
                "no {name} placeholder, both participants will open the same page",
            ));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }
    }

    fn validate_tournament(config: &Config, result: &mut ValidationResult) {
        let t = &config.tournament;

        for (path, value) in [
            ("tournament.contest_name", &t.contest_name),
            ("tournament.opponent_name", &t.opponent_name),
            ("tournament.self_name", &t.self_name),
        ] {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "cannot be empty"));
            }
        }

        if t.rounds_per_side == 0 {
            result.add_error(ValidationError::new(
                "tournament.rounds_per_side",
                "rounds_per_side must be greater than 0",
            ));
        }

        if t.rounds_per_side > 500 {
            result.add_warning(ValidationWarning::new(
                "tournament.rounds_per_side",
                "rounds_per_side is very high (>500), the run will take hours",
            ));
        }

        if t.clock_seconds == 0 {
            result.add_error(ValidationError::new(
                "tournament.clock_seconds",
                "clock_seconds must be greater than 0",
            ));
        }

        if t.self_score_index > 1 {
            result.add_error(ValidationError::new(
                "tournament.self_score_index",
                "self_score_index must be 0 or 1",
            ));
        }

        if t.self_credential.is_empty() {
            result.add_warning(ValidationWarning::new(
                "tournament.self_credential",
                "credential is empty, uploads will be rejected",
            ));
        }

        if !t.artifact_path.exists() {
            result.add_warning(ValidationWarning::new(
                "tournament.artifact_path",
                format!("Artifact does not exist: {:?}", t.artifact_path),
            ));
        }
    }

    fn validate_timing(config: &Config, result: &mut ValidationResult) {
        let timing = &config.timing;

        if timing.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "timing.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        } else if timing.poll_interval_ms >= timing.round_timeout_ms {
            result.add_error(ValidationError::new(
                "timing.poll_interval_ms",
                "poll_interval_ms must be shorter than round_timeout_ms",
            ));
        }

        if timing.login_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "timing.login_timeout_ms",
                "login_timeout_ms must be greater than 0",
            ));
        }

        if timing.keepalive_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "timing.keepalive_interval_ms",
                "keepalive_interval_ms must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
