use crate::adapters::capture::STDIN_SOURCE;
use crate::utils::error::{PointsError, Result};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub receptacle: ReceptacleConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default)]
    pub tables: TableNames,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub receptacles: String,
    pub users: String,
    pub orders: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            receptacles: "trash_bins".to_string(),
            users: "profiles".to_string(),
            orders: "orders".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptacleConfig {
    /// Skips the interactive prompt when set.
    pub name: Option<String>,
    pub assigned_category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: String,
    pub poll_interval_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: STDIN_SOURCE.to_string(),
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub enabled: bool,
    pub player: String,
    pub player_args: Vec<String>,
    pub volume_command: Option<Vec<String>>,
    pub success_sound: String,
    pub failure_sound: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            player: "mpg123".to_string(),
            player_args: vec!["-q".to_string()],
            volume_command: None,
            success_sound: "sound/success.mp3".to_string(),
            failure_sound: "sound/failure.mp3".to_string(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PointsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PointsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SUPABASE_KEY})；未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| PointsError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.backend.retry_attempts,
            Duration::from_millis(self.backend.retry_delay_ms),
            Duration::from_millis(self.backend.retry_max_delay_ms),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.capture.poll_interval_ms)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("backend.url", &self.backend.url)?;
        validation::validate_non_empty_string("backend.api_key", &self.backend.api_key)?;
        if self.backend.api_key.contains("${") {
            return Err(PointsError::MissingConfigError {
                field: "backend.api_key (environment variable not set)".to_string(),
            });
        }
        validation::validate_range("backend.timeout_seconds", self.backend.timeout_seconds, 1, 300)?;
        validation::validate_positive_number(
            "backend.retry_attempts",
            u64::from(self.backend.retry_attempts),
            1,
        )?;
        validation::validate_non_empty_string("backend.tables.receptacles", &self.backend.tables.receptacles)?;
        validation::validate_non_empty_string("backend.tables.users", &self.backend.tables.users)?;
        validation::validate_non_empty_string("backend.tables.orders", &self.backend.tables.orders)?;

        validation::validate_non_empty_string(
            "receptacle.assigned_category",
            &self.receptacle.assigned_category,
        )?;
        if let Some(name) = &self.receptacle.name {
            validation::validate_non_empty_string("receptacle.name", name)?;
        }

        validation::validate_path("capture.source", &self.capture.source)?;
        if self.feedback.enabled {
            validation::validate_non_empty_string("feedback.player", &self.feedback.player)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[backend]
url = "https://demo.supabase.co"
api_key = "anon-key"

[receptacle]
assigned_category = "burnable"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.backend.timeout_seconds, 10);
        assert_eq!(config.backend.tables, TableNames::default());
        assert_eq!(config.receptacle.name, None);
        assert_eq!(config.capture.source, "stdin");
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert!(config.feedback.enabled);
        assert_eq!(config.retry_policy().max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_config() {
        let toml_content = r#"
[backend]
url = "http://localhost:54321"
api_key = "service-key"
timeout_seconds = 5
retry_attempts = 5
retry_delay_ms = 50
retry_max_delay_ms = 400

[backend.tables]
receptacles = "bins"

[receptacle]
name = "north-gate"
assigned_category = "燃えるゴミ"

[capture]
source = "/dev/ttyACM0"
poll_interval_ms = 0

[feedback]
enabled = false
volume_command = ["amixer", "set", "Master", "100%"]
success_sound = "sound/pinpon.mp3"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.backend.tables.receptacles, "bins");
        assert_eq!(config.backend.tables.users, "profiles");
        assert_eq!(config.receptacle.name.as_deref(), Some("north-gate"));
        assert_eq!(config.receptacle.assigned_category, "燃えるゴミ");
        assert_eq!(config.capture.source, "/dev/ttyACM0");
        assert!(!config.feedback.enabled);
        assert_eq!(config.feedback.player, "mpg123");
        assert_eq!(config.feedback.success_sound, "sound/pinpon.mp3");
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(5, Duration::from_millis(50), Duration::from_millis(400))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("QR_POINTS_TEST_KEY", "secret-from-env");

        let content = MINIMAL.replace("anon-key", "${QR_POINTS_TEST_KEY}");
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.backend.api_key, "secret-from-env");

        std::env::remove_var("QR_POINTS_TEST_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let content = MINIMAL.replace("anon-key", "${QR_POINTS_SURELY_UNSET_VAR}");
        let config = AppConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(PointsError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config.backend.url = "ftp://demo".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config.backend.retry_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config.receptacle.assigned_category = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::from_toml_str(MINIMAL).unwrap();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_section_is_a_config_error() {
        let err = AppConfig::from_toml_str("[backend]\nurl = \"https://x\"\n").unwrap_err();
        assert!(matches!(err, PointsError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.receptacle.assigned_category, "burnable");
    }
}
