use crate::error::PostError;
use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
pub const DEFAULT_LEDGER_PATH: &str = "used_oracle_errors.json";
pub const DEFAULT_OUTPUT_DIR: &str = "_posts";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_RECENT_WINDOW: usize = 20;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const USE_MOCK_ENV: &str = "ORAPOST_USE_MOCK";

/// Settings for one run. Every component receives what it needs from here
/// at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub ledger_path: PathBuf,
    pub output_dir: PathBuf,
    pub max_attempts: u32,
    /// How many of the latest ledger entries the prompt asks the model to avoid.
    pub recent_window: usize,
    /// Language the article is written in.
    pub language: String,
    pub convert_html: bool,
    pub request_timeout_secs: u64,
    pub use_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            recent_window: DEFAULT_RECENT_WINDOW,
            language: "Japanese".to_string(),
            convert_html: false,
            request_timeout_secs: 120,
            use_mock: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file (explicit path, or the default
    /// location when it exists), then apply environment overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_file(&path)?,
                _ => {
                    info!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Environment variables override the config file.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(API_KEY_ENV).filter(|k| !k.is_empty()) {
            self.api_key = Some(api_key);
        }

        if lookup(USE_MOCK_ENV).is_some() {
            self.use_mock = true;
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("orapost").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> {
            Err(PostError::Configuration(msg.to_string()).into())
        };

        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            return invalid("request_timeout_secs must be at least 1");
        }
        if self.api_url.trim().is_empty() {
            return invalid("api_url must not be empty");
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| PostError::Configuration(format!("{} not set", API_KEY_ENV)).into())
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn show_config_info(&self, config_file: Option<&Path>) {
        let path = config_file
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);
        match path {
            Some(path) if path.exists() => {
                println!("Configuration file: {} (found)", path.display())
            }
            Some(path) => {
                println!("Configuration file: {} (not found, using defaults)", path.display())
            }
            None => println!("Configuration file: none"),
        }

        println!("API key: {}", if self.api_key.is_some() { "Set" } else { "Not set" });
        println!("Endpoint: {}", self.api_url);
        println!("Ledger: {}", self.ledger_path.display());
        println!("Output directory: {}", self.output_dir.display());
        println!("Max attempts: {}", self.max_attempts);
        println!("Recent window: {}", self.recent_window);
        println!("Language: {}", self.language);
        println!("Convert to HTML: {}", self.convert_html);
        println!("Mock mode: {}", self.use_mock);

        if self.api_key.is_none() && !self.use_mock {
            println!("\nTo set the API key:");
            println!("  export {}=<your-key>", API_KEY_ENV);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_original_layout() {
        let config = Config::default();
        assert_eq!(config.ledger_path, PathBuf::from("used_oracle_errors.json"));
        assert_eq!(config.output_dir, PathBuf::from("_posts"));
        assert_eq!(config.max_attempts, 30);
        assert_eq!(config.recent_window, 20);
        assert!(config.api_url.ends_with(":generateContent"));
        assert!(!config.convert_html);
        assert!(!config.use_mock);
    }

    #[test]
    fn test_env_overrides_api_key_and_mock() {
        let mut config = Config::default();
        config.apply_env_with(env_from(&[(API_KEY_ENV, "secret"), (USE_MOCK_ENV, "1")]));
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(config.is_mock_mode());
    }

    #[test]
    fn test_empty_env_key_is_ignored() {
        let mut config = Config::default();
        config.apply_env_with(env_from(&[(API_KEY_ENV, "")]));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_require_api_key_missing_is_configuration_error() {
        let config = Config::default();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostError>(),
            Some(PostError::Configuration(_))
        ));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = Config {
            max_attempts: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PostError>(),
            Some(PostError::Configuration(msg)) if msg.contains("request_timeout_secs")
        ));
    }

    #[test]
    fn test_validate_rejects_blank_api_url() {
        let config = Config {
            api_url: "  ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "max_attempts = 5\nconvert_html = true\noutput_dir = \"site/_posts\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert!(config.convert_html);
        assert_eq!(config.output_dir, PathBuf::from("site/_posts"));
        assert_eq!(config.ledger_path, PathBuf::from(DEFAULT_LEDGER_PATH));
        assert_eq!(config.language, "Japanese");
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_file(&dir.path().join("absent.toml")).is_err());
    }
}
