use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when `api_key` is not set in the file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// How free-recall and dictation answers are checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritingCheck {
    #[default]
    Typed,
    Handwriting,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    #[serde(default = "default_judge_model")]
    pub judge_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
    #[serde(default = "default_audio_timeout_secs")]
    pub audio_timeout_secs: u64,
    #[serde(default = "default_judge_timeout_secs")]
    pub judge_timeout_secs: u64,
    #[serde(default = "default_auto_play_audio")]
    pub auto_play_audio: bool,
    #[serde(default = "default_audio_player")]
    pub audio_player: String,
    #[serde(default)]
    pub image_viewer: Option<String>,
    #[serde(default)]
    pub writing_check: WritingCheck,
    #[serde(default = "default_lessons_dir")]
    pub lessons_dir: String,
    #[serde(default = "default_media_cache")]
    pub media_cache: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_theme() -> String {
    "meadow".to_string()
}
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_speech_model() -> String {
    "gemini-2.5-flash-preview-tts".to_string()
}
fn default_judge_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_voice() -> String {
    "Kore".to_string()
}
fn default_image_timeout_secs() -> u64 {
    15
}
fn default_audio_timeout_secs() -> u64 {
    30
}
fn default_judge_timeout_secs() -> u64 {
    30
}
fn default_auto_play_audio() -> bool {
    true
}
fn default_audio_player() -> String {
    if cfg!(target_os = "macos") {
        "afplay".to_string()
    } else if cfg!(target_os = "linux") {
        "aplay -q".to_string()
    } else {
        String::new()
    }
}
fn default_lessons_dir() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wordkite")
        .join("lessons")
        .to_string_lossy()
        .to_string()
}
fn default_media_cache() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            api_key: None,
            api_base_url: default_api_base_url(),
            image_model: default_image_model(),
            speech_model: default_speech_model(),
            judge_model: default_judge_model(),
            voice: default_voice(),
            image_timeout_secs: default_image_timeout_secs(),
            audio_timeout_secs: default_audio_timeout_secs(),
            judge_timeout_secs: default_judge_timeout_secs(),
            auto_play_audio: default_auto_play_audio(),
            audio_player: default_audio_player(),
            image_viewer: None,
            writing_check: WritingCheck::default(),
            lessons_dir: default_lessons_dir(),
            media_cache: default_media_cache(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordkite")
            .join("config.toml")
    }

    /// The file's `api_key`, else the environment. Blank values count as unset.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub fn lessons_path(&self) -> Option<PathBuf> {
        let dir = self.lessons_dir.trim();
        (!dir.is_empty()).then(|| PathBuf::from(dir))
    }

    /// Reset `theme` to the default if it names no known theme.
    pub fn normalize_theme(&mut self, valid_names: &[String]) {
        if !valid_names.iter().any(|name| name == &self.theme) {
            log::warn!("unknown theme {:?}, using {}", self.theme, default_theme());
            self.theme = default_theme();
        }
    }

    /// Clamp timeouts to at least one second.
    pub fn normalize_timeouts(&mut self) {
        for secs in [
            &mut self.image_timeout_secs,
            &mut self.audio_timeout_secs,
            &mut self.judge_timeout_secs,
        ] {
            *secs = (*secs).max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.theme, "meadow");
        assert_eq!(config.image_timeout_secs, 15);
        assert_eq!(config.audio_timeout_secs, 30);
        assert_eq!(config.judge_timeout_secs, 30);
        assert_eq!(config.voice, "Kore");
        assert_eq!(config.writing_check, WritingCheck::Typed);
        assert!(config.auto_play_audio);
        assert!(config.api_key.is_none());
        assert!(config.lessons_dir.contains("lessons"));
    }

    #[test]
    fn test_config_serde_partial_file() {
        let toml_str = r#"
theme = "night-sky"
writing_check = "handwriting"
image_timeout_secs = 20
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "night-sky");
        assert_eq!(config.writing_check, WritingCheck::Handwriting);
        assert_eq!(config.image_timeout_secs, 20);
        assert_eq!(config.judge_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.image_viewer = Some("feh".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.theme, deserialized.theme);
        assert_eq!(config.image_viewer, deserialized.image_viewer);
        assert_eq!(config.writing_check, deserialized.writing_check);
        assert_eq!(config.lessons_dir, deserialized.lessons_dir);
    }

    #[test]
    fn test_unknown_writing_check_is_rejected() {
        assert!(toml::from_str::<Config>("writing_check = \"voice\"").is_err());
    }

    #[test]
    fn test_configured_api_key_wins_and_blank_is_unset() {
        let mut config = Config::default();
        config.api_key = Some("  abc  ".to_string());
        assert_eq!(config.resolved_api_key().as_deref(), Some("abc"));

        config.api_key = Some("   ".to_string());
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(config.resolved_api_key().is_none());
        }
    }

    #[test]
    fn test_normalize_theme() {
        let names = vec!["meadow".to_string(), "night-sky".to_string()];
        let mut config = Config::default();
        config.theme = "night-sky".to_string();
        config.normalize_theme(&names);
        assert_eq!(config.theme, "night-sky");

        config.theme = "solarized".to_string();
        config.normalize_theme(&names);
        assert_eq!(config.theme, "meadow");
    }

    #[test]
    fn test_normalize_timeouts() {
        let mut config = Config::default();
        config.audio_timeout_secs = 0;
        config.normalize_timeouts();
        assert_eq!(config.audio_timeout_secs, 1);
        assert_eq!(config.image_timeout_secs, 15);
    }

    #[test]
    fn test_blank_lessons_dir_is_none() {
        let mut config = Config::default();
        config.lessons_dir = " ".to_string();
        assert!(config.lessons_path().is_none());
    }
}
