use std::fs;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::client::{DEFAULT_BASE_URL, DEFAULT_MODEL, GeminiConfig};
use crate::store::{DEFAULT_MAX_HISTORY, DuplicatePolicy};
use crate::viewport::slide::{DEFAULT_SLIDE_SECS, OverlapPolicy};

const APP_DIR_NAME: &str = "anyplan";

fn home_or_temp() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
}

pub const API_KEY_ENV_VARS: [&str; 2] = ["ANYPLAN_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    // Falls back to the environment when None
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "AiSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "AiSettings::default_model")]
    pub model: String,
    #[serde(default = "AiSettings::default_temperature")]
    pub temperature: f32,
    #[serde(default = "AiSettings::default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "AiSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            max_output_tokens: Self::default_max_output_tokens(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl AiSettings {
    pub(crate) fn default_base_url() -> String { DEFAULT_BASE_URL.to_string() }
    pub(crate) fn default_model() -> String { DEFAULT_MODEL.to_string() }
    pub(crate) fn default_temperature() -> f32 { 0.7 }
    pub(crate) fn default_max_output_tokens() -> u32 { 2048 }
    pub(crate) fn default_timeout_secs() -> u64 { 30 }

    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(k) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(k.trim().to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|k| !k.trim().is_empty())
    }

    pub fn client_config(&self) -> Option<GeminiConfig> {
        Some(GeminiConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: self.resolve_api_key()?,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // If None, use OS default autosave directory
    pub autosave_override: Option<PathBuf>,
    // If None, use OS temporary directory for exports
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    #[serde(default = "AppSettings::default_autosave_enabled")]
    pub autosave_enabled: bool,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default)]
    pub slide_policy: OverlapPolicy,
    #[serde(default = "AppSettings::default_slide_secs")]
    pub slide_secs: f64,
    #[serde(default = "AppSettings::default_max_history")]
    pub max_history: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            autosave_override: None,
            export_override: None,
            autosave_enabled: Self::default_autosave_enabled(),
            ai: AiSettings::default(),
            duplicate_policy: DuplicatePolicy::default(),
            slide_policy: OverlapPolicy::default(),
            slide_secs: Self::default_slide_secs(),
            max_history: Self::default_max_history(),
        }
    }
}

impl AppSettings {
    // %APPDATA%\anyplan on Windows, $XDG_CONFIG_HOME/anyplan or ~/.config/anyplan elsewhere
    fn config_dir() -> PathBuf {
        let var = if cfg!(target_os = "windows") { "APPDATA" } else { "XDG_CONFIG_HOME" };
        match std::env::var_os(var) {
            Some(dir) => PathBuf::from(dir).join(APP_DIR_NAME),
            None => home_or_temp().join(".config").join(APP_DIR_NAME),
        }
    }

    // %LOCALAPPDATA%\anyplan on Windows, $XDG_STATE_HOME/anyplan or ~/.local/state/anyplan elsewhere
    fn autosave_default_dir() -> PathBuf {
        let var = if cfg!(target_os = "windows") { "LOCALAPPDATA" } else { "XDG_STATE_HOME" };
        match std::env::var_os(var) {
            Some(dir) => PathBuf::from(dir).join(APP_DIR_NAME),
            None => home_or_temp().join(".local").join("state").join(APP_DIR_NAME),
        }
    }

    pub(crate) fn default_autosave_enabled() -> bool { true }
    pub(crate) fn default_slide_secs() -> f64 { DEFAULT_SLIDE_SECS }
    pub(crate) fn default_max_history() -> usize { DEFAULT_MAX_HISTORY }

    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_dir().join("settings.json");
        if path.exists() {
            let mut f = fs::File::open(path)?;
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            return Self::from_json(&s);
        }
        Ok(Self::default())
    }

    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let v: Self = serde_json::from_str(s)?;
        Ok(v)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join("settings.json");
        let s = serde_json::to_string_pretty(self)?;
        let mut f = fs::File::create(path)?;
        f.write_all(s.as_bytes())?;
        Ok(())
    }

    pub fn autosave_dir(&self) -> PathBuf {
        if let Some(p) = &self.autosave_override { return p.clone(); }
        Self::autosave_default_dir()
    }

    /// Return the directory where the settings file (settings.json) is stored.
    pub fn settings_dir() -> PathBuf {
        Self::config_dir()
    }

    /// Default export directory when no override is set: {temp_dir}/Anyplan/exports
    pub fn export_default_dir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push("Anyplan");
        p.push("exports");
        p
    }

    /// Effective export directory honoring user override or falling back to OS temp.
    pub fn export_dir(&self) -> PathBuf {
        if let Some(p) = &self.export_override { return p.clone(); }
        Self::export_default_dir()
    }
}
