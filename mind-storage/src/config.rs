use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const URL_ENV: &str = "MIND_STORAGE_SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "MIND_STORAGE_SUPABASE_ANON_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindConfig {
    /// Project URL of the hosted backend, e.g. "https://xyzcompany.supabase.co"
    #[serde(default)]
    pub supabase_url: String,
    /// Public (anon) API key of the project
    #[serde(default)]
    pub supabase_anon_key: String,
    /// Local port the browser is redirected to after an OAuth sign-in
    #[serde(default = "default_oauth_callback_port")]
    pub oauth_callback_port: u16,
    /// Quiet period before an edit on the detail screen is saved
    #[serde(default = "default_autosave_quiet_ms")]
    pub autosave_quiet_ms: u64,
    /// Log file; defaults to `mind-storage.log` next to this config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_oauth_callback_port() -> u16 {
    9876
}

fn default_autosave_quiet_ms() -> u64 {
    500
}

impl Default for MindConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            oauth_callback_port: default_oauth_callback_port(),
            autosave_quiet_ms: default_autosave_quiet_ms(),
            log_file: None,
        }
    }
}

/// Where the hosted backend lives, once both halves are present.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub url: String,
    pub anon_key: String,
}

impl MindConfig {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("mind-storage"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from disk and apply environment overrides. Returns the
    /// defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config at {}", path.display()))?;
            Self::parse(&raw)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(URL_ENV) {
            self.supabase_url = url;
        }
        if let Some(key) = var(ANON_KEY_ENV) {
            self.supabase_anon_key = key;
        }
    }

    /// Write the default config if none exists yet. Returns its path.
    pub fn ensure_exists() -> Result<PathBuf> {
        let path = Self::config_path()?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = toml::to_string_pretty(&Self::default())?;
            std::fs::write(&path, raw)?;
        }
        Ok(path)
    }

    /// `None` while either the URL or the key is blank.
    pub fn backend(&self) -> Option<BackendSettings> {
        let url = self.supabase_url.trim();
        let anon_key = self.supabase_anon_key.trim();
        if url.is_empty() || anon_key.is_empty() {
            return None;
        }
        Some(BackendSettings {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }

    pub fn oauth_redirect_url(&self) -> String {
        format!("http://localhost:{}/callback", self.oauth_callback_port)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("mind-storage.log")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = MindConfig::parse("supabase_url = \"https://x.supabase.co\"\n").unwrap();
        assert_eq!(config.supabase_url, "https://x.supabase.co");
        assert_eq!(config.oauth_callback_port, 9876);
        assert_eq!(config.autosave_quiet(), Duration::from_millis(500));
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn blank_values_count_as_not_configured() {
        let mut config = MindConfig::default();
        assert_eq!(config.backend(), None);

        config.supabase_url = "https://x.supabase.co".to_string();
        config.supabase_anon_key = "   ".to_string();
        assert_eq!(config.backend(), None);

        config.supabase_anon_key = "anon".to_string();
        assert_eq!(
            config.backend(),
            Some(BackendSettings {
                url: "https://x.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            })
        );
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = MindConfig::parse(
            "supabase_url = \"https://file.supabase.co\"\nsupabase_anon_key = \"file\"\n",
        )
        .unwrap();
        config.apply_overrides(|name| (name == URL_ENV).then(|| "https://env.supabase.co".to_string()));

        assert_eq!(config.supabase_url, "https://env.supabase.co");
        assert_eq!(config.supabase_anon_key, "file");
    }

    #[test]
    fn default_config_serializes_without_log_file() {
        let raw = toml::to_string_pretty(&MindConfig::default()).unwrap();
        assert!(raw.contains("oauth_callback_port = 9876"));
        assert!(!raw.contains("log_file"));
        assert_eq!(MindConfig::parse(&raw).unwrap(), MindConfig::default());
    }
}
