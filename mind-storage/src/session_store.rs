use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use crate::app::NavigationState;

const SESSION_FILE: &str = "session.json";
const NAVIGATION_FILE: &str = "navigation.json";

/// Login session and navigation state kept between runs. The navigation file
/// only exists while a session does.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<config dir>/mind-storage`
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(crate::config::MindConfig::config_dir()?))
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    pub fn navigation_path(&self) -> PathBuf {
        self.root.join(NAVIGATION_FILE)
    }

    pub fn load_session(&self) -> Result<Option<String>> {
        read_trimmed(&self.session_path())
    }

    pub fn save_session(&self, session: &str) -> Result<()> {
        secure_write(&self.session_path(), session)
    }

    /// Saved navigation state. Missing or unreadable state gives `None`.
    pub fn load_navigation(&self) -> Option<NavigationState> {
        let raw = match read_trimmed(&self.navigation_path()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Ignoring navigation state: {:#}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(nav) => Some(nav),
            Err(e) => {
                tracing::warn!("Ignoring corrupt navigation state: {}", e);
                None
            }
        }
    }

    pub fn save_navigation(&self, nav: &NavigationState) -> Result<()> {
        let raw = serde_json::to_string(nav).context("Failed to serialize navigation state")?;
        secure_write(&self.navigation_path(), &raw)
    }

    /// Forget the session and everything tied to it.
    pub fn clear(&self) -> Result<()> {
        remove_if_exists(&self.session_path())?;
        remove_if_exists(&self.navigation_path())
    }
}

fn read_trimmed(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Ok(Some(raw.to_string()))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

fn secure_write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Screen;

    fn nav() -> NavigationState {
        NavigationState {
            screen: Screen::Month,
            selected_year: 2023,
            selected_month: 4,
            selected_day: 9,
        }
    }

    #[test]
    fn session_and_navigation_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("mind-storage"));

        assert_eq!(store.load_session().unwrap(), None);
        assert_eq!(store.load_navigation(), None);

        store.save_session("{\"access_token\":\"t\"}\n").unwrap();
        store.save_navigation(&nav()).unwrap();
        assert_eq!(
            store.load_session().unwrap().as_deref(),
            Some("{\"access_token\":\"t\"}")
        );
        assert_eq!(store.load_navigation(), Some(nav()));

        store.clear().unwrap();
        assert!(!store.session_path().exists());
        assert!(!store.navigation_path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_navigation_falls_back_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        std::fs::write(store.navigation_path(), "{\"screen\":\"nowhere\"}").unwrap();

        assert_eq!(store.load_navigation(), None);
    }

    #[cfg(unix)]
    #[test]
    fn files_are_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save_session("secret").unwrap();

        let mode = std::fs::metadata(store.session_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
