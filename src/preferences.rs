//! Per-user preferences with an explicit session lifecycle.
//!
//! Preferences belong to the logged-in user, so they are only reachable
//! through a [`Session`] obtained from [`PreferenceStore::login`]. Components
//! that need a preference take the session by reference; there is no global
//! lookup. [`Session::logout`] writes changes back and ends the session.
//!
//! A directory-backed store keeps one `<user_uuid>.json` file per user,
//! written atomically (temp file + rename).

use crate::error::ConvertError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Device switches remembered between rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Mic,
    Camera,
}

/// Everything stored for one user. Missing fields default to off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub mic_on: bool,
    #[serde(default)]
    pub camera_on: bool,
    /// Named feature switches.
    #[serde(default)]
    pub toggles: BTreeMap<String, bool>,
}

/// Where preferences live between sessions.
#[derive(Debug)]
pub struct PreferenceStore {
    dir: Option<PathBuf>,
    memory: DashMap<String, UserPreferences>,
}

impl PreferenceStore {
    /// Preferences kept only for the lifetime of this value.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            memory: DashMap::new(),
        }
    }

    /// Preferences persisted as JSON files under `dir`.
    pub fn at_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            memory: DashMap::new(),
        }
    }

    /// Start a session for `user_uuid`, loading what was saved last time.
    pub fn login(&self, user_uuid: &str) -> Result<Session<'_>, ConvertError> {
        validate_user(user_uuid)?;
        let prefs = match self.dir {
            Some(ref dir) => load(&dir.join(file_name(user_uuid)))?,
            None => self
                .memory
                .get(user_uuid)
                .map(|p| p.value().clone())
                .unwrap_or_default(),
        };
        debug!("Preferences loaded for {}", user_uuid);
        Ok(Session {
            store: self,
            user_uuid: user_uuid.to_string(),
            prefs,
            dirty: false,
        })
    }

    fn save(&self, user_uuid: &str, prefs: &UserPreferences) -> Result<(), ConvertError> {
        match self.dir {
            Some(ref dir) => write_atomic(dir, &dir.join(file_name(user_uuid)), prefs),
            None => {
                self.memory.insert(user_uuid.to_string(), prefs.clone());
                Ok(())
            }
        }
    }
}

/// A logged-in user's view of their preferences.
///
/// Changes are kept in memory until [`Session::logout`] or
/// [`Session::flush`]; dropping a session discards unsaved changes.
#[derive(Debug)]
pub struct Session<'a> {
    store: &'a PreferenceStore,
    user_uuid: String,
    prefs: UserPreferences,
    dirty: bool,
}

impl Session<'_> {
    pub fn user_uuid(&self) -> &str {
        &self.user_uuid
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.prefs
    }

    pub fn device(&self, device: DevicePreference) -> bool {
        match device {
            DevicePreference::Mic => self.prefs.mic_on,
            DevicePreference::Camera => self.prefs.camera_on,
        }
    }

    pub fn set_device(&mut self, device: DevicePreference, on: bool) {
        let slot = match device {
            DevicePreference::Mic => &mut self.prefs.mic_on,
            DevicePreference::Camera => &mut self.prefs.camera_on,
        };
        self.dirty |= *slot != on;
        *slot = on;
    }

    /// A named switch; unknown names are off.
    pub fn toggle(&self, key: &str) -> bool {
        self.prefs.toggles.get(key).copied().unwrap_or(false)
    }

    pub fn set_toggle(&mut self, key: impl Into<String>, on: bool) {
        let previous = self.prefs.toggles.insert(key.into(), on);
        self.dirty |= previous != Some(on);
    }

    /// Persist pending changes without ending the session.
    pub fn flush(&mut self) -> Result<(), ConvertError> {
        if self.dirty {
            self.store.save(&self.user_uuid, &self.prefs)?;
            self.dirty = false;
        }
        Ok(())
    }

    /// Persist pending changes and end the session.
    pub fn logout(mut self) -> Result<(), ConvertError> {
        self.flush()?;
        debug!("Session ended for {}", self.user_uuid);
        Ok(())
    }
}

fn validate_user(user_uuid: &str) -> Result<(), ConvertError> {
    let bad = user_uuid.trim().is_empty()
        || user_uuid.contains(['/', '\\'])
        || user_uuid == "."
        || user_uuid == "..";
    if bad {
        return Err(ConvertError::InvalidUser {
            user_uuid: user_uuid.to_string(),
        });
    }
    Ok(())
}

fn file_name(user_uuid: &str) -> String {
    format!("{user_uuid}.json")
}

fn load(path: &Path) -> Result<UserPreferences, ConvertError> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UserPreferences::default()),
        Err(e) => {
            return Err(ConvertError::PreferencesIo {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&text).map_err(|e| ConvertError::PreferencesFormat {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

fn write_atomic(dir: &Path, path: &Path, prefs: &UserPreferences) -> Result<(), ConvertError> {
    let io_err = |source: std::io::Error| ConvertError::PreferencesIo {
        path: path.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let json = serde_json::to_vec_pretty(prefs).map_err(|e| ConvertError::PreferencesFormat {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_off() {
        let store = PreferenceStore::in_memory();
        let session = store.login("u1").unwrap();
        assert!(!session.device(DevicePreference::Mic));
        assert!(!session.device(DevicePreference::Camera));
        assert!(!session.toggle("anything"));
    }

    #[test]
    fn in_memory_survives_logout_login() {
        let store = PreferenceStore::in_memory();
        let mut s = store.login("u1").unwrap();
        s.set_device(DevicePreference::Camera, true);
        s.set_toggle("beta", true);
        s.logout().unwrap();

        let s = store.login("u1").unwrap();
        assert!(s.device(DevicePreference::Camera));
        assert!(s.toggle("beta"));

        // Users do not see each other's preferences.
        let other = store.login("u2").unwrap();
        assert!(!other.device(DevicePreference::Camera));
    }

    #[test]
    fn dropped_session_discards_changes() {
        let store = PreferenceStore::in_memory();
        {
            let mut s = store.login("u1").unwrap();
            s.set_device(DevicePreference::Mic, true);
        }
        assert!(!store.login("u1").unwrap().device(DevicePreference::Mic));
    }

    #[test]
    fn rejects_bad_user_ids() {
        let store = PreferenceStore::in_memory();
        for id in ["", "  ", "../etc", "a/b", ".."] {
            assert!(
                matches!(store.login(id), Err(ConvertError::InvalidUser { .. })),
                "{id:?}"
            );
        }
    }

    #[test]
    fn directory_store_persists_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::at_dir(dir.path());
        let mut s = store.login("user-7").unwrap();
        s.set_device(DevicePreference::Mic, true);
        s.logout().unwrap();

        let text = std::fs::read_to_string(dir.path().join("user-7.json")).unwrap();
        assert!(text.contains("\"mic_on\": true"), "got: {text}");

        let fresh = PreferenceStore::at_dir(dir.path());
        assert!(fresh.login("user-7").unwrap().device(DevicePreference::Mic));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("u.json"), "{not json").unwrap();
        let store = PreferenceStore::at_dir(dir.path());
        assert!(matches!(
            store.login("u"),
            Err(ConvertError::PreferencesFormat { .. })
        ));
    }
}
