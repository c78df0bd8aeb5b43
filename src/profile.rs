//! Per-application verbosity profiles
//!
//! Built-in profiles cover common full-screen terminal programs and cannot
//! be removed. Profiles round-trip through TOML for import/export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::app::{self, FocusObject};
use crate::config::{CursorTrackingMode, PunctuationLevel, Verbosity};

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("no profile named `{0}`")]
    NotFound(String),

    #[error("built-in profile `{0}` cannot be removed")]
    BuiltIn(String),

    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings applied while a given application has focus.
///
/// Unset levels inherit from the global configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationProfile {
    pub app_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuation_level: Option<PunctuationLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_tracking_mode: Option<CursorTrackingMode>,
}

impl ApplicationProfile {
    pub fn new(app_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into().to_lowercase(),
            display_name: display_name.into(),
            punctuation_level: None,
            cursor_tracking_mode: None,
        }
    }

    pub fn with_punctuation(mut self, level: PunctuationLevel) -> Self {
        self.punctuation_level = Some(level);
        self
    }

    pub fn with_tracking(mut self, mode: CursorTrackingMode) -> Self {
        self.cursor_tracking_mode = Some(mode);
        self
    }

    /// Overlay this profile on `base`
    pub fn apply(&self, base: Verbosity) -> Verbosity {
        Verbosity {
            punctuation: self.punctuation_level.unwrap_or(base.punctuation),
            tracking: self.cursor_tracking_mode.unwrap_or(base.tracking),
        }
    }

    pub fn to_toml(&self) -> Result<String, ProfileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProfileError> {
        let mut profile: ApplicationProfile = toml::from_str(content)?;
        profile.app_name = profile.app_name.to_lowercase();
        Ok(profile)
    }
}

fn builtin_profiles() -> Vec<ApplicationProfile> {
    use CursorTrackingMode as Tracking;
    use PunctuationLevel as Punct;

    vec![
        ApplicationProfile::new("vim", "Vim").with_punctuation(Punct::All),
        ApplicationProfile::new("nvim", "Neovim").with_punctuation(Punct::All),
        ApplicationProfile::new("tmux", "tmux").with_tracking(Tracking::Window),
        ApplicationProfile::new("htop", "htop")
            .with_punctuation(Punct::Some)
            .with_tracking(Tracking::Off),
        ApplicationProfile::new("less", "less").with_punctuation(Punct::Some),
        ApplicationProfile::new("git", "Git").with_punctuation(Punct::Most),
        ApplicationProfile::new("nano", "GNU nano").with_punctuation(Punct::Most),
    ]
}

/// Profile registry plus the currently active profile
#[derive(Debug, Clone)]
pub struct ProfileManager {
    profiles: BTreeMap<String, ApplicationProfile>,
    builtin: Vec<String>,
    active: Option<String>,
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileManager {
    pub fn new() -> Self {
        let mut manager = Self {
            profiles: BTreeMap::new(),
            builtin: Vec::new(),
            active: None,
        };
        for profile in builtin_profiles() {
            manager.builtin.push(profile.app_name.clone());
            manager.add(profile);
        }
        manager
    }

    /// Built-ins plus the user's profiles; user entries replace built-ins
    pub fn with_custom(custom: impl IntoIterator<Item = ApplicationProfile>) -> Self {
        let mut manager = Self::new();
        for profile in custom {
            manager.add(profile);
        }
        manager
    }

    pub fn get(&self, app_name: &str) -> Option<&ApplicationProfile> {
        self.profiles.get(&app_name.to_lowercase())
    }

    pub fn contains(&self, app_name: &str) -> bool {
        self.get(app_name).is_some()
    }

    pub fn is_builtin(&self, app_name: &str) -> bool {
        let key = app_name.to_lowercase();
        self.builtin.iter().any(|b| *b == key)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &ApplicationProfile> {
        self.profiles.values()
    }

    /// Insert or replace a profile
    pub fn add(&mut self, profile: ApplicationProfile) {
        let key = profile.app_name.to_lowercase();
        self.profiles.insert(key, profile);
    }

    pub fn remove(&mut self, app_name: &str) -> Result<ApplicationProfile, ProfileError> {
        let key = app_name.to_lowercase();
        if self.is_builtin(&key) {
            return Err(ProfileError::BuiltIn(key));
        }
        let removed = self.profiles.remove(&key).ok_or_else(|| ProfileError::NotFound(key.clone()))?;
        if self.active.as_deref() == Some(key.as_str()) {
            self.active = None;
        }
        Ok(removed)
    }

    /// Make a profile active. The previous one stays active on error.
    pub fn set_active(&mut self, app_name: &str) -> Result<(), ProfileError> {
        let key = app_name.to_lowercase();
        if !self.profiles.contains_key(&key) {
            return Err(ProfileError::NotFound(key));
        }
        self.active = Some(key);
        Ok(())
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&ApplicationProfile> {
        self.active.as_ref().and_then(|key| self.profiles.get(key))
    }

    /// Activate the profile matching a newly focused object.
    ///
    /// Objects whose application cannot be identified, or that have no
    /// profile, leave no profile active.
    pub fn activate_for(&mut self, obj: Option<&dyn FocusObject>) -> Option<&ApplicationProfile> {
        self.active = app::app_name(obj).filter(|name| self.profiles.contains_key(name));
        match self.active() {
            Some(profile) => {
                info!(app = %profile.app_name, "activated application profile");
                Some(profile)
            }
            None => {
                debug!("no application profile for focused object");
                None
            }
        }
    }

    /// Global verbosity with the active profile overlaid
    pub fn verbosity(&self, base: Verbosity) -> Verbosity {
        self.active().map_or(base, |profile| profile.apply(base))
    }

    pub fn export(&self, app_name: &str) -> Result<String, ProfileError> {
        self.get(app_name)
            .ok_or_else(|| ProfileError::NotFound(app_name.to_lowercase()))?
            .to_toml()
    }

    pub fn import(&mut self, content: &str) -> Result<&ApplicationProfile, ProfileError> {
        let profile = ApplicationProfile::from_toml(content)?;
        let key = profile.app_name.clone();
        self.add(profile);
        self.get(&key).ok_or(ProfileError::NotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{FakeModule, FakeObject};
    use crate::app::AttributeError;

    #[test]
    fn test_get_profile_existing() {
        let manager = ProfileManager::new();
        let profile = manager.get("vim").unwrap();
        assert_eq!(profile.app_name, "vim");
        assert!(manager.get("VIM").is_some());
    }

    #[test]
    fn test_get_profile_nonexistent() {
        assert!(ProfileManager::new().get("nonexistent").is_none());
    }

    #[test]
    fn test_set_active_profile() {
        let mut manager = ProfileManager::new();
        manager.set_active("tmux").unwrap();
        assert_eq!(manager.active().unwrap().app_name, "tmux");

        // unknown name keeps the previous profile
        assert!(matches!(manager.set_active("nonexistent"), Err(ProfileError::NotFound(_))));
        assert_eq!(manager.active().unwrap().app_name, "tmux");
    }

    #[test]
    fn test_add_and_remove_custom() {
        let mut manager = ProfileManager::new();
        manager.add(ApplicationProfile::new("removeme", "Remove Me"));
        assert!(manager.contains("removeme"));

        manager.set_active("removeme").unwrap();
        manager.remove("removeme").unwrap();
        assert!(!manager.contains("removeme"));
        assert!(manager.active().is_none());
    }

    #[test]
    fn test_builtin_protected() {
        let mut manager = ProfileManager::new();
        assert!(matches!(manager.remove("vim"), Err(ProfileError::BuiltIn(_))));
        assert!(manager.contains("vim"));
        assert!(matches!(manager.remove("ghost"), Err(ProfileError::NotFound(_))));
    }

    #[test]
    fn test_profile_list() {
        let manager = ProfileManager::new();
        let names: Vec<&str> = manager.names().collect();
        assert!(names.contains(&"vim"));
        assert!(names.contains(&"tmux"));
    }

    #[test]
    fn test_export_import() {
        let mut manager = ProfileManager::new();
        let exported = manager.export("vim").unwrap();
        assert!(exported.contains("app_name = \"vim\""));

        let imported = manager
            .import(
                "app_name = \"Imported\"\n\
                 display_name = \"Imported App\"\n\
                 punctuation_level = 2\n\
                 cursor_tracking_mode = 1\n",
            )
            .unwrap();
        assert_eq!(imported.app_name, "imported");
        assert_eq!(imported.punctuation_level, Some(PunctuationLevel::Most));
        assert_eq!(imported.cursor_tracking_mode, Some(CursorTrackingMode::Standard));
        assert!(manager.contains("imported"));
    }

    #[test]
    fn test_profile_toml_round_trip() {
        let profile = ApplicationProfile::new("testapp", "Test Application")
            .with_punctuation(PunctuationLevel::Most)
            .with_tracking(CursorTrackingMode::Standard);
        let parsed = ApplicationProfile::from_toml(&profile.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_verbosity_overlay() {
        let mut manager = ProfileManager::new();
        let base = Verbosity::default();
        assert_eq!(manager.verbosity(base), base);

        manager.set_active("htop").unwrap();
        let v = manager.verbosity(base);
        assert_eq!(v.tracking, CursorTrackingMode::Off);
        assert_eq!(v.punctuation, PunctuationLevel::Some);

        manager.set_active("tmux").unwrap();
        let v = manager.verbosity(base);
        assert_eq!(v.punctuation, base.punctuation);
        assert_eq!(v.tracking, CursorTrackingMode::Window);
    }

    #[test]
    fn test_activate_for_focus() {
        let mut manager = ProfileManager::new();
        assert!(manager.activate_for(Some(&FakeObject::named("Vim.exe"))).is_some());
        assert_eq!(manager.active().unwrap().app_name, "vim");

        let broken = FakeObject(Some(FakeModule::Failing(AttributeError::Raised("No appName".into()))));
        assert!(manager.activate_for(Some(&broken)).is_none());
        assert!(manager.active().is_none());

        assert!(manager.activate_for(Some(&FakeObject(Some(FakeModule::Missing)))).is_none());
        assert!(manager.activate_for(None).is_none());
    }

    #[test]
    fn test_custom_overrides_builtin() {
        let custom = ApplicationProfile::new("vim", "My Vim").with_punctuation(PunctuationLevel::Off);
        let manager = ProfileManager::with_custom([custom]);
        assert_eq!(manager.get("vim").unwrap().display_name, "My Vim");
        assert!(manager.is_builtin("vim"));
    }
}
