/*
 *  settings.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  User settings - registration, change actions and persistence
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown setting '{0}'")]
    UnknownKey(String),
    #[error("setting '{key}' expects a {expected} value")]
    TypeMismatch { key: String, expected: SettingKind },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stored value of a setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Checkbox,
            SettingValue::Text(_) => SettingKind::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Checkbox,
    String,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingKind::Checkbox => write!(f, "boolean"),
            SettingKind::String => write!(f, "string"),
        }
    }
}

/// Called with the owner and the new value after every change
pub type ChangeAction<C> = fn(&mut C, &SettingValue);

pub struct Setting<C> {
    pub key: &'static str,
    pub label: &'static str,
    pub default: SettingValue,
    pub placeholder: Option<&'static str>,
    /// only shown while this checkbox setting is on
    pub visible_when: Option<&'static str>,
    value: SettingValue,
    change_action: Option<ChangeAction<C>>,
}

impl<C> Setting<C> {
    pub fn checkbox(key: &'static str, label: &'static str, default: bool) -> Self {
        Self::with_default(key, label, SettingValue::Bool(default))
    }

    pub fn text(key: &'static str, label: &'static str, default: &str) -> Self {
        Self::with_default(key, label, SettingValue::Text(default.to_string()))
    }

    fn with_default(key: &'static str, label: &'static str, default: SettingValue) -> Self {
        Self {
            key,
            label,
            value: default.clone(),
            default,
            placeholder: None,
            visible_when: None,
            change_action: None,
        }
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn visible_when(mut self, key: &'static str) -> Self {
        self.visible_when = Some(key);
        self
    }

    pub fn on_change(mut self, action: ChangeAction<C>) -> Self {
        self.change_action = Some(action);
        self
    }

    pub fn kind(&self) -> SettingKind {
        self.default.kind()
    }

    pub fn value(&self) -> &SettingValue {
        &self.value
    }
}

impl<C> fmt::Debug for Setting<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("value", &self.value)
            .field("default", &self.default)
            .finish()
    }
}

/// Ordered set of settings acting on a context of type `C`
#[derive(Debug)]
pub struct SettingsRegistry<C> {
    settings: Vec<Setting<C>>,
}

impl<C> Default for SettingsRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> SettingsRegistry<C> {
    pub fn new() -> Self {
        Self { settings: Vec::new() }
    }

    /// Re-registering a key replaces the earlier setting
    pub fn register(&mut self, setting: Setting<C>) -> &mut Self {
        match self.settings.iter_mut().find(|s| s.key == setting.key) {
            Some(existing) => *existing = setting,
            None => self.settings.push(setting),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Setting<C>> {
        self.settings.iter()
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.find(key).map(Setting::value)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            SettingValue::Bool(b) => Some(*b),
            SettingValue::Text(_) => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            SettingValue::Text(s) => Some(s),
            SettingValue::Bool(_) => None,
        }
    }

    /// Shown unless it depends on a checkbox that is off
    pub fn is_visible(&self, key: &str) -> bool {
        match self.find(key).and_then(|s| s.visible_when) {
            Some(dependency) => self.bool(dependency).unwrap_or(false),
            None => self.find(key).is_some(),
        }
    }

    /// Store a new value and fire its change action.
    ///
    /// Returns `Ok(false)` when the value did not change; no action runs then.
    pub fn set(&mut self, key: &str, value: SettingValue, ctx: &mut C) -> Result<bool, SettingsError> {
        let setting = self
            .settings
            .iter_mut()
            .find(|s| s.key == key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;

        if setting.kind() != value.kind() {
            return Err(SettingsError::TypeMismatch {
                key: key.to_string(),
                expected: setting.kind(),
            });
        }
        if setting.value == value {
            return Ok(false);
        }

        debug!("Setting {} changed to {:?}", key, value);
        setting.value = value;
        if let Some(action) = setting.change_action {
            action(ctx, &setting.value);
        }
        Ok(true)
    }

    /// Run every change action with the current value, for start-up state.
    pub fn apply_all(&self, ctx: &mut C) {
        for setting in &self.settings {
            if let Some(action) = setting.change_action {
                action(ctx, &setting.value);
            }
        }
    }

    /// Apply persisted values; unknown or mistyped entries are skipped.
    pub fn load(&mut self, values: BTreeMap<String, SettingValue>, ctx: &mut C) {
        for (key, value) in values {
            if let Err(e) = self.set(&key, value, ctx) {
                warn!("Ignoring stored setting: {}", e);
            }
        }
    }

    /// Current values, keyed by setting key
    pub fn values(&self) -> BTreeMap<String, SettingValue> {
        self.settings
            .iter()
            .map(|s| (s.key.to_string(), s.value.clone()))
            .collect()
    }

    fn find(&self, key: &str) -> Option<&Setting<C>> {
        self.settings.iter().find(|s| s.key == key)
    }
}

pub fn read_values(path: &Path) -> Result<BTreeMap<String, SettingValue>, SettingsError> {
    let s = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&s)?)
}

pub fn write_values(path: &Path, values: &BTreeMap<String, SettingValue>) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_yaml::to_string(values)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Panel {
        enabled: bool,
        url: String,
        url_changes: usize,
    }

    fn on_enable(panel: &mut Panel, v: &SettingValue) {
        if let SettingValue::Bool(b) = v {
            panel.enabled = *b;
        }
    }

    fn on_url(panel: &mut Panel, v: &SettingValue) {
        if let SettingValue::Text(s) = v {
            panel.url = s.clone();
            panel.url_changes += 1;
        }
    }

    fn registry() -> SettingsRegistry<Panel> {
        let mut r = SettingsRegistry::new();
        r.register(Setting::checkbox("enable", "Enable", false).on_change(on_enable));
        r.register(
            Setting::text("url", "URL", "")
                .placeholder("Directory listing URL")
                .visible_when("enable")
                .on_change(on_url),
        );
        r
    }

    #[test]
    fn test_defaults_and_visibility() {
        let r = registry();
        assert_eq!(r.bool("enable"), Some(false));
        assert_eq!(r.text("url"), Some(""));
        assert!(r.is_visible("enable"));
        assert!(!r.is_visible("url"));
        assert!(!r.is_visible("missing"));
        let url = r.iter().find(|s| s.key == "url").unwrap();
        assert_eq!(url.placeholder, Some("Directory listing URL"));
        assert_eq!(url.kind(), SettingKind::String);
    }

    #[test]
    fn test_set_fires_action_only_on_change() {
        let mut r = registry();
        let mut panel = Panel::default();

        assert!(r.set("url", SettingValue::Text("http://x/".into()), &mut panel).unwrap());
        assert!(!r.set("url", SettingValue::Text("http://x/".into()), &mut panel).unwrap());
        assert_eq!(panel.url, "http://x/");
        assert_eq!(panel.url_changes, 1);

        r.set("enable", SettingValue::Bool(true), &mut panel).unwrap();
        assert!(panel.enabled);
        assert!(r.is_visible("url"));
    }

    #[test]
    fn test_set_rejects_unknown_and_mistyped() {
        let mut r = registry();
        let mut panel = Panel::default();
        assert!(matches!(
            r.set("nope", SettingValue::Bool(true), &mut panel),
            Err(SettingsError::UnknownKey(_))
        ));
        assert!(matches!(
            r.set("enable", SettingValue::Text("yes".into()), &mut panel),
            Err(SettingsError::TypeMismatch { expected: SettingKind::Checkbox, .. })
        ));
    }

    #[test]
    fn test_apply_all_pushes_current_values() {
        let r = registry();
        let mut panel = Panel {
            enabled: true,
            ..Panel::default()
        };
        r.apply_all(&mut panel);
        assert!(!panel.enabled);
        assert_eq!(panel.url_changes, 1);
    }

    #[test]
    fn test_persist_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/settings.yaml");

        let mut r = registry();
        let mut panel = Panel::default();
        r.set("enable", SettingValue::Bool(true), &mut panel).unwrap();
        r.set("url", SettingValue::Text("http://x/dir/".into()), &mut panel).unwrap();
        write_values(&path, &r.values()).unwrap();

        let mut restored = registry();
        let mut fresh = Panel::default();
        let mut stored = read_values(&path).unwrap();
        stored.insert("stale".into(), SettingValue::Bool(true));
        restored.load(stored, &mut fresh);

        assert!(fresh.enabled);
        assert_eq!(fresh.url, "http://x/dir/");
        assert_eq!(restored.values(), r.values());
    }
}
