use crate::calc::{leave_date, Identity};
use crate::data::persistence::{Format, Persistable};
use crate::error::{AutofillError, SettingsError};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stored user preferences. Serialized as one flat JSON object whose keys are
/// the store keys (`department`, `reasonPresets`, `defaultPresetIndex`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub department: String,
    pub team: String,
    pub name: String,
    pub enabled: bool,
    pub reason_presets: Vec<String>,
    /// Stored as `-1` when there is no default.
    #[serde(with = "preset_index")]
    pub default_preset_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacation_start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacation_end_date: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            department: String::new(),
            team: String::new(),
            name: String::new(),
            enabled: true,
            reason_presets: Vec::new(),
            default_preset_index: None,
            vacation_start_date: None,
            vacation_end_date: None,
        }
    }
}

impl Persistable for Settings {
    fn filename() -> &'static str {
        "settings.json"
    }
    fn format() -> Format {
        Format::Json
    }
}

impl Settings {
    /// Loads the store and repairs a default index that no longer points at a
    /// preset.
    pub fn read() -> Result<Self> {
        let mut settings = Self::load()?;
        settings.clamp_default_index();
        Ok(settings)
    }

    pub fn read_from(dir: &Path) -> Result<Self> {
        let mut settings = Self::load_from(dir)?;
        settings.clamp_default_index();
        Ok(settings)
    }

    pub fn clamp_default_index(&mut self) {
        if matches!(self.default_preset_index, Some(i) if i >= self.reason_presets.len()) {
            self.default_preset_index = None;
        }
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.department, &self.team, &self.name)
    }

    pub fn default_preset(&self) -> Option<&str> {
        self.default_preset_index
            .and_then(|i| self.reason_presets.get(i))
            .map(String::as_str)
    }

    /// The explicit vacation range, if one is stored. A half-set, unparseable
    /// or reversed range is an error so callers can keep their own fallback.
    pub fn stored_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, AutofillError> {
        let start = non_blank(self.vacation_start_date.as_deref());
        let end = non_blank(self.vacation_end_date.as_deref());
        if start.is_none() && end.is_none() {
            return Ok(None);
        }
        let invalid = || AutofillError::InvalidStoredRange {
            start: start.map(str::to_string),
            end: end.map(str::to_string),
        };
        let s = start.and_then(leave_date::parse).ok_or_else(invalid)?;
        let e = end.and_then(leave_date::parse).ok_or_else(invalid)?;
        if s > e {
            return Err(invalid());
        }
        Ok(Some((s, e)))
    }

    // ── Settings panel operations ────────────────────────────────────────────

    /// Overwrites the identity fields (trimmed) and the enabled flag.
    pub fn save_basic(&mut self, department: &str, team: &str, name: &str, enabled: bool) {
        self.department = department.trim().to_string();
        self.team = team.trim().to_string();
        self.name = name.trim().to_string();
        self.enabled = enabled;
    }

    /// Appends a preset and returns its index.
    pub fn add_preset(&mut self, value: &str) -> Result<usize, SettingsError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingsError::EmptyPresetValue);
        }
        if self.reason_presets.iter().any(|p| p == value) {
            return Err(SettingsError::DuplicatePreset);
        }
        self.reason_presets.push(value.to_string());
        Ok(self.reason_presets.len() - 1)
    }

    pub fn edit_preset(&mut self, index: usize, value: &str) -> Result<(), SettingsError> {
        if index >= self.reason_presets.len() {
            return Err(SettingsError::NoSuchPreset);
        }
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingsError::EmptyPresetValue);
        }
        let duplicate = self
            .reason_presets
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p == value);
        if duplicate {
            return Err(SettingsError::DuplicatePreset);
        }
        self.reason_presets[index] = value.to_string();
        Ok(())
    }

    /// Removes a preset and keeps the default pointing at the same entry.
    pub fn delete_preset(&mut self, index: usize) -> Result<String, SettingsError> {
        if index >= self.reason_presets.len() {
            return Err(SettingsError::NoSuchPreset);
        }
        let removed = self.reason_presets.remove(index);
        self.default_preset_index = match self.default_preset_index {
            Some(d) if d == index => None,
            Some(d) if d > index => Some(d - 1),
            other => other,
        };
        Ok(removed)
    }

    /// Makes `index` the default, or clears the default when it already is.
    pub fn toggle_default(&mut self, index: usize) -> Result<Option<usize>, SettingsError> {
        if index >= self.reason_presets.len() {
            return Err(SettingsError::NoSuchPreset);
        }
        self.default_preset_index = if self.default_preset_index == Some(index) {
            None
        } else {
            Some(index)
        };
        Ok(self.default_preset_index)
    }

    /// Stores the vacation range as ISO dates. Blank input clears that end.
    pub fn set_vacation_range(&mut self, start: &str, end: &str) -> Result<(), SettingsError> {
        let parse_opt = |text: &str| -> Result<Option<NaiveDate>, SettingsError> {
            match non_blank(Some(text)) {
                None => Ok(None),
                Some(t) => leave_date::parse(t)
                    .map(Some)
                    .ok_or_else(|| SettingsError::InvalidDate(t.to_string())),
            }
        };
        let start = parse_opt(start)?;
        let end = parse_opt(end)?;
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(SettingsError::ReversedRange);
            }
        }
        self.vacation_start_date = start.map(leave_date::format_iso);
        self.vacation_end_date = end.map(leave_date::format_iso);
        Ok(())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

mod preset_index {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(i) => serializer.serialize_i64(*i as i64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = Option::<i64>::deserialize(deserializer)?;
        Ok(raw.and_then(|i| usize::try_from(i).ok()))
    }
}
