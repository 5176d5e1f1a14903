use crate::data::persistence::{Format, Persistable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Ordered selector fallbacks for every field the binder touches.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FieldSelectors {
    pub title: Vec<String>,
    pub reason: Vec<String>,
    pub start_date: Vec<String>,
    pub end_date: Vec<String>,
    pub duration: Vec<String>,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        FieldSelectors {
            title: list(&[
                "#subject",
                r#"input[name="subject"]"#,
                r#"input[data-defaultstr=" 본부 / 팀명 / 이름 / 휴가일/일수"]"#,
                r#"input[data-defaultstr=" 본부 / 팀명 / 이름 / 휴가일자"]"#,
            ]),
            reason: list(&[
                "#editorForm_6",
                r#"textarea[name="editorForm_6"]"#,
                r#"textarea[data-defaultstr="(가급적 사유를 구체적으로 기재함)"]"#,
            ]),
            start_date: list(&["#startDate", r#"input[name="startDate"]"#]),
            end_date: list(&["#endDate", r#"input[name="endDate"]"#]),
            duration: list(&["#vacationDays", r#"input[name="vacationDays"]"#]),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AutofillConfig {
    pub selectors: FieldSelectors,
    pub wait_timeout_ms: u64,
    pub blur_close_delay_ms: u64,
    pub start_delay_ms: u64,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        AutofillConfig {
            selectors: FieldSelectors::default(),
            wait_timeout_ms: 10_000,
            blur_close_delay_ms: 150,
            start_delay_ms: 500,
        }
    }
}

impl AutofillConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn blur_close_delay(&self) -> Duration {
        Duration::from_millis(self.blur_close_delay_ms)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }
}

/// Reads the `autofill` key of config.yaml; other keys are left alone.
#[derive(Serialize, Deserialize, Default, Debug)]
struct ConfigWrapper {
    #[serde(default)]
    autofill: AutofillConfig,
}

impl Persistable for ConfigWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn format() -> Format {
        Format::Yaml
    }
}

impl AutofillConfig {
    pub fn load() -> Result<Self> {
        Ok(ConfigWrapper::load()?.autofill)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(ConfigWrapper::load_from(dir)?.autofill)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        ConfigWrapper {
            autofill: self.clone(),
        }
        .save_to(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_timings() {
        let config = AutofillConfig::default();
        assert_eq!(config.wait_timeout(), Duration::from_secs(10));
        assert_eq!(config.blur_close_delay(), Duration::from_millis(150));
        assert_eq!(config.start_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_default_selectors_prefer_id_first() {
        let selectors = FieldSelectors::default();
        assert_eq!(selectors.title[0], "#subject");
        assert_eq!(selectors.reason[0], "#editorForm_6");
        assert_eq!(selectors.title.len(), 4);
    }

    #[test]
    fn test_missing_autofill_key_uses_default() {
        let wrapper: ConfigWrapper = serde_norway::from_str("other: 1").unwrap();
        assert_eq!(wrapper.autofill, AutofillConfig::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let yaml = "autofill:\n  wait_timeout_ms: 2500\n  selectors:\n    title: ['#t']\n";
        let wrapper: ConfigWrapper = serde_norway::from_str(yaml).unwrap();
        assert_eq!(wrapper.autofill.wait_timeout_ms, 2500);
        assert_eq!(wrapper.autofill.blur_close_delay_ms, 150);
        assert_eq!(wrapper.autofill.selectors.title, vec!["#t"]);
        assert_eq!(
            wrapper.autofill.selectors.reason,
            FieldSelectors::default().reason
        );
    }

    #[test]
    fn test_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let config = AutofillConfig {
            start_delay_ms: 0,
            ..Default::default()
        };
        config.save_to(tmp.path()).unwrap();
        assert_eq!(AutofillConfig::load_from(tmp.path()).unwrap(), config);
    }
}
