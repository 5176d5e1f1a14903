use thiserror::Error;

/// Failures of a single autofill step. Neither aborts the whole pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutofillError {
    #[error("Element not found: {}", selectors.join(" | "))]
    ElementNotFound { selectors: Vec<String> },

    #[error("invalid stored vacation range: {start:?} ~ {end:?}")]
    InvalidStoredRange {
        start: Option<String>,
        end: Option<String>,
    },
}

/// Validation errors raised by the settings panel before anything is written.
///
/// The display text is what the panel shows in its status line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("휴가사유를 입력해주세요.")]
    EmptyPresetValue,

    #[error("이미 등록된 휴가사유입니다.")]
    DuplicatePreset,

    #[error("존재하지 않는 프리셋입니다.")]
    NoSuchPreset,

    #[error("날짜 형식이 올바르지 않습니다: {0} (YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("시작일이 종료일보다 늦습니다.")]
    ReversedRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_names_every_selector() {
        let err = AutofillError::ElementNotFound {
            selectors: vec!["#subject".to_string(), "input[name=\"subject\"]".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Element not found: #subject | input[name=\"subject\"]"
        );
    }

    #[test]
    fn test_preset_error_messages_are_user_facing() {
        assert_eq!(SettingsError::EmptyPresetValue.to_string(), "휴가사유를 입력해주세요.");
        assert_eq!(SettingsError::DuplicatePreset.to_string(), "이미 등록된 휴가사유입니다.");
    }
}
