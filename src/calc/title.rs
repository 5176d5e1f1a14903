use crate::calc::leave_date;
use chrono::NaiveDate;

const SEPARATOR: &str = " / ";

/// The identity part of a leave-request title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    pub department: String,
    pub team: String,
    pub name: String,
}

impl Identity {
    pub fn new(department: &str, team: &str, name: &str) -> Self {
        Identity {
            department: department.to_string(),
            team: team.to_string(),
            name: name.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.department, &self.team, &self.name]
            .iter()
            .all(|s| s.trim().is_empty())
    }
}

/// `"{department} / {team} / {name} / {YYYY.MM.DD} / {n}일"`, skipping every
/// segment that is blank or unknown.
pub fn build_title(identity: &Identity, start: Option<NaiveDate>, days: Option<i64>) -> String {
    let mut parts: Vec<String> = [&identity.department, &identity.team, &identity.name]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(date) = start {
        parts.push(leave_date::format(date));
    }
    if let Some(n) = days {
        parts.push(format!("{n}일"));
    }
    parts.join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Identity {
        Identity::new("A", "B", "C")
    }

    #[test]
    fn test_title_identity_only() {
        assert_eq!(build_title(&abc(), None, None), "A / B / C");
    }

    #[test]
    fn test_title_with_start_and_duration() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(
            build_title(&abc(), start, Some(3)),
            "A / B / C / 2024.03.01 / 3일"
        );
    }

    #[test]
    fn test_title_skips_empty_segments() {
        let identity = Identity::new("", "B", "  ");
        let start = NaiveDate::from_ymd_opt(2024, 3, 1);
        assert_eq!(build_title(&identity, start, None), "B / 2024.03.01");
    }

    #[test]
    fn test_title_everything_missing_is_empty() {
        assert_eq!(build_title(&Identity::default(), None, None), "");
    }

    #[test]
    fn test_identity_is_empty_ignores_whitespace() {
        assert!(Identity::new(" ", "", "").is_empty());
        assert!(!Identity::new("", "", "홍길동").is_empty());
    }
}
