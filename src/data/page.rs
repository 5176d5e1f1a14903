use crate::dom::memory::{ElementSpec, MemoryDocument};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// One form element of a page description.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PageField {
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub attrs: BTreeMap<String, String>,
    pub value: String,
    pub picker: bool,
    /// The element is added this long after the page loads.
    pub appear_after_ms: Option<u64>,
}

impl PageField {
    fn spec(&self) -> ElementSpec {
        let tag = if self.tag.is_empty() { "input" } else { &self.tag };
        let mut spec = ElementSpec::new(tag).value(&self.value);
        for (k, v) in &self.attrs {
            spec = spec.attr(k, v);
        }
        if let Some(id) = &self.id {
            spec = spec.id(id);
        }
        if let Some(name) = &self.name {
            spec = spec.attr("name", name);
        }
        if self.picker {
            spec = spec.with_picker();
        }
        spec
    }
}

/// A leave-request page described in YAML, for the preview command.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFixture {
    #[serde(default)]
    pub fields: Vec<PageField>,
}

impl PageFixture {
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_norway::from_str(&contents)
            .with_context(|| format!("failed to parse YAML from {}", path.display()))
    }

    /// Builds the document with every field that is there from the start.
    pub fn build(&self) -> MemoryDocument {
        let doc = MemoryDocument::new();
        for field in self.fields.iter().filter(|f| f.appear_after_ms.is_none()) {
            doc.append(field.spec());
        }
        doc
    }

    /// Adds the late fields to `doc` at their scheduled times.
    pub async fn add_late_fields(&self, doc: &MemoryDocument) {
        let mut late: Vec<(u64, &PageField)> = self
            .fields
            .iter()
            .filter_map(|f| f.appear_after_ms.map(|ms| (ms, f)))
            .collect();
        late.sort_by_key(|(ms, _)| *ms);
        let start = tokio::time::Instant::now();
        for (ms, field) in late {
            tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
            doc.append(field.spec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, Element};
    use tempfile::TempDir;

    const PAGE: &str = r#"
fields:
  - tag: input
    id: subject
  - tag: textarea
    name: editorForm_6
    attrs:
      data-defaultstr: "(가급적 사유를 구체적으로 기재함)"
  - id: startDate
    picker: true
    value: "2024-01-02"
  - id: endDate
    appear_after_ms: 300
"#;

    #[test]
    fn test_parse_page_yaml() {
        let page: PageFixture = serde_norway::from_str(PAGE).unwrap();
        assert_eq!(page.fields.len(), 4);
        assert_eq!(page.fields[1].name.as_deref(), Some("editorForm_6"));
        assert!(page.fields[2].picker);
        assert_eq!(page.fields[3].appear_after_ms, Some(300));
    }

    #[test]
    fn test_build_skips_late_fields_and_defaults_tag() {
        let page: PageFixture = serde_norway::from_str(PAGE).unwrap();
        let doc = page.build();
        assert_eq!(doc.elements().len(), 3);
        let start = doc.query_selector("input#startDate").unwrap();
        assert!(start.date_picker().is_some());
        assert_eq!(start.value(), "2024-01-02");
        assert!(doc.query_selector("#endDate").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_fields_appear() {
        let page: PageFixture = serde_norway::from_str(PAGE).unwrap();
        let doc = page.build();
        page.add_late_fields(&doc).await;
        assert!(doc.query_selector("#endDate").is_some());
    }

    #[test]
    fn test_load_file_reports_path() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("page.yaml");
        let err = PageFixture::load_file(&missing).unwrap_err();
        assert!(format!("{err}").contains("page.yaml"));
    }
}
