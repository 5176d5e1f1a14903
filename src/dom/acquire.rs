use crate::dom::Document;
use crate::error::AutofillError;
use std::time::Duration;

/// First element matched by any selector, trying them in order.
pub fn find_element<D: Document>(doc: &D, selectors: &[String]) -> Option<D::Element> {
    selectors.iter().find_map(|s| doc.query_selector(s))
}

/// Resolves the field now, or as soon as a document mutation makes it appear.
/// The mutation subscription is dropped when this returns, on success or on
/// timeout.
pub async fn wait_for_element<D: Document>(
    doc: &D,
    selectors: &[String],
    timeout: Duration,
) -> Result<D::Element, AutofillError> {
    // Subscribe before the first lookup so no mutation slips in between.
    let mut mutations = doc.subscribe_mutations();
    if let Some(element) = find_element(doc, selectors) {
        return Ok(element);
    }

    let appeared = async {
        while mutations.changed().await.is_ok() {
            if let Some(element) = find_element(doc, selectors) {
                return Some(element);
            }
        }
        None
    };

    match tokio::time::timeout(timeout, appeared).await {
        Ok(Some(element)) => Ok(element),
        _ => Err(AutofillError::ElementNotFound {
            selectors: selectors.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{ElementSpec, MemoryDocument};
    use crate::dom::Element;

    fn sels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_find_element_respects_selector_order() {
        let doc = MemoryDocument::new();
        doc.append(ElementSpec::new("input").attr("name", "subject").value("by-name"));
        doc.append(ElementSpec::new("input").id("subject").value("by-id"));
        let found = find_element(&doc, &sels(&["#subject", r#"input[name="subject"]"#])).unwrap();
        assert_eq!(found.value(), "by-id");
        let found = find_element(&doc, &sels(&["#missing", r#"input[name="subject"]"#])).unwrap();
        assert_eq!(found.value(), "by-name");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_present_element_immediately() {
        let doc = MemoryDocument::new();
        doc.append(ElementSpec::new("input").id("subject"));
        let el = wait_for_element(&doc, &sels(&["#subject"]), Duration::from_secs(10)).await;
        assert!(el.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_picks_up_late_element() {
        let doc = MemoryDocument::new();
        let late = async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            doc.append(ElementSpec::new("input").id("other"));
            tokio::time::sleep(Duration::from_millis(300)).await;
            doc.append(ElementSpec::new("textarea").id("editorForm_6").value("late"));
        };
        let selectors = sels(&["#editorForm_6"]);
        let (found, ()) = tokio::join!(
            wait_for_element(&doc, &selectors, Duration::from_secs(10)),
            late
        );
        assert_eq!(found.unwrap().value(), "late");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_naming_selectors() {
        let doc = MemoryDocument::new();
        let started = tokio::time::Instant::now();
        let err = wait_for_element(&doc, &sels(&["#a", "#b"]), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AutofillError::ElementNotFound {
                selectors: sels(&["#a", "#b"])
            }
        );
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_finds_regenerated_element() {
        let doc = MemoryDocument::new();
        let regen = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            doc.append(ElementSpec::new("input").id("draft"));
            doc.remove("#draft");
            tokio::time::sleep(Duration::from_millis(100)).await;
            doc.append(ElementSpec::new("input").id("subject").value("regenerated"));
        };
        let selectors = sels(&["#subject"]);
        let (found, ()) = tokio::join!(
            wait_for_element(&doc, &selectors, Duration::from_secs(1)),
            regen
        );
        assert_eq!(found.unwrap().value(), "regenerated");
    }
}
