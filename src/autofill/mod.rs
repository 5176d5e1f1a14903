pub mod autocomplete;

use crate::calc::{build_title, leave_date, Identity};
use crate::data::{AutofillConfig, Settings};
use crate::dom::acquire::wait_for_element;
use crate::dom::date_field::{bind_date_field, DateField};
use crate::dom::{fill_value, Document, DomError, DomEvent, Element};
use crate::error::AutofillError;
use anyhow::Result;
use autocomplete::Autocomplete;
use chrono::NaiveDate;
use std::rc::Rc;
use tracing::{error, info, warn};

pub const STYLE_ID: &str = "leave-autofill-styles";

const STYLES: &str = r#"
.leave-autocomplete { position: absolute; background: white; border: 1px solid #ddd;
  border-radius: 4px; box-shadow: 0 4px 12px rgba(0,0,0,0.15); max-height: 200px;
  overflow-y: auto; z-index: 999999; font-size: 14px; }
.leave-autocomplete-item { padding: 10px 14px; cursor: pointer; border-bottom: 1px solid #f0f0f0; }
.leave-autocomplete-item:last-child { border-bottom: none; }
.leave-autocomplete-item:hover { background: #e8f4fc; }
.leave-autocomplete-item.selected { background: #d0e8f7; }
"#;

/// What one autofill pass left behind on the page.
pub struct Binding<D: Document> {
    pub autocomplete: Option<Rc<Autocomplete<D>>>,
    /// Steps that were skipped, in the order they were given up on.
    pub skipped: Vec<AutofillError>,
    /// False when the pass stopped early on an unexpected failure.
    pub completed: bool,
}

impl<D: Document> Binding<D> {
    fn empty() -> Self {
        Binding {
            autocomplete: None,
            skipped: Vec::new(),
            completed: true,
        }
    }
}

/// The two date inputs plus the fields derived from them.
#[derive(Clone)]
struct DerivedFields<E> {
    identity: Identity,
    start: Rc<dyn DateField>,
    end: Rc<dyn DateField>,
    duration: Option<E>,
    title: Option<E>,
}

impl<E: Element> DerivedFields<E> {
    /// Recomputes duration and title from what the date inputs hold now.
    fn refresh(&self) -> Result<(Option<NaiveDate>, Option<i64>), DomError> {
        let start = self.start.read();
        let days = match (start, self.end.read()) {
            (Some(s), Some(e)) => leave_date::duration_days(s, e),
            _ => None,
        };
        if let Some(el) = &self.duration {
            match days {
                Some(n) => fill_value(el, &n.to_string())?,
                // No valid range, so no duration either.
                None if !el.value().is_empty() => fill_value(el, "")?,
                None => {}
            }
        }
        if let Some(el) = &self.title {
            if !self.identity.is_empty() {
                fill_value(el, &build_title(&self.identity, start, days))?;
            }
        }
        Ok((start, days))
    }

    fn apply_range(&self, start: NaiveDate, end: NaiveDate) -> Result<(), DomError> {
        self.start.write(start)?;
        self.end.write(end)?;
        self.refresh().map(|_| ())
    }

    /// Keeps duration and title in step with user edits for the page's life.
    fn listen(&self) {
        let fields = self.clone();
        let listener = Rc::new(move |_: &DomEvent| {
            match fields.refresh() {
                Ok((start, days)) => info!(?start, ?days, "dates changed, title refreshed"),
                Err(e) => warn!(error = %e, "could not refresh title after date change"),
            }
            false
        });
        self.start.on_change(listener.clone());
        self.end.on_change(listener);
    }
}

/// Fills the leave-request form on `doc` from `settings`. Waits the configured
/// start delay first. Failures are logged, never returned.
pub async fn run<D: Document>(
    doc: &D,
    settings: &Settings,
    config: &AutofillConfig,
    today: NaiveDate,
) -> Binding<D> {
    if !settings.enabled {
        info!("autofill disabled");
        return Binding::empty();
    }
    tokio::time::sleep(config.start_delay()).await;

    let mut binding = Binding::empty();
    if let Err(e) = autofill(doc, settings, config, today, &mut binding).await {
        error!(error = %e, "autofill stopped");
        binding.completed = false;
    }
    binding
}

async fn autofill<D: Document>(
    doc: &D,
    settings: &Settings,
    config: &AutofillConfig,
    today: NaiveDate,
    binding: &mut Binding<D>,
) -> Result<()> {
    info!(
        presets = settings.reason_presets.len(),
        default = settings.default_preset().unwrap_or("none"),
        "autofill starting"
    );
    doc.inject_style(STYLE_ID, STYLES);

    let selectors = &config.selectors;
    let timeout = config.wait_timeout();
    let (title, start, end, duration) = futures::join!(
        wait_for_element(doc, &selectors.title, timeout),
        wait_for_element(doc, &selectors.start_date, timeout),
        wait_for_element(doc, &selectors.end_date, timeout),
        wait_for_element(doc, &selectors.duration, timeout),
    );
    let mut found = |result: Result<D::Element, AutofillError>| match result {
        Ok(el) => Some(el),
        Err(e) => {
            warn!(error = %e, "field skipped");
            binding.skipped.push(e);
            None
        }
    };
    let title = found(title);
    let start = found(start);
    let end = found(end);
    let duration = found(duration);

    let identity = settings.identity();
    match (start, end) {
        (Some(start), Some(end)) => {
            let fields = DerivedFields {
                identity,
                start: bind_date_field(start),
                end: bind_date_field(end),
                duration,
                title,
            };
            fields.apply_range(today, today)?;
            info!(date = %leave_date::format(today), "filled with today");

            match settings.stored_range() {
                Ok(Some((s, e))) => {
                    fields.apply_range(s, e)?;
                    info!(
                        start = %leave_date::format(s),
                        end = %leave_date::format(e),
                        "stored vacation range applied"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "stored vacation range ignored");
                    binding.skipped.push(e);
                }
            }
            fields.listen();
        }
        _ => {
            // Without both date inputs only the title can carry the date.
            if let Some(el) = &title {
                if !identity.is_empty() {
                    let value = build_title(&identity, Some(today), None);
                    fill_value(el, &value)?;
                    info!(title = %value, "title filled");
                }
            }
        }
    }

    if settings.reason_presets.is_empty() {
        info!("no reason presets registered");
        return Ok(());
    }
    match wait_for_element(doc, &selectors.reason, timeout).await {
        Ok(reason) => {
            if let Some(preset) = settings.default_preset() {
                fill_value(&reason, preset)?;
                info!(preset, "default reason filled");
            }
            binding.autocomplete = Some(Autocomplete::attach(
                doc,
                reason,
                settings.reason_presets.clone(),
                config.blur_close_delay(),
            ));
        }
        Err(e) => {
            warn!(error = %e, "reason field skipped");
            binding.skipped.push(e);
        }
    }

    info!("autofill finished");
    Ok(())
}
