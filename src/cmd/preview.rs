use crate::autofill::{self, Binding};
use crate::calc::leave_date;
use crate::data::{AutofillConfig, PageFixture, Settings};
use crate::dom::memory::MemoryDocument;
use crate::dom::{DomEvent, Element, Key};
use anyhow::{anyhow, bail, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::str::FromStr;

/// A user action replayed on the reason field after the fill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Gesture {
    Click,
    Key(Key),
    /// Pointer over the item at this zero-based index.
    Hover(usize),
    /// Pointer down on the item at this zero-based index.
    Pick(usize),
}

impl FromStr for Gesture {
    type Err = anyhow::Error;

    /// `click`, `hover:N`, `pick:N` (N counts from 1, as printed), or a key
    /// name such as `ArrowDown`.
    fn from_str(text: &str) -> Result<Self> {
        let item = |n: &str| -> Result<usize> {
            match n.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n - 1),
                _ => bail!("invalid item number '{n}' in '{text}'"),
            }
        };
        Ok(match text.split_once(':') {
            Some(("hover", n)) => Gesture::Hover(item(n)?),
            Some(("pick", n)) => Gesture::Pick(item(n)?),
            Some(_) => bail!("unknown gesture '{text}'"),
            None if text == "click" => Gesture::Click,
            None => Gesture::Key(Key::from_name(text)),
        })
    }
}

/// Runs one autofill pass against a page described in YAML and prints what
/// every field ends up holding.
pub fn run(page: &Path, today: Option<&str>, press: &[String]) -> Result<()> {
    let gestures = press
        .iter()
        .map(|g| g.parse())
        .collect::<Result<Vec<Gesture>>>()?;
    let fixture = PageFixture::load_file(page)?;
    let settings = Settings::read()?;
    let config = AutofillConfig::load()?;
    let today = match today {
        Some(text) => leave_date::parse(text)
            .ok_or_else(|| anyhow!("invalid --today date '{text}', expected YYYY-MM-DD"))?,
        None => Local::now().date_naive(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let (doc, binding) = runtime.block_on(fill(&fixture, &settings, &config, today));
    replay(&binding, &gestures)?;
    write_preview(&doc, &binding, &mut std::io::stdout())
}

pub(crate) async fn fill(
    fixture: &PageFixture,
    settings: &Settings,
    config: &AutofillConfig,
    today: NaiveDate,
) -> (MemoryDocument, Binding<MemoryDocument>) {
    let doc = fixture.build();
    let (binding, ()) = futures::join!(
        autofill::run(&doc, settings, config, today),
        fixture.add_late_fields(&doc),
    );
    (doc, binding)
}

/// Dispatches `gestures` on the reason field and the suggestion panel.
pub(crate) fn replay(binding: &Binding<MemoryDocument>, gestures: &[Gesture]) -> Result<()> {
    if gestures.is_empty() {
        return Ok(());
    }
    let Some(widget) = &binding.autocomplete else {
        bail!("no suggestion widget on this page to press keys on");
    };
    let input = widget.input();
    for gesture in gestures {
        let (target, event) = match *gesture {
            Gesture::Click => (input.clone(), DomEvent::Click),
            Gesture::Key(key) => (input.clone(), DomEvent::KeyDown(key)),
            Gesture::Hover(i) | Gesture::Pick(i) => {
                let item = widget
                    .item_element(i)
                    .ok_or_else(|| anyhow!("{gesture:?}: no suggestion item {} on screen", i + 1))?;
                let event = if matches!(gesture, Gesture::Hover(_)) {
                    DomEvent::PointerEnter
                } else {
                    DomEvent::PointerDown
                };
                (item, event)
            }
        };
        target.dispatch(&event)?;
    }
    Ok(())
}

pub(crate) fn write_preview<W: std::io::Write>(
    doc: &MemoryDocument,
    binding: &Binding<MemoryDocument>,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Filled page")?;
    writeln!(out, "---")?;
    for element in doc.elements() {
        let value = element.value();
        let shown = if value.is_empty() { "(empty)" } else { value.as_str() };
        writeln!(out, "  {:<36} {}", element.label(), shown)?;
    }

    if !binding.skipped.is_empty() {
        writeln!(out, "---")?;
        writeln!(out, "Skipped")?;
        for skipped in &binding.skipped {
            writeln!(out, "  {skipped}")?;
        }
    }

    if let Some(widget) = &binding.autocomplete {
        writeln!(out, "---")?;
        writeln!(out, "Reason suggestions on {}", widget.input().label())?;
        let was_open = widget.is_open();
        if was_open {
            writeln!(out, "  (panel left open)")?;
        } else {
            widget.focus();
        }
        for (i, item) in widget.visible_items().iter().enumerate() {
            writeln!(out, "  {:<4} {}", i + 1, item)?;
        }
        if !was_open {
            widget.close();
        }
    }

    if !binding.completed {
        writeln!(out, "---")?;
        writeln!(out, "Autofill stopped early; see the log for the cause.")?;
    }
    Ok(())
}
