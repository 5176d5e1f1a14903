//! The host page as seen by the binder: a document that can be queried with
//! CSS selectors and elements that can be read, written and listened to.
//!
//! [`memory::MemoryDocument`] is a headless implementation used by the preview
//! command and the tests.

pub mod acquire;
pub mod date_field;
pub mod memory;
pub mod selector;

use chrono::NaiveDate;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Input,
    Change,
    Focus,
    Blur,
    Click,
    KeyDown,
    PointerEnter,
    PointerDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

impl Key {
    /// Maps a `KeyboardEvent.key` name; anything unhandled is `Other`.
    pub fn from_name(name: &str) -> Key {
        match name {
            "ArrowDown" | "Down" => Key::ArrowDown,
            "ArrowUp" | "Up" => Key::ArrowUp,
            "Enter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            _ => Key::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
    Focus,
    Blur,
    Click,
    KeyDown(Key),
    PointerEnter,
    PointerDown,
}

impl DomEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            DomEvent::Input => EventType::Input,
            DomEvent::Change => EventType::Change,
            DomEvent::Focus => EventType::Focus,
            DomEvent::Blur => EventType::Blur,
            DomEvent::Click => EventType::Click,
            DomEvent::KeyDown(_) => EventType::KeyDown,
            DomEvent::PointerEnter => EventType::PointerEnter,
            DomEvent::PointerDown => EventType::PointerDown,
        }
    }
}

/// An event handler. Returns `true` to prevent the event's default action.
pub type Listener = Rc<dyn Fn(&DomEvent) -> bool>;

/// Bumped on every structural change of the document.
pub type Mutations = watch::Receiver<u64>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event dispatch failed: {0}")]
pub struct DomError(pub String);

/// A date-picker widget the page attached to an input.
pub trait DatePicker {
    fn get_date(&self) -> Option<NaiveDate>;
    fn set_date(&self, date: NaiveDate);
}

pub trait Element: Clone + 'static {
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    /// Returns whether a listener prevented the default action.
    fn dispatch(&self, event: &DomEvent) -> Result<bool, DomError>;
    fn add_listener(&self, event_type: EventType, listener: Listener);
    /// Probes for a date-picker accessor on the element.
    fn date_picker(&self) -> Option<Rc<dyn DatePicker>>;
}

pub trait Document: Clone + 'static {
    type Element: Element;

    fn query_selector(&self, selector: &str) -> Option<Self::Element>;
    fn subscribe_mutations(&self) -> Mutations;
    /// Adds a style sheet unless one with the same id already exists.
    fn inject_style(&self, id: &str, css: &str) -> bool;
    /// Adds a new element at the end of the body. `text` becomes its value.
    fn append_element(&self, tag: &str, attrs: &[(&str, &str)], text: &str) -> Self::Element;
    /// Takes `element` out of the document; false when it was not in it.
    fn remove_element(&self, element: &Self::Element) -> bool;
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}

/// Host pages only notice programmatic writes through events.
pub fn notify_changed<E: Element>(element: &E) -> Result<(), DomError> {
    element.dispatch(&DomEvent::Input)?;
    element.dispatch(&DomEvent::Change)?;
    Ok(())
}

/// Sets the value and emits `input` and `change`.
pub fn write_value<E: Element>(element: &E, value: &str) -> Result<(), DomError> {
    element.set_value(value);
    notify_changed(element)
}

/// [`write_value`] followed by `focus` and `blur`, for fields whose widgets
/// validate on blur.
pub fn fill_value<E: Element>(element: &E, value: &str) -> Result<(), DomError> {
    write_value(element, value)?;
    settle(element)
}

pub(crate) fn settle<E: Element>(element: &E) -> Result<(), DomError> {
    element.dispatch(&DomEvent::Focus)?;
    element.dispatch(&DomEvent::Blur)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::memory::{ElementSpec, MemoryDocument};
    use super::*;

    #[test]
    fn test_write_value_emits_input_then_change() {
        let doc = MemoryDocument::new();
        let el = doc.append(ElementSpec::new("input").id("subject"));
        write_value(&el, "hello").unwrap();
        assert_eq!(el.value(), "hello");
        assert_eq!(el.dispatched(), vec![DomEvent::Input, DomEvent::Change]);
    }

    #[test]
    fn test_fill_value_also_focuses_and_blurs() {
        let doc = MemoryDocument::new();
        let el = doc.append(ElementSpec::new("input").id("subject"));
        fill_value(&el, "x").unwrap();
        assert_eq!(
            el.dispatched(),
            vec![DomEvent::Input, DomEvent::Change, DomEvent::Focus, DomEvent::Blur]
        );
    }

    #[test]
    fn test_key_from_name() {
        assert_eq!(Key::from_name("ArrowDown"), Key::ArrowDown);
        assert_eq!(Key::from_name("Up"), Key::ArrowUp);
        assert_eq!(Key::from_name("Esc"), Key::Escape);
        assert_eq!(Key::from_name("Enter"), Key::Enter);
        assert_eq!(Key::from_name("a"), Key::Other);
    }

    #[test]
    fn test_event_type_of_keydown_ignores_key() {
        assert_eq!(DomEvent::KeyDown(Key::Enter).event_type(), EventType::KeyDown);
        assert_eq!(DomEvent::Blur.event_type(), EventType::Blur);
    }
}
