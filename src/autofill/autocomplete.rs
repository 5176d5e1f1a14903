use crate::dom::{write_value, Document, DomError, DomEvent, Element, EventType, Key};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The floating list. It exists only while the widget is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dropdown {
    items: Vec<String>,
    selected: Option<usize>,
}

impl Dropdown {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub prevent_default: bool,
}

/// Open/closed state and selection of a preset picker. Pure: it never
/// touches the page.
#[derive(Clone, Debug)]
pub struct AutocompleteState {
    items: Vec<String>,
    dropdown: Option<Dropdown>,
}

impl AutocompleteState {
    pub fn new(items: Vec<String>) -> Self {
        AutocompleteState {
            items,
            dropdown: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.dropdown.is_some()
    }

    pub fn dropdown(&self) -> Option<&Dropdown> {
        self.dropdown.as_ref()
    }

    pub fn selected(&self) -> Option<usize> {
        self.dropdown.as_ref().and_then(|d| d.selected)
    }

    /// Opens (or re-renders) the full list with nothing selected. Without
    /// items there is nothing to show and the widget stays closed.
    pub fn show(&mut self) -> bool {
        if self.items.is_empty() {
            return false;
        }
        self.dropdown = Some(Dropdown {
            items: self.items.clone(),
            selected: None,
        });
        true
    }

    pub fn hide(&mut self) {
        self.dropdown = None;
    }

    /// Typing re-renders the list but never filters it.
    pub fn on_input(&mut self) {
        if let Some(dropdown) = self.dropdown.as_mut() {
            dropdown.selected = None;
        }
    }

    pub fn hover(&mut self, index: usize) {
        if let Some(dropdown) = self.dropdown.as_mut() {
            if index < dropdown.items.len() {
                dropdown.selected = Some(index);
            }
        }
    }

    /// Chooses the item at `index` and closes. Returns the committed text.
    pub fn pick(&mut self, index: usize) -> Option<String> {
        let value = self.dropdown.as_ref()?.items.get(index)?.clone();
        self.hide();
        Some(value)
    }

    /// Keyboard handling. A commit, if any, is returned alongside.
    pub fn on_key(&mut self, key: Key) -> (KeyOutcome, Option<String>) {
        let Some(dropdown) = self.dropdown.as_mut() else {
            if matches!(key, Key::ArrowDown | Key::ArrowUp) {
                self.show();
                return (KeyOutcome { prevent_default: true }, None);
            }
            return (KeyOutcome::default(), None);
        };

        match key {
            Key::ArrowDown => {
                let next = dropdown.selected.map_or(0, |i| i + 1);
                dropdown.selected = Some(next.min(dropdown.last_index()));
                (KeyOutcome { prevent_default: true }, None)
            }
            Key::ArrowUp => {
                let prev = dropdown.selected.map_or(0, |i| i.saturating_sub(1));
                dropdown.selected = Some(prev);
                (KeyOutcome { prevent_default: true }, None)
            }
            Key::Enter => match dropdown.selected {
                Some(index) => {
                    let value = self.pick(index);
                    (KeyOutcome { prevent_default: true }, value)
                }
                None => (KeyOutcome::default(), None),
            },
            Key::Escape => {
                self.hide();
                (KeyOutcome::default(), None)
            }
            Key::Other => (KeyOutcome::default(), None),
        }
    }
}

pub const PANEL_CLASS: &str = "leave-autocomplete";
pub const ITEM_CLASS: &str = "leave-autocomplete-item";
const SELECTED_ITEM_CLASS: &str = "leave-autocomplete-item selected";

/// The rendered list: a container plus one element per item, all appended
/// to the document while the widget is open.
struct Panel<E> {
    root: E,
    items: Vec<E>,
}

/// A preset picker bound to one field of the page.
pub struct Autocomplete<D: Document> {
    doc: D,
    input: D::Element,
    state: RefCell<AutocompleteState>,
    panel: RefCell<Option<Panel<D::Element>>>,
}

impl<D: Document> Autocomplete<D> {
    /// Hooks the widget to `input` for the rest of the page's life. `items`
    /// is a snapshot; later store changes are not seen.
    pub fn attach(doc: &D, input: D::Element, items: Vec<String>, blur_delay: Duration) -> Rc<Self> {
        let widget = Rc::new(Autocomplete {
            doc: doc.clone(),
            input: input.clone(),
            state: RefCell::new(AutocompleteState::new(items)),
            panel: RefCell::new(None),
        });

        for event_type in [EventType::Focus, EventType::Click] {
            let w = widget.clone();
            input.add_listener(
                event_type,
                Rc::new(move |_: &DomEvent| {
                    w.focus();
                    false
                }),
            );
        }

        let w = widget.clone();
        input.add_listener(
            EventType::Blur,
            Rc::new(move |_: &DomEvent| {
                // Give a pointer-down on an item the chance to land first.
                let widget = w.clone();
                w.doc
                    .set_timeout(blur_delay, Box::new(move || widget.close()));
                false
            }),
        );

        let w = widget.clone();
        input.add_listener(
            EventType::Input,
            Rc::new(move |_: &DomEvent| {
                w.state.borrow_mut().on_input();
                w.mark_selected();
                false
            }),
        );

        let w = widget.clone();
        input.add_listener(
            EventType::KeyDown,
            Rc::new(move |event: &DomEvent| match event {
                DomEvent::KeyDown(key) => w.key(*key).prevent_default,
                _ => false,
            }),
        );

        info!(items = widget.state.borrow().items.len(), "autocomplete attached");
        widget
    }

    pub fn input(&self) -> &D::Element {
        &self.input
    }

    /// True while the panel is in the document.
    pub fn is_open(&self) -> bool {
        self.panel.borrow().is_some()
    }

    /// Texts of the item elements currently in the document.
    pub fn visible_items(&self) -> Vec<String> {
        self.panel
            .borrow()
            .as_ref()
            .map(|p| p.items.iter().map(|item| item.value()).collect())
            .unwrap_or_default()
    }

    /// The rendered element of item `index`, while the panel is open.
    pub fn item_element(&self, index: usize) -> Option<D::Element> {
        self.panel.borrow().as_ref()?.items.get(index).cloned()
    }

    pub fn focus(self: &Rc<Self>) {
        let shown = self.state.borrow_mut().show();
        if shown {
            self.open_panel();
            debug!("autocomplete opened");
        } else {
            debug!("no presets, autocomplete stays closed");
        }
    }

    pub fn close(&self) {
        self.state.borrow_mut().hide();
        self.remove_panel();
    }

    pub fn key(self: &Rc<Self>, key: Key) -> KeyOutcome {
        let was_open = self.is_open();
        let (outcome, commit) = self.state.borrow_mut().on_key(key);
        let open = self.state.borrow().is_open();
        match (was_open, open) {
            (false, true) => self.open_panel(),
            (true, false) => self.remove_panel(),
            (true, true) => self.mark_selected(),
            (false, false) => {}
        }
        if let Some(value) = commit {
            self.commit(&value);
        }
        outcome
    }

    fn pointer_enter(&self, index: usize) {
        self.state.borrow_mut().hover(index);
        self.mark_selected();
    }

    /// Pointer-down rather than click, so it runs before the blur close.
    fn pointer_down(&self, index: usize) {
        let commit = self.state.borrow_mut().pick(index);
        self.remove_panel();
        if let Some(value) = commit {
            self.commit(&value);
        }
    }

    /// Replaces any panel with a fresh one built from the current list.
    fn open_panel(self: &Rc<Self>) {
        self.remove_panel();
        let items = match self.state.borrow().dropdown() {
            Some(dropdown) => dropdown.items().to_vec(),
            None => return,
        };
        let root = self.doc.append_element("div", &[("class", PANEL_CLASS)], "");
        let items = items
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let position = index.to_string();
                let item = self.doc.append_element(
                    "div",
                    &[("class", ITEM_CLASS), ("data-index", position.as_str())],
                    text,
                );
                let w = Rc::downgrade(self);
                item.add_listener(
                    EventType::PointerEnter,
                    Rc::new(move |_: &DomEvent| {
                        if let Some(w) = w.upgrade() {
                            w.pointer_enter(index);
                        }
                        false
                    }),
                );
                let w = Rc::downgrade(self);
                item.add_listener(
                    EventType::PointerDown,
                    Rc::new(move |_: &DomEvent| {
                        if let Some(w) = w.upgrade() {
                            w.pointer_down(index);
                        }
                        true
                    }),
                );
                item
            })
            .collect();
        *self.panel.borrow_mut() = Some(Panel { root, items });
        self.mark_selected();
    }

    fn remove_panel(&self) {
        let Some(panel) = self.panel.borrow_mut().take() else {
            return;
        };
        for item in &panel.items {
            self.doc.remove_element(item);
        }
        self.doc.remove_element(&panel.root);
    }

    /// Moves the `selected` class to the highlighted item.
    fn mark_selected(&self) {
        let selected = self.state.borrow().selected();
        if let Some(panel) = self.panel.borrow().as_ref() {
            for (index, item) in panel.items.iter().enumerate() {
                let class = if selected == Some(index) { SELECTED_ITEM_CLASS } else { ITEM_CLASS };
                if item.attribute("class").as_deref() != Some(class) {
                    item.set_attribute("class", class);
                }
            }
        }
    }

    fn commit(&self, value: &str) {
        // The state borrow is released here; the events below re-enter the
        // listeners.
        match write_value(&self.input, value) {
            Ok(()) => info!(preset = value, "preset selected"),
            Err(DomError(reason)) => warn!(%reason, "preset written but events failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::{ElementSpec, MemoryDocument, MemoryElement};

    fn items(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn setup(names: &[&str]) -> (MemoryDocument, MemoryElement, Rc<Autocomplete<MemoryDocument>>) {
        let doc = MemoryDocument::new();
        let el = doc.append(ElementSpec::new("textarea").id("editorForm_6").value("기존 값"));
        let widget = Autocomplete::attach(&doc, el.clone(), items(names), Duration::from_millis(150));
        (doc, el, widget)
    }

    fn press(el: &MemoryElement, key: Key) -> bool {
        el.dispatch(&DomEvent::KeyDown(key)).unwrap()
    }

    fn item(doc: &MemoryDocument, index: usize) -> MemoryElement {
        doc.query_selector(&format!(r#"div[data-index="{index}"]"#)).unwrap()
    }

    fn panel(doc: &MemoryDocument) -> Option<MemoryElement> {
        doc.query_selector(r#"div[class="leave-autocomplete"]"#)
    }

    // ── State machine ────────────────────────────────────────────────────────

    #[test]
    fn test_show_without_items_stays_closed() {
        let mut state = AutocompleteState::new(vec![]);
        assert!(!state.show());
        assert!(!state.is_open());
        let (outcome, commit) = state.on_key(Key::ArrowDown);
        assert!(outcome.prevent_default);
        assert!(commit.is_none());
        assert!(!state.is_open());
    }

    #[test]
    fn test_arrow_while_closed_opens_without_selecting() {
        let mut state = AutocompleteState::new(items(&["a", "b"]));
        let (outcome, _) = state.on_key(Key::ArrowUp);
        assert!(outcome.prevent_default);
        assert!(state.is_open());
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_arrow_down_clamps_at_last_item() {
        let mut state = AutocompleteState::new(items(&["a", "b", "c"]));
        state.show();
        for _ in 0..5 {
            state.on_key(Key::ArrowDown);
        }
        assert_eq!(state.selected(), Some(2));
    }

    #[test]
    fn test_arrow_up_clamps_at_first_item() {
        let mut state = AutocompleteState::new(items(&["a", "b", "c"]));
        state.show();
        state.on_key(Key::ArrowUp);
        assert_eq!(state.selected(), Some(0));
        state.on_key(Key::ArrowDown);
        state.on_key(Key::ArrowDown);
        state.on_key(Key::ArrowUp);
        state.on_key(Key::ArrowUp);
        state.on_key(Key::ArrowUp);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn test_enter_without_selection_does_nothing() {
        let mut state = AutocompleteState::new(items(&["a"]));
        state.show();
        let (outcome, commit) = state.on_key(Key::Enter);
        assert!(!outcome.prevent_default);
        assert!(commit.is_none());
        assert!(state.is_open());
    }

    #[test]
    fn test_hover_moves_selection_and_reshow_clears_it() {
        let mut state = AutocompleteState::new(items(&["a", "b"]));
        state.show();
        state.hover(1);
        assert_eq!(state.selected(), Some(1));
        state.hover(7);
        assert_eq!(state.selected(), Some(1));
        state.show();
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_input_clears_selection_but_keeps_all_items() {
        let mut state = AutocompleteState::new(items(&["a", "b"]));
        state.show();
        state.hover(1);
        state.on_input();
        assert_eq!(state.selected(), None);
        assert_eq!(state.dropdown().unwrap().items().len(), 2);
    }

    #[test]
    fn test_pick_closes_and_returns_value() {
        let mut state = AutocompleteState::new(items(&["a", "b"]));
        state.show();
        assert_eq!(state.pick(1), Some("b".to_string()));
        assert!(!state.is_open());
        assert_eq!(state.pick(0), None);
    }

    // ── Widget bound to an element ───────────────────────────────────────────

    #[test]
    fn test_down_down_enter_commits_second_item() {
        let (_doc, el, widget) = setup(&["a", "b", "c"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        assert!(press(&el, Key::ArrowDown));
        assert!(press(&el, Key::ArrowDown));
        assert!(press(&el, Key::Enter));
        assert_eq!(el.value(), "b");
        assert!(!widget.is_open());
    }

    #[test]
    fn test_commit_emits_input_and_change() {
        let (doc, el, widget) = setup(&["a", "b"]);
        widget.focus();
        el.clear_dispatched();
        assert!(item(&doc, 0).dispatch(&DomEvent::PointerDown).unwrap());
        assert_eq!(el.value(), "a");
        assert_eq!(el.dispatched(), vec![DomEvent::Input, DomEvent::Change]);
    }

    #[test]
    fn test_escape_never_touches_value() {
        let (_doc, el, widget) = setup(&["a", "b"]);
        el.dispatch(&DomEvent::Click).unwrap();
        press(&el, Key::ArrowDown);
        assert!(!press(&el, Key::Escape));
        assert!(!widget.is_open());
        assert_eq!(el.value(), "기존 값");
    }

    #[test]
    fn test_blur_closes_after_grace_delay() {
        let (doc, el, widget) = setup(&["a"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        el.dispatch(&DomEvent::Blur).unwrap();
        assert!(widget.is_open());
        doc.advance_time(Duration::from_millis(149));
        assert!(widget.is_open());
        doc.advance_time(Duration::from_millis(1));
        assert!(!widget.is_open());
    }

    #[test]
    fn test_pointer_down_during_grace_delay_commits() {
        let (doc, el, widget) = setup(&["a", "b"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        item(&doc, 1).dispatch(&DomEvent::PointerEnter).unwrap();
        assert_eq!(widget.state.borrow().selected(), Some(1));
        el.dispatch(&DomEvent::Blur).unwrap();
        item(&doc, 1).dispatch(&DomEvent::PointerDown).unwrap();
        doc.advance_time(Duration::from_millis(200));
        assert_eq!(el.value(), "b");
        assert!(!widget.is_open());
    }

    #[test]
    fn test_focus_shows_items_in_order_every_time() {
        let (_doc, el, widget) = setup(&["사유A", "사유B"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        assert_eq!(widget.visible_items(), items(&["사유A", "사유B"]));
        press(&el, Key::Escape);
        assert!(widget.visible_items().is_empty());
        el.dispatch(&DomEvent::Focus).unwrap();
        assert_eq!(widget.visible_items().len(), 2);
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let (_doc, el, widget) = setup(&["a"]);
        assert!(!press(&el, Key::Other));
        assert!(!widget.is_open());
    }

    // ── Panel in the document ────────────────────────────────────────────────

    #[test]
    fn test_focus_appends_panel_with_one_item_per_preset() {
        let (doc, el, widget) = setup(&["사유A", "사유B"]);
        assert_eq!(doc.elements().len(), 1);
        el.dispatch(&DomEvent::Focus).unwrap();
        assert!(panel(&doc).is_some());
        assert_eq!(doc.elements().len(), 4);
        assert_eq!(item(&doc, 0).value(), "사유A");
        assert_eq!(item(&doc, 1).value(), "사유B");
        assert!(widget.is_open());
    }

    #[test]
    fn test_close_removes_panel_from_document() {
        let (doc, el, widget) = setup(&["a", "b"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        press(&el, Key::Escape);
        assert!(panel(&doc).is_none());
        assert_eq!(doc.elements().len(), 1);
        assert!(!widget.is_open());
    }

    #[test]
    fn test_refocus_replaces_panel_instead_of_stacking() {
        let (doc, el, _widget) = setup(&["a", "b"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        el.dispatch(&DomEvent::Click).unwrap();
        assert_eq!(doc.elements().len(), 4);
    }

    #[test]
    fn test_selected_class_follows_keys_and_pointer() {
        let (doc, el, _widget) = setup(&["a", "b", "c"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        press(&el, Key::ArrowDown);
        assert_eq!(
            item(&doc, 0).attribute("class").as_deref(),
            Some("leave-autocomplete-item selected")
        );
        item(&doc, 2).dispatch(&DomEvent::PointerEnter).unwrap();
        assert_eq!(item(&doc, 0).attribute("class").as_deref(), Some(ITEM_CLASS));
        assert_eq!(
            item(&doc, 2).attribute("class").as_deref(),
            Some("leave-autocomplete-item selected")
        );
        el.type_text("x");
        el.dispatch(&DomEvent::Input).unwrap();
        assert_eq!(item(&doc, 2).attribute("class").as_deref(), Some(ITEM_CLASS));
    }

    #[test]
    fn test_arrow_key_while_closed_renders_panel() {
        let (doc, el, widget) = setup(&["a"]);
        assert!(press(&el, Key::ArrowDown));
        assert!(panel(&doc).is_some());
        assert_eq!(widget.state.borrow().selected(), None);
    }

    #[test]
    fn test_pointer_down_removes_panel_before_commit() {
        let (doc, el, _widget) = setup(&["a", "b"]);
        el.dispatch(&DomEvent::Focus).unwrap();
        item(&doc, 1).dispatch(&DomEvent::PointerDown).unwrap();
        assert_eq!(el.value(), "b");
        assert!(panel(&doc).is_none());
        assert_eq!(doc.elements().len(), 1);
    }
}
