use crate::dom::selector::Selector;
use crate::dom::{DatePicker, Document, DomError, DomEvent, Element, EventType, Listener, Mutations};
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::watch;

/// What to put into a [`MemoryDocument`].
#[derive(Clone, Debug, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub value: String,
    pub picker: bool,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        ElementSpec {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Backs the element with a date picker that stores ISO dates.
    pub fn with_picker(mut self) -> Self {
        self.picker = true;
        self
    }
}

struct Node {
    tag: String,
    attrs: RefCell<BTreeMap<String, String>>,
    value: RefCell<String>,
    picker: bool,
    listeners: RefCell<Vec<(EventType, Listener)>>,
    dispatched: RefCell<Vec<DomEvent>>,
    refuse_events: Cell<bool>,
}

#[derive(Clone)]
pub struct MemoryElement {
    node: Rc<Node>,
}

impl std::fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryElement")
            .field("label", &self.label())
            .field("value", &*self.node.value.borrow())
            .finish()
    }
}

impl MemoryElement {
    /// Every event dispatched on this element, in order.
    pub fn dispatched(&self) -> Vec<DomEvent> {
        self.node.dispatched.borrow().clone()
    }

    pub fn clear_dispatched(&self) {
        self.node.dispatched.borrow_mut().clear();
    }

    /// Makes every later dispatch on this element fail, like a page whose
    /// handlers throw.
    pub fn refuse_events(&self) {
        self.node.refuse_events.set(true);
    }

    /// Simulates the user typing: sets the value without any event.
    pub fn type_text(&self, text: &str) {
        *self.node.value.borrow_mut() = text.to_string();
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.node.tag, &self.node.attrs.borrow())
    }

    pub fn same_node(&self, other: &MemoryElement) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn label(&self) -> String {
        let attrs = self.node.attrs.borrow();
        match attrs.get("id") {
            Some(id) => format!("{}#{}", self.node.tag, id),
            None => match attrs.get("name") {
                Some(name) => format!("{}[name=\"{}\"]", self.node.tag, name),
                None => self.node.tag.clone(),
            },
        }
    }
}

impl Element for MemoryElement {
    fn value(&self) -> String {
        self.node.value.borrow().clone()
    }

    fn set_value(&self, value: &str) {
        *self.node.value.borrow_mut() = value.to_string();
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.node.attrs.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.node
            .attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn dispatch(&self, event: &DomEvent) -> Result<bool, DomError> {
        if self.node.refuse_events.get() {
            return Err(DomError(format!("{} refused {:?}", self.label(), event)));
        }
        self.node.dispatched.borrow_mut().push(*event);
        // Listeners may write back into this element.
        let listeners: Vec<Listener> = self
            .node
            .listeners
            .borrow()
            .iter()
            .filter(|(t, _)| *t == event.event_type())
            .map(|(_, l)| l.clone())
            .collect();
        let mut prevented = false;
        for listener in listeners {
            prevented |= listener(event);
        }
        Ok(prevented)
    }

    fn add_listener(&self, event_type: EventType, listener: Listener) {
        self.node.listeners.borrow_mut().push((event_type, listener));
    }

    fn date_picker(&self) -> Option<Rc<dyn DatePicker>> {
        if !self.node.picker {
            return None;
        }
        Some(Rc::new(MemoryPicker {
            node: self.node.clone(),
        }))
    }
}

/// Date picker over a node's value, keeping it in ISO form.
struct MemoryPicker {
    node: Rc<Node>,
}

impl DatePicker for MemoryPicker {
    fn get_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.node.value.borrow().trim(), "%Y-%m-%d").ok()
    }

    fn set_date(&self, date: NaiveDate) {
        *self.node.value.borrow_mut() = date.format("%Y-%m-%d").to_string();
    }
}

struct Timer {
    due: Duration,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct DocInner {
    nodes: RefCell<Vec<MemoryElement>>,
    styles: RefCell<BTreeMap<String, String>>,
    mutations: watch::Sender<u64>,
    timers: RefCell<Vec<Timer>>,
    now: Cell<Duration>,
    next_seq: Cell<u64>,
}

/// A headless page: a flat list of form elements, injected styles and a
/// virtual clock for `set_timeout`.
#[derive(Clone)]
pub struct MemoryDocument {
    inner: Rc<DocInner>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let (mutations, _) = watch::channel(0);
        MemoryDocument {
            inner: Rc::new(DocInner {
                nodes: RefCell::new(Vec::new()),
                styles: RefCell::new(BTreeMap::new()),
                mutations,
                timers: RefCell::new(Vec::new()),
                now: Cell::new(Duration::ZERO),
                next_seq: Cell::new(0),
            }),
        }
    }

    pub fn append(&self, spec: ElementSpec) -> MemoryElement {
        let element = MemoryElement {
            node: Rc::new(Node {
                tag: spec.tag.to_ascii_lowercase(),
                attrs: RefCell::new(spec.attrs),
                value: RefCell::new(spec.value),
                picker: spec.picker,
                listeners: RefCell::new(Vec::new()),
                dispatched: RefCell::new(Vec::new()),
                refuse_events: Cell::new(false),
            }),
        };
        self.inner.nodes.borrow_mut().push(element.clone());
        self.mutated();
        element
    }

    /// Removes every element matching `selector`; returns how many went.
    pub fn remove(&self, selector: &str) -> usize {
        let Some(selector) = Selector::parse(selector) else {
            return 0;
        };
        let removed = {
            let mut nodes = self.inner.nodes.borrow_mut();
            let before = nodes.len();
            nodes.retain(|e| !e.matches(&selector));
            before - nodes.len()
        };
        if removed > 0 {
            self.mutated();
        }
        removed
    }

    pub fn elements(&self) -> Vec<MemoryElement> {
        self.inner.nodes.borrow().clone()
    }

    pub fn style(&self, id: &str) -> Option<String> {
        self.inner.styles.borrow().get(id).cloned()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Moves the virtual clock forward, running every timer that falls due.
    pub fn advance_time(&self, delta: Duration) {
        let target = self.inner.now.get() + delta;
        loop {
            let next = {
                let mut timers = self.inner.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.seq))
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            let Some(timer) = next else { break };
            self.inner.now.set(timer.due);
            (timer.callback)();
        }
        self.inner.now.set(target);
    }

    fn mutated(&self) {
        self.inner.mutations.send_modify(|n| *n += 1);
    }
}

impl Document for MemoryDocument {
    type Element = MemoryElement;

    fn query_selector(&self, selector: &str) -> Option<MemoryElement> {
        let selector = Selector::parse(selector)?;
        self.inner
            .nodes
            .borrow()
            .iter()
            .find(|e| e.matches(&selector))
            .cloned()
    }

    fn subscribe_mutations(&self) -> Mutations {
        self.inner.mutations.subscribe()
    }

    fn inject_style(&self, id: &str, css: &str) -> bool {
        let mut styles = self.inner.styles.borrow_mut();
        if styles.contains_key(id) {
            return false;
        }
        styles.insert(id.to_string(), css.to_string());
        true
    }

    fn append_element(&self, tag: &str, attrs: &[(&str, &str)], text: &str) -> MemoryElement {
        let spec = attrs
            .iter()
            .fold(ElementSpec::new(tag).value(text), |spec, (k, v)| spec.attr(k, v));
        self.append(spec)
    }

    fn remove_element(&self, element: &MemoryElement) -> bool {
        let removed = {
            let mut nodes = self.inner.nodes.borrow_mut();
            let before = nodes.len();
            nodes.retain(|e| !e.same_node(element));
            before != nodes.len()
        };
        if removed {
            self.mutated();
        }
        removed
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        self.inner.timers.borrow_mut().push(Timer {
            due: self.inner.now.get() + delay,
            seq,
            callback,
        });
    }
}
