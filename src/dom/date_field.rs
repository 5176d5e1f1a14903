use crate::calc::leave_date;
use crate::dom::{fill_value, notify_changed, settle, DatePicker, DomError, Element, EventType, Listener};
use chrono::NaiveDate;
use std::rc::Rc;

/// A date input, read and written either through the page's date picker or
/// as plain text.
pub trait DateField {
    fn read(&self) -> Option<NaiveDate>;
    fn write(&self, date: NaiveDate) -> Result<(), DomError>;
    fn on_change(&self, listener: Listener);
    fn uses_picker(&self) -> bool;
}

pub struct PickerDateField<E> {
    element: E,
    picker: Rc<dyn DatePicker>,
}

impl<E: Element> DateField for PickerDateField<E> {
    fn read(&self) -> Option<NaiveDate> {
        self.picker.get_date()
    }

    fn write(&self, date: NaiveDate) -> Result<(), DomError> {
        self.picker.set_date(date);
        notify_changed(&self.element)?;
        settle(&self.element)
    }

    fn on_change(&self, listener: Listener) {
        self.element.add_listener(EventType::Change, listener);
    }

    fn uses_picker(&self) -> bool {
        true
    }
}

pub struct TextDateField<E> {
    element: E,
}

impl<E: Element> DateField for TextDateField<E> {
    fn read(&self) -> Option<NaiveDate> {
        leave_date::parse(self.element.value().trim())
    }

    fn write(&self, date: NaiveDate) -> Result<(), DomError> {
        fill_value(&self.element, &leave_date::format(date))
    }

    fn on_change(&self, listener: Listener) {
        self.element.add_listener(EventType::Change, listener);
    }

    fn uses_picker(&self) -> bool {
        false
    }
}

/// Probes the element once and picks the matching implementation.
pub fn bind_date_field<E: Element>(element: E) -> Rc<dyn DateField> {
    match element.date_picker() {
        Some(picker) => Rc::new(PickerDateField { element, picker }),
        None => Rc::new(TextDateField { element }),
    }
}
