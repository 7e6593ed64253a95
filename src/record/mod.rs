//! Live record contract.
//!
//! A live record owns the in-memory field values of one form. The draft
//! controller and the attempt limiter only talk to it through [`LiveRecord`].

pub mod form;

pub use form::FormRecord;

use crate::core::{FieldMap, FieldValue};

/// Callback invoked for every change the record emits
pub type WatchCallback = Box<dyn FnMut(&ChangeEvent) + Send>;

/// One emitted change
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Changed field; `None` for whole-record changes such as a reset
    pub field: Option<String>,
    /// New value of `field` (`Null` for whole-record changes)
    pub value: FieldValue,
    /// Full record snapshot after the change
    pub snapshot: FieldMap,
}

/// Options for [`LiveRecord::set_field_value`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetValueOptions {
    pub dirty: bool,
    pub touched: bool,
}

impl SetValueOptions {
    /// Marks the value as a user edit (dirty and touched)
    pub fn user_edit() -> Self {
        Self {
            dirty: true,
            touched: true,
        }
    }
}

/// Options for [`LiveRecord::reset_field`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetFieldOptions {
    pub keep_touched: bool,
}

/// Options for [`LiveRecord::reset`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    pub keep_submit_count: bool,
}

/// Handle returned by [`LiveRecord::watch`]; stops delivery when
/// unsubscribed or dropped.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// An editable record whose values the draft layer mirrors
pub trait LiveRecord {
    /// Subscribe to change events
    fn watch(&mut self, callback: WatchCallback) -> Subscription;

    /// Current values of every field
    fn snapshot(&self) -> FieldMap;

    /// Default values captured at initialization
    fn baseline(&self) -> FieldMap;

    /// Current value of one field
    fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.snapshot().get(name).cloned()
    }

    /// A user edit of one field; emits a change
    fn input(&mut self, name: &str, value: FieldValue) {
        self.set_field_value(name, value, SetValueOptions::user_edit());
    }

    /// Set a value, optionally marking it dirty/touched; emits a change
    fn set_field_value(&mut self, name: &str, value: FieldValue, options: SetValueOptions);

    /// Fields that are dirty or carry a validation error
    fn dirty_or_invalid_field_names(&self) -> Vec<String>;

    /// Revert one field to its committed value; emits a change
    fn reset_field(&mut self, name: &str, options: ResetFieldOptions);

    /// Revert every field to the baseline; emits a whole-record change
    fn reset(&mut self, options: ResetOptions);

    /// Register a submission attempt; returns whether the record is valid
    fn submit(&mut self) -> bool;

    fn submit_count(&self) -> u32;

    /// True until the record finished its own initial load
    fn is_loading(&self) -> bool;

    fn is_submitting(&self) -> bool {
        false
    }

    fn is_dirty(&self) -> bool;
}
