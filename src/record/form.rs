//! In-process form record.
//!
//! Tracks values against defaults together with the dirty, touched and error
//! markers a form library keeps, and emits a [`ChangeEvent`] after every
//! mutation. Validation is not performed here; callers attach errors with
//! [`FormRecord::set_error`].

use super::{
    ChangeEvent, LiveRecord, ResetFieldOptions, ResetOptions, SetValueOptions, Subscription,
    WatchCallback,
};
use crate::core::{FieldMap, FieldValue, deep_equal};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

pub struct FormRecord {
    defaults: FieldMap,
    values: FieldMap,
    dirty: BTreeSet<String>,
    touched: BTreeSet<String>,
    errors: BTreeMap<String, String>,
    submit_count: u32,
    submitting: bool,
    loading: bool,
    watchers: Arc<Mutex<Watchers>>,
}

#[derive(Default)]
struct Watchers {
    next_id: u64,
    callbacks: Vec<(u64, WatchCallback)>,
}

impl FormRecord {
    pub fn new(defaults: FieldMap) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
            dirty: BTreeSet::new(),
            touched: BTreeSet::new(),
            errors: BTreeMap::new(),
            submit_count: 0,
            submitting: false,
            loading: false,
            watchers: Arc::new(Mutex::new(Watchers::default())),
        }
    }

    pub fn set_error(&mut self, name: &str, message: &str) {
        self.errors.insert(name.to_string(), message.to_string());
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn is_field_dirty(&self, name: &str) -> bool {
        self.dirty.contains(name)
    }

    pub fn is_field_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Number of live watch subscriptions
    pub fn watcher_count(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }

    fn default_of(&self, name: &str) -> FieldValue {
        self.defaults.get(name).cloned().unwrap_or(Value::Null)
    }

    fn emit(&self, field: Option<&str>) {
        let event = ChangeEvent {
            field: field.map(str::to_string),
            value: field
                .and_then(|name| self.values.get(name).cloned())
                .unwrap_or(Value::Null),
            snapshot: self.values.clone(),
        };

        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, callback) in watchers.callbacks.iter_mut() {
            callback(&event);
        }
    }
}

impl LiveRecord for FormRecord {
    fn watch(&mut self, callback: WatchCallback) -> Subscription {
        let id = {
            let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
            let id = watchers.next_id;
            watchers.next_id += 1;
            watchers.callbacks.push((id, callback));
            id
        };

        let registry = Arc::downgrade(&self.watchers);
        Subscription::new(move || {
            if let Some(watchers) = registry.upgrade() {
                let mut watchers = watchers.lock().unwrap_or_else(PoisonError::into_inner);
                watchers.callbacks.retain(|(existing, _)| *existing != id);
            }
        })
    }

    fn snapshot(&self) -> FieldMap {
        self.values.clone()
    }

    fn baseline(&self) -> FieldMap {
        self.defaults.clone()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.values.get(name).cloned()
    }

    /// A user typing into a field: touched, and dirty while it differs from
    /// its default.
    fn input(&mut self, name: &str, value: FieldValue) {
        let differs = !deep_equal(&value, &self.default_of(name), false);
        if differs {
            self.dirty.insert(name.to_string());
        } else {
            self.dirty.remove(name);
        }
        self.touched.insert(name.to_string());
        self.values.insert(name.to_string(), value);
        self.emit(Some(name));
    }

    fn set_field_value(&mut self, name: &str, value: FieldValue, options: SetValueOptions) {
        if options.dirty {
            self.dirty.insert(name.to_string());
        }
        if options.touched {
            self.touched.insert(name.to_string());
        }
        self.values.insert(name.to_string(), value);
        self.emit(Some(name));
    }

    fn dirty_or_invalid_field_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.dirty.iter().chain(self.errors.keys()).collect();
        names.into_iter().cloned().collect()
    }

    fn reset_field(&mut self, name: &str, options: ResetFieldOptions) {
        match self.defaults.get(name) {
            Some(default) => {
                self.values.insert(name.to_string(), default.clone());
            }
            None => {
                self.values.remove(name);
            }
        }
        self.dirty.remove(name);
        self.errors.remove(name);
        if !options.keep_touched {
            self.touched.remove(name);
        }
        self.emit(Some(name));
    }

    fn reset(&mut self, options: ResetOptions) {
        self.values = self.defaults.clone();
        self.dirty.clear();
        self.touched.clear();
        self.errors.clear();
        if !options.keep_submit_count {
            self.submit_count = 0;
        }
        self.emit(None);
    }

    fn submit(&mut self) -> bool {
        self.submit_count += 1;
        self.errors.is_empty()
    }

    fn submit_count(&self) -> u32 {
        self.submit_count
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn is_submitting(&self) -> bool {
        self.submitting
    }

    fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}
