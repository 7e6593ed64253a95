//! Per-key persisted Draft store.
//!
//! A `KeyedRecordStore` is the single in-process source of truth for one
//! logical key. It mirrors every mutation into its storage medium and, when the
//! medium fails, keeps serving from memory for the rest of the process.

use super::StorageMedium;
use super::envelope::DraftEnvelope;
use crate::core::{Draft, FieldValue};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

pub struct KeyedRecordStore {
    key: String,
    medium: Arc<dyn StorageMedium>,
    schema_version: u32,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    draft: Draft,
    degraded: bool,
    writer: Option<Uuid>,
    last_saved: Option<DateTime<Utc>>,
}

impl KeyedRecordStore {
    /// Opens the store for `key`, hydrating it from `medium`.
    ///
    /// Unreadable or incompatible payloads hydrate as an empty Draft and are
    /// left in place until the next write replaces them.
    pub(crate) fn open(key: &str, medium: Arc<dyn StorageMedium>, schema_version: u32) -> Self {
        let mut state = StoreState::default();

        match medium.read(key) {
            Ok(Some(payload)) => match DraftEnvelope::decode(&payload, schema_version) {
                Ok(envelope) => {
                    state.last_saved = envelope.saved_at;
                    state.draft = envelope.into_draft();
                    debug!("Hydrated draft '{}' with {} field(s)", key, state.draft.len());
                }
                Err(e) => warn!("Ignoring unreadable draft '{}': {}", key, e),
            },
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Storage medium '{}' unavailable for draft '{}', keeping it in memory: {}",
                    medium.name(),
                    key,
                    e
                );
                state.degraded = true;
            }
        }

        Self {
            key: key.to_string(),
            medium,
            schema_version,
            state: Mutex::new(state),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the persisted mapping; empty when nothing is stored.
    pub fn get(&self) -> Draft {
        self.lock_state().draft.clone()
    }

    /// Last persisted value of one field
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.lock_state().draft.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_state().draft.is_empty()
    }

    /// Upserts one field.
    pub fn set_field(&self, name: &str, value: FieldValue) {
        let mut state = self.lock_state();
        state.draft.insert(name.to_string(), value);
        self.persist(&mut state);
    }

    /// Deletes one field entry; no-op when absent.
    pub fn remove_field(&self, name: &str) {
        let mut state = self.lock_state();
        if state.draft.remove(name).is_some() {
            self.persist(&mut state);
        }
    }

    /// Deletes the entire Draft.
    pub fn clear(&self) {
        let mut state = self.lock_state();
        state.draft.clear();
        state.last_saved = None;

        if state.degraded {
            return;
        }
        match self.medium.remove(&self.key) {
            Ok(()) => debug!("Cleared draft '{}'", self.key),
            Err(e) => self.degrade(&mut state, e),
        }
    }

    /// True once the medium failed and the store went memory-only
    pub fn is_degraded(&self) -> bool {
        self.lock_state().degraded
    }

    /// When the Draft was last written to the medium
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_saved
    }

    /// Activation currently holding the writer lease
    pub fn writer(&self) -> Option<Uuid> {
        self.lock_state().writer
    }

    /// Claims exclusive write access for one activation.
    ///
    /// Returns `None` while another activation holds the lease.
    pub fn try_acquire_writer(self: &Arc<Self>, activation: Uuid) -> Option<WriterLease> {
        let mut state = self.lock_state();
        match state.writer {
            Some(holder) if holder != activation => None,
            _ => {
                state.writer = Some(activation);
                Some(WriterLease {
                    store: Arc::clone(self),
                    activation,
                })
            }
        }
    }

    fn persist(&self, state: &mut StoreState) {
        if state.degraded {
            return;
        }

        let envelope = DraftEnvelope::new(state.draft.clone(), self.schema_version);
        let result = envelope
            .encode()
            .and_then(|payload| self.medium.write(&self.key, &payload));

        match result {
            Ok(()) => {
                state.last_saved = envelope.saved_at;
                debug!("Saved draft '{}' ({} field(s))", self.key, state.draft.len());
            }
            Err(e) => self.degrade(state, e),
        }
    }

    fn degrade(&self, state: &mut StoreState, err: crate::core::DraftError) {
        warn!(
            "Storage medium '{}' failed for draft '{}', keeping it in memory: {}",
            self.medium.name(),
            self.key,
            err
        );
        state.degraded = true;
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive write access to a store for one activation; released on drop.
pub struct WriterLease {
    store: Arc<KeyedRecordStore>,
    activation: Uuid,
}

impl Drop for WriterLease {
    fn drop(&mut self) {
        let mut state = self.store.lock_state();
        if state.writer == Some(self.activation) {
            state.writer = None;
        }
    }
}
