//! Keeps one Draft in step with one live record.
//!
//! Lifecycle of a controller (one per record mount):
//!
//! ```text
//! Idle --activate--> Restoring (draft non-empty, enabled, loaded) --> Watching --deactivate--> Inactive
//!        |                                                              ^
//!        +------------------(nothing to restore)------------------------+
//! ```
//!
//! `activate` is only accepted in `Idle`, and `Restoring` is only entered from
//! inside `activate`, so a controller restores at most once.

use super::Debouncer;
use crate::config::DraftConfig;
use crate::core::{DraftError, FieldMap, Result, maps_equal};
use crate::dialog::FormDialog;
use crate::record::{ChangeEvent, LiveRecord, SetValueOptions, Subscription, WatchCallback};
use crate::storage::{DraftRegistry, KeyedRecordStore, WriterLease};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Watching,
    Restoring,
    Inactive,
}

/// Result of [`DraftSyncController::activate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// No logical key; nothing is watched, restored or written
    Inert,
    /// Another activation currently owns the key
    Rejected { holder: Option<Uuid> },
    /// Watching; `restored` fields were pushed into the record
    Watching { restored: usize },
    /// `activate` was called outside `Idle`
    Ignored(SyncPhase),
}

pub struct DraftSyncController {
    id: Uuid,
    store: Option<Arc<KeyedRecordStore>>,
    dialog: FormDialog,
    debouncer: Option<Debouncer>,
    restore_requires_open_dialog: bool,
    phase: SyncPhase,
    subscription: Option<Subscription>,
    lease: Option<WriterLease>,
}

impl DraftSyncController {
    pub fn new(registry: &DraftRegistry, config: &DraftConfig, dialog: FormDialog) -> Result<Self> {
        config.validate().map_err(DraftError::InvalidConfig)?;
        let store = config.key().and_then(|key| registry.store(key));
        // Keyless forms never write, so they need no runtime.
        let debouncer = match store {
            Some(_) => Some(Debouncer::new(config.debounce_window)?),
            None => None,
        };

        Ok(Self {
            id: Uuid::new_v4(),
            store,
            dialog,
            debouncer,
            restore_requires_open_dialog: config.restore_requires_open_dialog,
            phase: SyncPhase::Idle,
            subscription: None,
            lease: None,
        })
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn activation_id(&self) -> Uuid {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.store.as_deref().map(KeyedRecordStore::key)
    }

    /// Fields with a write waiting for its debounce window
    pub fn pending_writes(&self) -> usize {
        self.debouncer.as_ref().map_or(0, Debouncer::pending)
    }

    /// Subscribes to `record` and restores the stored Draft into it once.
    pub fn activate<R: LiveRecord + ?Sized>(&mut self, record: &mut R) -> Activation {
        if self.phase != SyncPhase::Idle {
            return Activation::Ignored(self.phase);
        }

        let (Some(store), Some(debouncer)) = (self.store.clone(), self.debouncer.clone()) else {
            return Activation::Inert;
        };

        let Some(lease) = store.try_acquire_writer(self.id) else {
            let holder = store.writer();
            warn!(key = store.key(), activation = %self.id, holder = ?holder, "draft key already has a writer");
            self.phase = SyncPhase::Inactive;
            return Activation::Rejected { holder };
        };
        self.lease = Some(lease);

        // Restore runs before the watcher exists: partially restored states
        // may match the baseline and must not clear the stored Draft.
        let restored = if self.may_restore(&*record, &store) {
            self.phase = SyncPhase::Restoring;
            let draft = store.get();
            let restored = draft.len();
            for (name, value) in draft {
                record.set_field_value(&name, value, SetValueOptions::user_edit());
            }
            restored
        } else {
            0
        };

        self.phase = SyncPhase::Watching;
        let handler = change_handler(Arc::clone(&store), record.baseline(), debouncer);
        self.subscription = Some(record.watch(handler));

        info!(key = store.key(), activation = %self.id, restored, "draft controller watching");
        Activation::Watching { restored }
    }

    /// Unsubscribes and drops every pending write; returns how many writes were
    /// cancelled.
    pub fn deactivate(&mut self) -> usize {
        if self.phase == SyncPhase::Inactive {
            return 0;
        }

        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        let cancelled = self.debouncer.as_ref().map_or(0, Debouncer::close);
        self.lease = None;
        self.phase = SyncPhase::Inactive;

        debug!(key = ?self.key(), activation = %self.id, cancelled, "draft controller inactive");
        cancelled
    }

    fn may_restore<R: LiveRecord + ?Sized>(&self, record: &R, store: &KeyedRecordStore) -> bool {
        if store.is_empty() {
            return false;
        }
        if self.dialog.is_disabled() {
            debug!(key = store.key(), "restore skipped: form is disabled");
            return false;
        }
        if record.is_loading() {
            debug!(key = store.key(), "restore skipped: record still loading");
            return false;
        }
        if self.restore_requires_open_dialog && !self.dialog.is_open() {
            debug!(key = store.key(), "restore skipped: dialog closed");
            return false;
        }
        true
    }
}

impl Drop for DraftSyncController {
    fn drop(&mut self) {
        self.deactivate();
    }
}

fn change_handler(store: Arc<KeyedRecordStore>, baseline: FieldMap, debouncer: Debouncer) -> WatchCallback {
    Box::new(move |event: &ChangeEvent| {
        if maps_equal(&event.snapshot, &baseline, true) {
            debouncer.cancel_all();
            store.clear();
            return;
        }

        let Some(field) = event.field.as_deref() else {
            return;
        };

        if store.field(field).as_ref() == Some(&event.value) {
            // Back to the stored value: a pending write would now be stale.
            debouncer.cancel(field);
            return;
        }

        let store = Arc::clone(&store);
        let name = field.to_string();
        let value = event.value.clone();
        debouncer.schedule(field, move || store.set_field(&name, value));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::field_map;
    use crate::record::FormRecord;
    use serde_json::json;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_millis(250);

    fn profile() -> FormRecord {
        FormRecord::new(field_map(json!({"name": "", "email": ""})))
    }

    fn controller(registry: &DraftRegistry, key: &str, dialog: &FormDialog) -> DraftSyncController {
        let config = DraftConfig::new().form_name(key);
        DraftSyncController::new(registry, &config, dialog.clone()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_is_written_after_window() {
        let registry = DraftRegistry::in_memory();
        let dialog = FormDialog::new();
        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &dialog);

        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 0 });
        record.input("name", json!("Ann"));
        assert_eq!(sync.pending_writes(), 1);

        let store = registry.store("profile-form").unwrap();
        assert!(store.is_empty());

        tokio::time::sleep(SETTLE).await;
        assert_eq!(store.get(), field_map(json!({"name": "Ann"})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_happens_once() {
        let registry = DraftRegistry::in_memory();
        registry.store("profile-form").unwrap().set_field("name", json!("Bob"));
        let dialog = FormDialog::new();
        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &dialog);

        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 1 });
        assert_eq!(record.field_value("name"), Some(json!("Bob")));
        assert!(record.is_field_dirty("name"));
        assert!(record.is_field_touched("name"));

        record.input("name", json!("Bobby"));
        assert_eq!(
            sync.activate(&mut record),
            Activation::Ignored(SyncPhase::Watching)
        );
        assert_eq!(record.field_value("name"), Some(json!("Bobby")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_skipped_when_disabled_or_loading() {
        let registry = DraftRegistry::in_memory();
        registry.store("profile-form").unwrap().set_field("name", json!("Bob"));

        let frozen = FormDialog::new();
        frozen.set_disabled(true);
        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &frozen);
        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 0 });
        assert_eq!(record.field_value("name"), Some(json!("")));
        sync.deactivate();

        let mut loading = profile();
        loading.set_loading(true);
        let mut sync = controller(&registry, "profile-form", &FormDialog::new());
        assert_eq!(sync.activate(&mut loading), Activation::Watching { restored: 0 });
        assert_eq!(loading.field_value("name"), Some(json!("")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_waits_for_open_dialog_when_required() {
        let registry = DraftRegistry::in_memory();
        registry.store("profile-form").unwrap().set_field("name", json!("Bob"));
        let closed = FormDialog::with_open(false);

        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &closed);
        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 0 });
        sync.deactivate();

        let config = DraftConfig::new()
            .form_name("profile-form")
            .restore_requires_open_dialog(false);
        let mut sync = DraftSyncController::new(&registry, &config, closed).unwrap();
        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_clears_draft_and_pending_writes() {
        let registry = DraftRegistry::in_memory();
        let store = registry.store("profile-form").unwrap();
        store.set_field("email", json!("old@example.com"));

        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &FormDialog::with_open(false));
        sync.activate(&mut record);

        record.input("name", json!("A"));
        record.input("name", json!(""));
        assert_eq!(sync.pending_writes(), 0);
        assert!(store.is_empty());

        tokio::time::sleep(SETTLE).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_to_stored_value_cancels_stale_write() {
        let registry = DraftRegistry::in_memory();
        let store = registry.store("profile-form").unwrap();
        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &FormDialog::new());
        sync.activate(&mut record);

        record.input("name", json!("Ann"));
        tokio::time::sleep(SETTLE).await;

        record.input("name", json!("Ann1"));
        record.input("name", json!("Ann"));
        tokio::time::sleep(SETTLE).await;
        assert_eq!(store.field("name"), Some(json!("Ann")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_cancels_pending_and_unsubscribes() {
        let registry = DraftRegistry::in_memory();
        let store = registry.store("profile-form").unwrap();
        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &FormDialog::new());
        sync.activate(&mut record);

        record.input("name", json!("Ann"));
        assert_eq!(sync.deactivate(), 1);
        assert_eq!(sync.phase(), SyncPhase::Inactive);
        assert_eq!(record.watcher_count(), 0);

        record.input("email", json!("ann@example.com"));
        tokio::time::sleep(SETTLE).await;
        assert!(store.is_empty());
        assert_eq!(store.writer(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_key_is_inert() {
        let registry = DraftRegistry::in_memory();
        let mut record = profile();
        let mut sync = controller(&registry, "", &FormDialog::new());

        assert_eq!(sync.activate(&mut record), Activation::Inert);
        assert_eq!(sync.key(), None);
        assert_eq!(record.watcher_count(), 0);
        record.input("name", json!("Ann"));
        assert_eq!(sync.pending_writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_writer_is_rejected() {
        let registry = DraftRegistry::in_memory();
        let dialog = FormDialog::new();
        let mut first_record = profile();
        let mut second_record = profile();
        let mut first = controller(&registry, "profile-form", &dialog);
        let mut second = controller(&registry, "profile-form", &dialog);

        first.activate(&mut first_record);
        assert_eq!(
            second.activate(&mut second_record),
            Activation::Rejected { holder: Some(first.activation_id()) }
        );
        assert_eq!(second.phase(), SyncPhase::Inactive);
        assert_eq!(second_record.watcher_count(), 0);

        first.deactivate();
        let mut third = controller(&registry, "profile-form", &dialog);
        assert_eq!(third.activate(&mut second_record), Activation::Watching { restored: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_keeps_draft_with_default_valued_field() {
        let registry = DraftRegistry::in_memory();
        let store = registry.store("profile-form").unwrap();
        store.set_field("email", json!(""));
        store.set_field("name", json!("Ann"));

        let mut record = profile();
        let mut sync = controller(&registry, "profile-form", &FormDialog::new());
        assert_eq!(sync.activate(&mut record), Activation::Watching { restored: 2 });
        assert_eq!(record.field_value("name"), Some(json!("Ann")));
        assert_eq!(sync.pending_writes(), 0);
        assert_eq!(store.get(), field_map(json!({"email": "", "name": "Ann"})));

        sync.deactivate();
        tokio::time::sleep(SETTLE).await;
        assert_eq!(store.field("name"), Some(json!("Ann")));
    }

    #[test]
    fn test_keyless_controller_needs_no_runtime() {
        let mut record = profile();
        let mut sync = DraftSyncController::new(&DraftRegistry::in_memory(), &DraftConfig::new(), FormDialog::new())
            .unwrap();
        assert_eq!(sync.activate(&mut record), Activation::Inert);
        assert_eq!(sync.pending_writes(), 0);
        assert_eq!(sync.deactivate(), 0);
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let config = DraftConfig::new().debounce_window(Duration::ZERO);
        let result = DraftSyncController::new(&DraftRegistry::in_memory(), &config, FormDialog::new());
        assert!(matches!(result, Err(DraftError::InvalidConfig(_))));
    }
}
