//! One persisted, attempt-limited form.
//!
//! `FormSession` is what a host wires to its view layer: it receives the four
//! lifecycle events (mount, field change, submit attempt, unmount) and exposes
//! the `is_disabled` / `field_value` signals the view renders from.

use crate::config::DraftConfig;
use crate::core::{Draft, FieldValue, Result};
use crate::dialog::FormDialog;
use crate::limiter::{AttemptLimiter, AttemptState};
use crate::record::{LiveRecord, ResetOptions};
use crate::storage::{DraftRegistry, KeyedRecordStore};
use crate::sync::{Activation, DraftSyncController};
use std::sync::Arc;

/// Result of [`FormSession::submit_attempted`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was busy or frozen; no attempt was counted
    Blocked,
    /// The attempt was counted
    Submitted { valid: bool, attempts: AttemptState },
}

pub struct FormSession<R: LiveRecord> {
    record: R,
    dialog: FormDialog,
    store: Option<Arc<KeyedRecordStore>>,
    sync: DraftSyncController,
    limiter: AttemptLimiter,
}

impl<R: LiveRecord> FormSession<R> {
    pub fn new(record: R, registry: &DraftRegistry, config: &DraftConfig, dialog: FormDialog) -> Result<Self> {
        let sync = DraftSyncController::new(registry, config, dialog.clone())?;
        let limiter = AttemptLimiter::new(config.max_attempts, dialog.clone());
        let store = config.key().and_then(|key| registry.store(key));

        Ok(Self {
            record,
            dialog,
            store,
            sync,
            limiter,
        })
    }

    /// Starts draft sync (restoring a stored Draft once) and applies the
    /// attempt policy to the record's current state.
    pub fn mount(&mut self) -> Activation {
        let activation = self.sync.activate(&mut self.record);
        self.limiter.observe(&mut self.record);
        activation
    }

    /// Stops draft sync; returns how many pending writes were dropped.
    pub fn unmount(&mut self) -> usize {
        self.sync.deactivate()
    }

    /// A user edit of one field.
    pub fn field_changed(&mut self, name: &str, value: FieldValue) {
        self.record.input(name, value);
        self.limiter.observe(&mut self.record);
    }

    /// A submission attempt; validation state is read from the record.
    pub fn submit_attempted(&mut self) -> SubmitOutcome {
        if self.submit_blocked() {
            return SubmitOutcome::Blocked;
        }

        let valid = self.record.submit();
        self.limiter.observe(&mut self.record);
        SubmitOutcome::Submitted {
            valid,
            attempts: self.limiter.state(),
        }
    }

    /// Resets the record to its baseline and drops the Draft.
    ///
    /// Returns false when the reset is not currently allowed.
    pub fn reset(&mut self, keep_submit_count: bool) -> bool {
        if self.reset_blocked() {
            return false;
        }

        self.record.reset(ResetOptions { keep_submit_count });
        if let Some(store) = &self.store {
            store.clear();
        }
        self.limiter.observe(&mut self.record);
        true
    }

    /// Re-applies the attempt policy after the host mutated the record
    /// directly.
    pub fn observe(&mut self) -> Vec<String> {
        self.limiter.observe(&mut self.record)
    }

    pub fn is_disabled(&self) -> bool {
        self.dialog.is_disabled()
    }

    pub fn field_value(&self, name: &str) -> Option<FieldValue> {
        self.record.field_value(name)
    }

    pub fn attempts(&self) -> AttemptState {
        self.limiter.state()
    }

    /// Stored Draft for this form; empty without a key
    pub fn draft(&self) -> Draft {
        self.store.as_ref().map(|store| store.get()).unwrap_or_default()
    }

    /// Submitting, loading or frozen
    pub fn submit_blocked(&self) -> bool {
        self.record.is_submitting() || self.record.is_loading() || self.dialog.is_disabled()
    }

    /// Clean, submitting, loading or frozen
    pub fn reset_blocked(&self) -> bool {
        !self.record.is_dirty() || self.submit_blocked()
    }

    pub fn record(&self) -> &R {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    pub fn dialog(&self) -> &FormDialog {
        &self.dialog
    }

    pub fn sync(&self) -> &DraftSyncController {
        &self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::field_map;
    use crate::record::FormRecord;
    use serde_json::json;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_millis(250);

    fn session(registry: &DraftRegistry, config: DraftConfig) -> FormSession<FormRecord> {
        let record = FormRecord::new(field_map(json!({"name": "", "email": ""})));
        FormSession::new(record, registry, &config, FormDialog::new()).unwrap()
    }

    #[test]
    fn test_keyless_session_works_without_runtime() {
        let registry = DraftRegistry::in_memory();
        let mut form = session(&registry, DraftConfig::new().max_attempts(3));
        assert_eq!(form.mount(), Activation::Inert);

        form.field_changed("name", json!("Ann"));
        for _ in 0..3 {
            form.submit_attempted();
        }
        assert!(form.is_disabled());
        assert_eq!(form.field_value("name"), Some(json!("")));
        assert!(form.draft().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_is_blocked_once_frozen() {
        let registry = DraftRegistry::in_memory();
        let mut form = session(&registry, DraftConfig::new().max_attempts(2));
        form.mount();

        form.record_mut().set_error("email", "required");
        assert!(matches!(
            form.submit_attempted(),
            SubmitOutcome::Submitted { valid: false, .. }
        ));
        assert!(matches!(
            form.submit_attempted(),
            SubmitOutcome::Submitted { attempts: AttemptState { frozen: true, .. }, .. }
        ));
        assert!(form.is_disabled());
        assert_eq!(form.submit_attempted(), SubmitOutcome::Blocked);
        assert_eq!(form.attempts().count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_draft() {
        let registry = DraftRegistry::in_memory();
        let mut form = session(&registry, DraftConfig::new().form_name("profile-form"));
        form.mount();
        assert!(form.reset_blocked());

        form.field_changed("name", json!("Ann"));
        tokio::time::sleep(SETTLE).await;
        assert_eq!(form.draft().len(), 1);
        assert!(!form.reset_blocked());

        assert!(form.reset(false));
        assert!(form.draft().is_empty());
        assert_eq!(form.field_value("name"), Some(json!("")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_record_blocks_actions() {
        let registry = DraftRegistry::in_memory();
        let mut form = session(&registry, DraftConfig::new());
        form.record_mut().set_loading(true);
        assert!(form.submit_blocked());
        assert_eq!(form.submit_attempted(), SubmitOutcome::Blocked);

        form.record_mut().set_loading(false);
        form.record_mut().set_submitting(true);
        assert!(form.submit_blocked());
    }
}
