// ============================================================================
// formdraft Library
// ============================================================================

//! Form-draft persistence and submission attempt limiting.
//!
//! A live form record's in-progress values are mirrored into a per-key Draft
//! store with per-field debouncing, restored once when the form mounts, and
//! dropped as soon as the form is back to its defaults. Separately, an attempt
//! limiter freezes the form after too many submissions and reverts whatever is
//! still dirty or invalid.
//!
//! # Examples
//!
//! ```
//! use formdraft::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> formdraft::Result<()> {
//! let registry = DraftRegistry::in_memory();
//! let config = DraftConfig::new().form_name("profile-form").max_attempts(3);
//! let record = FormRecord::new(field_map(json!({"name": "", "email": ""})));
//!
//! let mut form = FormSession::new(record, &registry, &config, FormDialog::new())?;
//! form.mount();
//! form.field_changed("name", json!("Ann"));
//! form.unmount();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod dialog;
pub mod facade;
pub mod limiter;
pub mod prelude;
pub mod record;
pub mod storage;
pub mod sync;

// Re-export main types for convenience
pub use crate::config::{DEFAULT_DEBOUNCE_WINDOW, DraftConfig, StorageConfig};
pub use crate::core::{Draft, DraftError, FieldMap, FieldValue, Result, deep_equal};
pub use crate::dialog::FormDialog;
pub use crate::facade::{FormSession, SubmitOutcome};
pub use crate::limiter::{AttemptLimiter, AttemptState, Ceiling};
pub use crate::record::{ChangeEvent, FormRecord, LiveRecord, Subscription};
pub use crate::storage::{DraftRegistry, FileMedium, KeyedRecordStore, MemoryMedium, StorageMedium};
pub use crate::sync::{Activation, DraftSyncController, SyncPhase};
