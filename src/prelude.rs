//! Everything a host needs to wire a persisted form.

pub use crate::config::{DraftConfig, StorageConfig};
pub use crate::core::value::field_map;
pub use crate::core::{Draft, FieldMap, FieldValue};
pub use crate::dialog::FormDialog;
pub use crate::facade::{FormSession, SubmitOutcome};
pub use crate::limiter::{AttemptState, Ceiling};
pub use crate::record::{
    ChangeEvent, FormRecord, LiveRecord, ResetFieldOptions, ResetOptions, SetValueOptions,
    Subscription,
};
pub use crate::storage::DraftRegistry;
pub use crate::sync::Activation;
