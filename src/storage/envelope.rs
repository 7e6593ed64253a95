//! Persistence envelope wrapped around every stored Draft.
//!
//! Layout: `{"state":{"formData":{...}},"version":N,"savedAt":"..."}`.

use crate::core::{Draft, DraftError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written when none is configured
pub const DEFAULT_SCHEMA_VERSION: u32 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftEnvelope {
    pub state: DraftState,
    pub version: u32,
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftState {
    #[serde(rename = "formData", default)]
    pub form_data: Draft,
}

impl DraftEnvelope {
    pub fn new(form_data: Draft, version: u32) -> Self {
        Self {
            state: DraftState { form_data },
            version,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes `payload`, rejecting envelopes written under another schema
    /// version.
    pub fn decode(payload: &str, expected_version: u32) -> Result<Self> {
        let envelope: DraftEnvelope = serde_json::from_str(payload)?;
        if envelope.version != expected_version {
            return Err(DraftError::IncompatiblePayload(format!(
                "schema version {} (expected {})",
                envelope.version, expected_version
            )));
        }
        Ok(envelope)
    }

    pub fn into_draft(self) -> Draft {
        self.state.form_data
    }
}
