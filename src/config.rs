use crate::limiter::Ceiling;
use crate::storage::DEFAULT_SCHEMA_VERSION;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default delay between the last edit of a field and its write to storage
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Per-form configuration
///
/// Similar to the props a form wrapper receives: which Draft to bind to, how
/// long to wait before writing, and how many submissions to allow.
#[derive(Debug, Clone)]
pub struct DraftConfig {
    /// Logical key of the Draft; `None` or empty disables persistence
    pub form_name: Option<String>,

    /// Debounce window for field writes
    pub debounce_window: Duration,

    /// Submission attempt ceiling
    pub max_attempts: Ceiling,

    /// Skip restore unless the owning dialog is open
    pub restore_requires_open_dialog: bool,
}

impl DraftConfig {
    pub fn new() -> Self {
        Self {
            form_name: None,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            max_attempts: Ceiling::Unbounded,
            restore_requires_open_dialog: true,
        }
    }

    /// Set the logical key
    pub fn form_name(mut self, name: &str) -> Self {
        self.form_name = Some(name.to_string());
        self
    }

    /// Set the debounce window
    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the attempt ceiling
    pub fn max_attempts(mut self, ceiling: impl Into<Ceiling>) -> Self {
        self.max_attempts = ceiling.into();
        self
    }

    /// Whether restore waits for an open dialog
    pub fn restore_requires_open_dialog(mut self, required: bool) -> Self {
        self.restore_requires_open_dialog = required;
        self
    }

    /// The logical key, if persistence is enabled
    pub fn key(&self) -> Option<&str> {
        self.form_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_window.is_zero() {
            return Err("debounce_window must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage medium configuration consumed by [`crate::DraftRegistry::open`]
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Whether the session-scoped medium may be used
    pub session_enabled: bool,

    /// Directory of the durable fallback medium
    pub fallback_dir: Option<PathBuf>,

    /// Schema version written into every envelope
    pub schema_version: u32,
}

impl StorageConfig {
    pub fn new() -> Self {
        Self {
            session_enabled: true,
            fallback_dir: None,
            schema_version: DEFAULT_SCHEMA_VERSION,
        }
    }

    /// Session medium only
    pub fn session_only() -> Self {
        Self::new()
    }

    /// Enable or disable the session medium
    pub fn session_enabled(mut self, enabled: bool) -> Self {
        self.session_enabled = enabled;
        self
    }

    /// Use `dir` when the session medium is unavailable
    pub fn with_durable_fallback<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.fallback_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the envelope schema version
    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
