use super::envelope::DEFAULT_SCHEMA_VERSION;
use super::{FileMedium, KeyedRecordStore, MemoryMedium, StorageMedium};
use crate::config::StorageConfig;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const PROBE_KEY: &str = "__formdraft_probe__";

/// Registry of Draft stores keyed by logical key
///
/// Every consumer asking for the same key receives the same
/// [`KeyedRecordStore`], so two views of one form share a single Draft.
/// Construct one registry per process (or per test) and pass it by reference.
pub struct DraftRegistry {
    medium: Arc<dyn StorageMedium>,
    schema_version: u32,
    stores: Mutex<HashMap<String, Arc<KeyedRecordStore>>>,
}

impl DraftRegistry {
    /// Registry over an explicit medium, using the default schema version
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self::with_schema_version(medium, DEFAULT_SCHEMA_VERSION)
    }

    pub fn with_schema_version(medium: Arc<dyn StorageMedium>, schema_version: u32) -> Self {
        Self {
            medium,
            schema_version,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Registry over an in-memory session medium
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryMedium::new()))
    }

    /// Builds the media described by `config` and selects one of them.
    pub fn open(config: &StorageConfig) -> Self {
        let primary: Option<Arc<dyn StorageMedium>> = if config.session_enabled {
            Some(Arc::new(MemoryMedium::new()))
        } else {
            None
        };

        let fallback: Option<Arc<dyn StorageMedium>> =
            config.fallback_dir.as_ref().and_then(|dir| match FileMedium::new(dir) {
                Ok(medium) => Some(Arc::new(medium) as Arc<dyn StorageMedium>),
                Err(e) => {
                    warn!("Durable draft medium at {} unavailable: {}", dir.display(), e);
                    None
                }
            });

        Self::with_schema_version(select_medium(primary, fallback), config.schema_version)
    }

    /// Store for `key`, or `None` for an empty key (no persistence).
    pub fn store(&self, key: &str) -> Option<Arc<KeyedRecordStore>> {
        if key.is_empty() {
            return None;
        }

        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let store = stores.entry(key.to_string()).or_insert_with(|| {
            Arc::new(KeyedRecordStore::open(
                key,
                Arc::clone(&self.medium),
                self.schema_version,
            ))
        });
        Some(Arc::clone(store))
    }

    /// Keys opened so far
    pub fn keys(&self) -> Vec<String> {
        let stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = stores.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn medium_name(&self) -> &'static str {
        self.medium.name()
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

/// Picks the first medium that accepts a probe write, falling back to a
/// process-local memory medium when neither does.
pub fn select_medium(
    primary: Option<Arc<dyn StorageMedium>>,
    fallback: Option<Arc<dyn StorageMedium>>,
) -> Arc<dyn StorageMedium> {
    for medium in [primary, fallback].into_iter().flatten() {
        if probe(medium.as_ref()) {
            info!("Using '{}' medium for drafts", medium.name());
            return medium;
        }
        warn!("Draft medium '{}' rejected probe write, trying next", medium.name());
    }

    warn!("No draft medium available, drafts will not outlive this process");
    Arc::new(MemoryMedium::new())
}

fn probe(medium: &dyn StorageMedium) -> bool {
    medium.write(PROBE_KEY, "{}").is_ok() && medium.remove(PROBE_KEY).is_ok()
}
