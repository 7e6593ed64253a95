use super::StorageMedium;
use crate::core::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Session-scoped medium: payloads live as long as the medium instance.
///
/// Share one instance (behind an `Arc`) between registries to model a page
/// reload within the same session.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored payloads
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock()?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock()?;
        entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "session"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let medium = MemoryMedium::new();
        assert_eq!(medium.read("form").unwrap(), None);

        medium.write("form", "{}").unwrap();
        assert_eq!(medium.read("form").unwrap().as_deref(), Some("{}"));
        assert_eq!(medium.len(), 1);

        medium.remove("form").unwrap();
        medium.remove("form").unwrap();
        assert!(medium.is_empty());
    }
}
