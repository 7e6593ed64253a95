use crate::core::Result;

/// Storage medium trait - allows pluggable persistence backends
///
/// A medium stores opaque string payloads under string keys. Every operation
/// is synchronous from the caller's point of view; the medium itself may
/// buffer.
pub trait StorageMedium: Send + Sync {
    /// Read the payload stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write (replace) the payload stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the payload stored under `key`; no-op when absent
    fn remove(&self, key: &str) -> Result<()>;

    /// Short human-readable name for logs
    fn name(&self) -> &'static str;
}
