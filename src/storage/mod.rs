pub mod envelope;
pub mod file;
pub mod medium;
pub mod memory;
pub mod record_store;
pub mod registry;

pub use envelope::{DEFAULT_SCHEMA_VERSION, DraftEnvelope};
pub use file::FileMedium;
pub use medium::StorageMedium;
pub use memory::MemoryMedium;
pub use record_store::{KeyedRecordStore, WriterLease};
pub use registry::{DraftRegistry, select_medium};
