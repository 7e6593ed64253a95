pub mod controller;
pub mod debounce;

pub use controller::{Activation, DraftSyncController, SyncPhase};
pub use debounce::Debouncer;
