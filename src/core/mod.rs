pub mod compare;
pub mod error;
pub mod value;

pub use compare::{deep_equal, is_empty_value, maps_equal};
pub use error::{DraftError, Result};
pub use value::{Draft, FieldMap, FieldValue};
