pub mod error;
pub mod report;
pub mod types;
pub mod value;

pub use error::{ModelError, Result};
pub use report::MalformedModelReport;
pub use types::{Cardinality, IdentityType, ValueType};
pub use value::Value;
