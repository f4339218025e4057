pub mod error;
pub mod types;

pub use error::{PinotError, Result};
pub use types::{ColumnDescriptor, ColumnType, ResultSet, Row, Value};
