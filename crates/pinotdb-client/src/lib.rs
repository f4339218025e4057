pub mod config;
pub mod connection;
pub mod cursor;
pub mod transport;

pub use config::{ClientConfig, ConnectOptions};
pub use connection::{connect, Connection};
pub use cursor::{Cursor, Rows, UNKNOWN_ROWCOUNT};
pub use pinotdb_core::{ColumnDescriptor, ColumnType, PinotError, Result, Row, Value};
pub use pinotdb_sql::params;
pub use pinotdb_sql::{Param, Params};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportFuture};

#[cfg(test)]
mod tests;
