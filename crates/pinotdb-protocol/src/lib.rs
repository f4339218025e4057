pub mod backend;
pub mod frontend;
pub mod messages;

pub use backend::decode_response;
pub use frontend::encode_query;
pub use messages::{AggregationResult, BrokerResponse, GroupByResult, QueryRequest, SelectionResults};
