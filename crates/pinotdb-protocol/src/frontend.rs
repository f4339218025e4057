use crate::messages::QueryRequest;
use pinotdb_core::{PinotError, Result};

pub const CONTENT_TYPE: &str = "application/json";

/// Render the JSON body sent to the broker for `pql`.
pub fn encode_query(pql: &str) -> Result<String> {
    let request = QueryRequest {
        pql: pql.to_string(),
    };
    serde_json::to_string(&request).map_err(|e| PinotError::Templating(e.to_string()))
}
