use crate::messages::BrokerResponse;
use pinotdb_core::{PinotError, Result};
use serde_json::Value;

/// Parse a broker response body. Anything that is not a JSON object is
/// reported with the raw text so the caller can see what came back.
pub fn decode_response(body: &str, query: &str, url: &str) -> Result<BrokerResponse> {
    let decode_err = || PinotError::TransportDecode {
        query: query.to_string(),
        url: url.to_string(),
        body: body.to_string(),
    };
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(BrokerResponse::from_map(map)),
        Ok(_) | Err(_) => Err(decode_err()),
    }
}
