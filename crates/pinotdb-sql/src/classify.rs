use pinotdb_core::{PinotError, Result};
use pinotdb_protocol::{AggregationResult, BrokerResponse, SelectionResults};

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Aggregation(Vec<AggregationResult>),
    Selection(SelectionResults),
    /// A valid response without any result section: zero rows.
    Empty,
}

/// Validate a broker response and decide which result shape it carries.
///
/// Checks run in a fixed order and stop at the first failure: partial
/// server coverage, HTTP status, server-reported exceptions.
pub fn classify(response: &BrokerResponse, status: u16, query: &str) -> Result<ResponseShape> {
    let queried = response.num_servers_queried();
    let responded = response.num_servers_responded();
    if queried == -1 || responded == -1 || queried > responded {
        return Err(PinotError::Server(format!(
            "query\n\n{query}\n\ntimed out: only {responded} of {queried} servers responded"
        )));
    }

    if status != 200 {
        return Err(PinotError::Server(format!(
            "query\n\n{query}\n\nreturned an error: {status}\nFull response is {}",
            response.to_pretty_string()
        )));
    }

    let exceptions = response.exceptions();
    if !exceptions.is_empty() {
        let message = exceptions
            .iter()
            .map(|e| serde_json::to_string_pretty(e).unwrap_or_else(|_| e.to_string()))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(PinotError::Server(message));
    }

    if response.has_aggregation_results() {
        let metrics = response
            .aggregation_results()
            .map_err(|e| PinotError::Schema(format!("malformed aggregationResults: {e}")))?;
        return Ok(ResponseShape::Aggregation(metrics));
    }
    if response.has_selection_results() {
        let selection = response
            .selection_results()
            .map_err(|e| PinotError::Schema(format!("malformed selectionResults: {e}")))?;
        if let Some(selection) = selection {
            return Ok(ResponseShape::Selection(selection));
        }
    }
    Ok(ResponseShape::Empty)
}
