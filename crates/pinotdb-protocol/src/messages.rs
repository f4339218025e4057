use pinotdb_core::Value as Cell;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Body of a `POST /query` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub pql: String,
}

/// A decoded broker response.
///
/// Only the bookkeeping fields are read eagerly; the result sections are
/// decoded on demand so that status and exception checks run before any
/// shape errors in the result payload can surface.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerResponse {
    body: Map<String, Value>,
}

impl BrokerResponse {
    pub fn from_map(body: Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| format!("{:?}", self.body))
    }

    /// `-1` when the broker did not report the count.
    pub fn num_servers_queried(&self) -> i64 {
        self.count("numServersQueried")
    }

    /// `-1` when the broker did not report the count.
    pub fn num_servers_responded(&self) -> i64 {
        self.count("numServersResponded")
    }

    pub fn exceptions(&self) -> &[Value] {
        match self.body.get("exceptions") {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn has_aggregation_results(&self) -> bool {
        self.body.contains_key("aggregationResults")
    }

    pub fn has_selection_results(&self) -> bool {
        self.body.contains_key("selectionResults")
    }

    pub fn aggregation_results(&self) -> serde_json::Result<Vec<AggregationResult>> {
        match self.body.get("aggregationResults") {
            Some(value) => Vec::<AggregationResult>::deserialize(value),
            None => Ok(Vec::new()),
        }
    }

    pub fn selection_results(&self) -> serde_json::Result<Option<SelectionResults>> {
        match self.body.get("selectionResults") {
            Some(value) => SelectionResults::deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn count(&self, key: &str) -> i64 {
        self.body.get(key).and_then(Value::as_i64).unwrap_or(-1)
    }
}

/// One metric of an aggregation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub group_by_columns: Option<Vec<String>>,
    #[serde(default)]
    pub group_by_result: Option<Vec<GroupByResult>>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl AggregationResult {
    pub fn group_by_columns(&self) -> &[String] {
        self.group_by_columns.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupByResult {
    #[serde(deserialize_with = "group_values")]
    pub group: Vec<Cell>,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionResults {
    pub columns: Vec<String>,
    #[serde(default)]
    pub results: Vec<Vec<Value>>,
}

// Group values keep their scalar type; containers are rejected.
fn group_values<'de, D>(deserializer: D) -> Result<Vec<Cell>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .map(|value| Cell::from_json(value).map_err(de::Error::custom))
        .collect()
}
