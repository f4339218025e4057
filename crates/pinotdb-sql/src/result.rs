use crate::aggregation::normalize_aggregation;
use crate::classify::{classify, ResponseShape};
use crate::schema::infer_description;
use pinotdb_core::{PinotError, Result, ResultSet, Row, Value};
use pinotdb_protocol::{BrokerResponse, SelectionResults};
use std::sync::Arc;
use tracing::debug;

/// Column names plus positional row values, before rows are materialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Turn one broker round-trip into a typed result set.
pub fn decode_result(response: &BrokerResponse, status: u16, query: &str) -> Result<ResultSet> {
    let table = match classify(response, status, query)? {
        ResponseShape::Aggregation(metrics) => normalize_aggregation(&metrics)?,
        ResponseShape::Selection(selection) => selection_table(selection)?,
        ResponseShape::Empty => Table::default(),
    };
    debug!(rows = table.rows.len(), columns = table.columns.len(), "decoded broker response");
    materialize(table)
}

/// Build rows and their description. An empty table has no description.
pub fn materialize(table: Table) -> Result<ResultSet> {
    if table.rows.is_empty() {
        return Ok(ResultSet::default());
    }
    let description = infer_description(&table.columns, &table.rows)?;
    let columns: Arc<[String]> = table.columns.into();
    let rows = table
        .rows
        .into_iter()
        .map(|values| Row::new(columns.clone(), values))
        .collect();
    Ok(ResultSet {
        description: Some(description),
        rows,
    })
}

/// Zip declared column names against each result row.
///
/// Repeated column names collapse onto their first position and keep the
/// last value, as a name-keyed row would. Values beyond the declared columns
/// are dropped; a row with too few values is an error.
fn selection_table(selection: SelectionResults) -> Result<Table> {
    let mut columns: Vec<String> = Vec::with_capacity(selection.columns.len());
    let mut slot_of = Vec::with_capacity(selection.columns.len());
    for name in &selection.columns {
        match columns.iter().position(|c| c == name) {
            Some(slot) => slot_of.push(slot),
            None => {
                slot_of.push(columns.len());
                columns.push(name.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(selection.results.len());
    for (idx, result) in selection.results.into_iter().enumerate() {
        if result.len() < selection.columns.len() {
            return Err(PinotError::Schema(format!(
                "selection row {idx} has {} values for {} columns",
                result.len(),
                selection.columns.len()
            )));
        }
        let mut row = vec![Value::Null; columns.len()];
        for (value, &slot) in result.into_iter().zip(&slot_of) {
            row[slot] = Value::from_json(value)?;
        }
        rows.push(row);
    }
    Ok(Table { columns, rows })
}
