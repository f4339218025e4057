use crate::result::Table;
use indexmap::IndexMap;
use pinotdb_core::{PinotError, Result, Value};
use pinotdb_protocol::AggregationResult;
use std::collections::HashSet;

/// Key of the single row produced by a global (non grouped) aggregation.
const TOTAL_KEY: Vec<Value> = Vec::new();

/// Merge per-metric aggregation results into one row per group-by key.
///
/// Each output row holds the group-by values followed by one slot per
/// metric, in metric order. Rows keep the order in which their key was
/// first seen. Slots a metric never filled stay `Null`.
pub fn normalize_aggregation(metrics: &[AggregationResult]) -> Result<Table> {
    let group_by = group_by_columns(metrics)?;
    let metric_names = metrics
        .iter()
        .enumerate()
        .map(|(idx, metric)| {
            metric.function.clone().ok_or_else(|| {
                PinotError::Schema(format!("aggregation result {idx} has no function name"))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let num_metrics = metric_names.len();

    let mut groups: IndexMap<Vec<Value>, Vec<Value>> = IndexMap::new();
    for (idx, metric) in metrics.iter().enumerate() {
        match &metric.group_by_result {
            Some(results) => {
                if groups.contains_key(&TOTAL_KEY) {
                    return Err(mixed_results(metrics));
                }
                for result in results {
                    let key = group_key(&result.group, group_by.len(), metric)?;
                    let value = Value::from_json(result.value.clone())?;
                    groups
                        .entry(key)
                        .or_insert_with(|| vec![Value::Null; num_metrics])[idx] = value;
                }
            }
            None => {
                let value = Value::from_json(metric.value.clone().unwrap_or_default())?;
                groups
                    .entry(TOTAL_KEY)
                    .or_insert_with(|| vec![Value::Null; num_metrics])[idx] = value;
                if groups.len() != 1 {
                    return Err(mixed_results(metrics));
                }
                if !group_by.is_empty() {
                    return Err(PinotError::Schema(format!(
                        "total aggregation result for {} present with group by columns {group_by:?}",
                        metric_names[idx]
                    )));
                }
            }
        }
    }

    let mut columns = group_by.clone();
    columns.extend(metric_names.iter().cloned());
    let expected = columns.len();
    if !groups.is_empty() {
        let distinct: HashSet<&str> = columns.iter().map(String::as_str).collect();
        if distinct.len() != expected {
            return Err(PinotError::Schema(format!(
                "expected {expected} columns in the row but name collisions left only {}: {columns:?}",
                distinct.len()
            )));
        }
    }

    let mut rows = Vec::with_capacity(groups.len());
    for (key, slots) in groups {
        if key.len() != group_by.len() {
            return Err(PinotError::Schema(format!(
                "expected {} group values but got {} for a row",
                group_by.len(),
                key.len()
            )));
        }
        let mut row = key;
        row.extend(slots);
        rows.push(row);
    }
    Ok(Table { columns, rows })
}

/// Group-by columns shared by every metric of the response.
fn group_by_columns(metrics: &[AggregationResult]) -> Result<Vec<String>> {
    let declared = metrics
        .iter()
        .map(AggregationResult::group_by_columns)
        .find(|cols| !cols.is_empty())
        .unwrap_or(&[]);
    for metric in metrics {
        if metric.group_by_columns() != declared {
            return Err(PinotError::Schema(format!(
                "columns for metric {}: {:?} differ from other columns {declared:?}",
                metric.function.as_deref().unwrap_or("noname"),
                metric.group_by_columns()
            )));
        }
    }
    Ok(declared.to_vec())
}

/// Turn the group values of one result into a row key of `arity` values.
///
/// Compatibility shim: the broker does not escape group values, so a value
/// containing its separator arrives split into several leading fragments.
/// Surplus leading fragments are glued back onto the first kept value,
/// which then becomes text.
fn group_key(group: &[Value], arity: usize, metric: &AggregationResult) -> Result<Vec<Value>> {
    if group.len() < arity {
        return Err(PinotError::Schema(format!(
            "expected {metric:?} to contain {arity} group values, but got {}",
            group.len()
        )));
    }
    if group.len() == arity {
        return Ok(group.to_vec());
    }
    if arity == 0 {
        return Err(PinotError::Schema(format!(
            "expected {metric:?} to contain no group values, but got {}",
            group.len()
        )));
    }
    let extra = group.len() - arity;
    let mut key = group[extra..].to_vec();
    key[0] = Value::Text(group[..=extra].iter().map(fragment_text).collect());
    Ok(key)
}

fn fragment_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn mixed_results(metrics: &[AggregationResult]) -> PinotError {
    PinotError::Schema(format!(
        "invalid response {metrics:?} since we have both total and group by results"
    ))
}
