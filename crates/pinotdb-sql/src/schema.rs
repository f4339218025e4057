use pinotdb_core::{ColumnDescriptor, ColumnType, PinotError, Result, Value};

/// Derive one descriptor per column by scanning rows in order.
///
/// A column's type is fixed by its first non-null value; a later non-null
/// value of a different type is an error, so every row is checked even once
/// all columns are resolved. Columns that only ever held nulls keep
/// [`ColumnType::Null`].
pub fn infer_description(columns: &[String], rows: &[Vec<Value>]) -> Result<Vec<ColumnDescriptor>> {
    let mut types = vec![ColumnType::Null; columns.len()];
    for row in rows {
        for (idx, value) in row.iter().enumerate().take(columns.len()) {
            if value.is_null() {
                continue;
            }
            let observed = value.column_type();
            let current = types[idx];
            if current == ColumnType::Null {
                types[idx] = observed;
            } else if current != observed {
                return Err(PinotError::Schema(format!(
                    "differing column type found for column {}: {current} vs {observed}",
                    columns[idx]
                )));
            }
        }
    }
    Ok(columns
        .iter()
        .zip(types)
        .map(|(name, type_code)| ColumnDescriptor::new(name.clone(), type_code))
        .collect())
}
