//! Laying out a new record in the column order of the sheet it is appended to.

use crate::schema::{Column, Field, HeaderMap};
use crate::store::{RecordStore, Value, ValueInputMode};
use crate::{Collection, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Field(Field),
    Name(String),
}

impl Key {
    fn matches(&self, column: &Column) -> bool {
        match self {
            Key::Field(field) => column.field == Some(*field),
            Key::Name(name) => {
                let name = name.trim().to_lowercase();
                name == column.raw.trim().to_lowercase() || name == column.name().to_lowercase()
            }
        }
    }
}

/// The values of a record to append, keyed by field or by header name.
#[derive(Debug, Clone, Default)]
pub struct RowValues {
    entries: Vec<(Key, Value)>,
}

impl RowValues {
    pub fn new() -> Self {
        RowValues::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.entries.push((Key::Field(field), value.into()));
        self
    }

    /// A value for the column whose raw or canonical header is `name`, ignoring case.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((Key::Name(name.into()), value.into()));
        self
    }

    fn lookup(&self, column: &Column) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key.matches(column))
            .map(|(_, value)| value)
    }
}

/// One value per column of `headers`, in sheet order. Columns without a value stay empty.
pub fn build_row(headers: &HeaderMap, values: &RowValues) -> Vec<Value> {
    let row: Vec<Value> = headers
        .columns()
        .iter()
        .map(|column| values.lookup(column).cloned().unwrap_or_default())
        .collect();

    for (key, _) in &values.entries {
        if !headers.columns().iter().any(|column| key.matches(column)) {
            tracing::debug!("No column for {:?}, value dropped", key);
        }
    }
    row
}

/// Read the current header of `store`, lay out `values` against it and append the row.
pub fn append_record<S: RecordStore>(
    store: &mut S,
    headers: &HeaderMap,
    values: &RowValues,
    collection: Collection,
) -> Result<()> {
    let row = build_row(headers, values);
    tracing::debug!("Appending {} cells to {}", row.len(), collection);
    store.append_row(row, ValueInputMode::UserEntered)?;
    Ok(())
}
