//! The tabular record store the ledger reads from and writes to.
//!
//! A store is a single sheet: one header row followed by data rows. Row and column
//! indices handed to [`RecordStore`] are 1-based and the header occupies row 1, so the
//! record at 0-based position `p` lives on row [`sheet_row(p)`](sheet_row).

mod memory;
mod workbook;

pub use memory::MemoryStore;
pub use workbook::{CsvStore, init_workbook};

use crate::Decimal;
use crate::error::StoreError;
use serde::Serialize;
use std::fmt;

/// How textual values are stored by [`RecordStore::append_row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInputMode {
    /// Store text verbatim, even when it looks like a number.
    Raw,
    /// Interpret numeric text as a number, the way a user typing into the sheet would.
    UserEntered,
}

/// A single cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Text(String),
    Number(Decimal),
}

impl Value {
    /// Interpret user-entered text: blank becomes [`Value::Empty`], and text that is
    /// exactly how its number prints becomes a number. Anything else, such as "007" or
    /// " 5", stays text so it reads back unchanged.
    pub fn interpret(text: &str) -> Value {
        if text.trim().is_empty() {
            return Value::Empty;
        }
        match text.parse::<Decimal>() {
            Ok(number) if number.to_string() == text => Value::Number(number),
            _ => Value::Text(text.to_owned()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(text) => text.trim().is_empty(),
            Value::Number(_) => false,
        }
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Empty => None,
            Value::Text(text) => text.trim().parse().ok(),
            Value::Number(number) => Some(*number),
        }
    }

    /// The value as a whole number, `None` if it has a fractional part.
    pub fn to_integer(&self) -> Option<i64> {
        let number = self.to_decimal()?;
        if !number.fract().is_zero() {
            return None;
        }
        i64::try_from(number.trunc()).ok()
    }

    /// Re-interpret text cells according to `mode`.
    fn with_mode(self, mode: ValueInputMode) -> Value {
        match (mode, self) {
            (ValueInputMode::UserEntered, Value::Text(text)) => Value::interpret(&text),
            (_, value) => value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Decimal> for Value {
    fn from(number: Decimal) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(Decimal::from(number))
    }
}

impl From<u32> for Value {
    fn from(number: u32) -> Self {
        Value::Number(Decimal::from(number))
    }
}

/// The sheet row holding the record at 0-based `position`.
pub fn sheet_row(position: usize) -> usize {
    position + 2
}

/// A snapshot of every row in a store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Table { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, position: usize) -> Option<Record<'_>> {
        self.rows.get(position).map(|values| Record {
            header: &self.header,
            values,
            position,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(position, values)| Record {
                header: &self.header,
                values,
                position,
            })
    }
}

/// One data row of a [`Table`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    header: &'a [String],
    values: &'a [Value],
    position: usize,
}

impl<'a> Record<'a> {
    /// 0-based position among the data rows.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The cell in 0-based `column`. Short rows read as empty.
    pub fn get(&self, column: usize) -> &'a Value {
        const EMPTY: &Value = &Value::Empty;
        self.values.get(column).unwrap_or(EMPTY)
    }

    /// Header/value pairs in column order.
    pub fn cells(self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.header
            .iter()
            .enumerate()
            .map(move |(column, header)| (header.as_str(), self.get(column)))
    }
}

/// Access to one sheet of an external tabular store.
///
/// Implementations do not cache: every read reflects the current contents, and every
/// write goes straight to the backing storage.
pub trait RecordStore {
    fn header_row(&self) -> Result<Vec<String>, StoreError>;

    fn get_all_records(&self) -> Result<Table, StoreError>;

    fn append_row(&mut self, values: Vec<Value>, mode: ValueInputMode) -> Result<(), StoreError>;

    /// Overwrite a single cell. Text is interpreted as in [`ValueInputMode::UserEntered`].
    fn update_cell(&mut self, row: usize, column: usize, value: Value) -> Result<(), StoreError>;

    fn delete_row(&mut self, row: usize) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpret_numeric_text() {
        assert_eq!(Value::interpret("12.50"), Value::Number(Decimal::new(1250, 2)));
        assert_eq!(Value::interpret("-3"), Value::Number(Decimal::from(-3)));
        assert_eq!(Value::interpret("  "), Value::Empty);
        assert_eq!(Value::interpret("Pen"), Value::Text("Pen".into()));
        assert_eq!(Value::interpret("2025-01-03"), Value::Text("2025-01-03".into()));
    }

    #[test]
    fn number_like_text_reads_back_unchanged() {
        for text in ["007", " 12.50 ", "+5", ".5", "1e3"] {
            let value = Value::interpret(text);
            assert_eq!(value, Value::Text(text.into()));
            assert_eq!(value.to_string(), text);
        }
        assert_eq!(Value::interpret("007").to_integer(), Some(7));
        assert_eq!(Value::interpret(" 12.50 ").to_decimal(), Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(Value::from(7i64).to_integer(), Some(7));
        assert_eq!(Value::Text("3.0".into()).to_integer(), Some(3));
        assert_eq!(Value::Text("2.5".into()).to_integer(), None);
        assert_eq!(Value::Empty.to_integer(), None);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let table = Table::new(
            vec!["Item".into(), "Stock".into()],
            vec![vec![Value::from("Pen")]],
        );
        let record = table.record(0).unwrap();
        assert_eq!(record.get(1), &Value::Empty);
        let cells: Vec<_> = record.cells().collect();
        assert_eq!(cells, vec![("Item", &Value::from("Pen")), ("Stock", &Value::Empty)]);
    }
}
