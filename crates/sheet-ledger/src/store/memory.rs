use super::{RecordStore, Table, Value, ValueInputMode};
use crate::error::StoreError;

/// A sheet kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
    offline: bool,
}

impl MemoryStore {
    pub fn new<S: AsRef<str>>(header: &[S]) -> Self {
        MemoryStore {
            header: header.iter().map(|h| h.as_ref().to_owned()).collect(),
            rows: Vec::new(),
            offline: false,
        }
    }

    /// Add a data row, interpreting every cell as user-entered text.
    pub fn with_row<S: AsRef<str>>(mut self, row: &[S]) -> Self {
        self.rows
            .push(row.iter().map(|cell| Value::interpret(cell.as_ref())).collect());
        self
    }

    /// Make every subsequent call fail, the way an unreachable remote store would.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "store is offline",
            )));
        }
        Ok(())
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut Vec<Value>, StoreError> {
        if row <= 1 {
            return Err(StoreError::HeaderRow);
        }
        let rows = self.rows.len() + 1;
        self.rows
            .get_mut(row - 2)
            .ok_or(StoreError::RowOutOfRange { row, rows })
    }
}

impl RecordStore for MemoryStore {
    fn header_row(&self) -> Result<Vec<String>, StoreError> {
        self.check_online()?;
        Ok(self.header.clone())
    }

    fn get_all_records(&self) -> Result<Table, StoreError> {
        self.check_online()?;
        Ok(Table::new(self.header.clone(), self.rows.clone()))
    }

    fn append_row(&mut self, values: Vec<Value>, mode: ValueInputMode) -> Result<(), StoreError> {
        self.check_online()?;
        self.rows
            .push(values.into_iter().map(|value| value.with_mode(mode)).collect());
        Ok(())
    }

    fn update_cell(&mut self, row: usize, column: usize, value: Value) -> Result<(), StoreError> {
        self.check_online()?;
        let columns = self.header.len();
        if column == 0 || column > columns {
            return Err(StoreError::ColumnOutOfRange { column, columns });
        }
        let cells = self.row_mut(row)?;
        if cells.len() < column {
            cells.resize(column, Value::Empty);
        }
        cells[column - 1] = value.with_mode(ValueInputMode::UserEntered);
        Ok(())
    }

    fn delete_row(&mut self, row: usize) -> Result<(), StoreError> {
        self.check_online()?;
        self.row_mut(row)?;
        self.rows.remove(row - 2);
        Ok(())
    }
}
