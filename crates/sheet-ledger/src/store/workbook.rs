use super::{RecordStore, Table, Value, ValueInputMode};
use crate::Collection;
use crate::error::StoreError;
use std::path::{Path, PathBuf};

/// A sheet stored as a CSV file, header first.
///
/// Every call reads the file again and every write replaces it. The file format is
/// untyped, so [`ValueInputMode`] makes no difference on disk: cells are interpreted
/// when they are read back.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    fn data_row(&mut self, row: usize) -> Result<&mut Vec<String>, StoreError> {
        if row <= 1 {
            return Err(StoreError::HeaderRow);
        }
        let rows = self.rows.len() + 1;
        self.rows
            .get_mut(row - 2)
            .ok_or(StoreError::RowOutOfRange { row, rows })
    }
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvStore { path: path.into() }
    }

    /// The store for `collection` inside the workbook directory `dir`.
    pub fn in_workbook(dir: &Path, collection: Collection) -> Self {
        CsvStore::new(dir.join(collection.file_name()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Sheet, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut records = reader.records();
        let header = match records.next() {
            Some(record) => record?
                .iter()
                .enumerate()
                // spreadsheet exports often start the file with a byte order mark
                .map(|(i, cell)| match i {
                    0 => cell.trim_start_matches('\u{feff}').to_owned(),
                    _ => cell.to_owned(),
                })
                .collect(),
            None => Vec::new(),
        };
        let rows = records
            .map(|record| record.map(|record| record.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        Ok(Sheet { header, rows })
    }

    fn write(&self, sheet: &Sheet) -> Result<(), StoreError> {
        let staged = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&staged)?;
            writer.write_record(&sheet.header)?;
            for row in &sheet.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&staged, &self.path)?;
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn header_row(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.read()?.header)
    }

    fn get_all_records(&self) -> Result<Table, StoreError> {
        let sheet = self.read()?;
        let rows = sheet
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| Value::interpret(cell)).collect())
            .collect();
        Ok(Table::new(sheet.header, rows))
    }

    fn append_row(&mut self, values: Vec<Value>, _mode: ValueInputMode) -> Result<(), StoreError> {
        let mut sheet = self.read()?;
        sheet
            .rows
            .push(values.iter().map(ToString::to_string).collect());
        self.write(&sheet)
    }

    fn update_cell(&mut self, row: usize, column: usize, value: Value) -> Result<(), StoreError> {
        let mut sheet = self.read()?;
        let columns = sheet.header.len();
        if column == 0 || column > columns {
            return Err(StoreError::ColumnOutOfRange { column, columns });
        }
        let cells = sheet.data_row(row)?;
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();
        self.write(&sheet)
    }

    fn delete_row(&mut self, row: usize) -> Result<(), StoreError> {
        let mut sheet = self.read()?;
        sheet.data_row(row)?;
        sheet.rows.remove(row - 2);
        self.write(&sheet)
    }
}

/// Create the workbook directory and any missing collection file with its default header.
///
/// Existing files are left untouched. Returns the files that were created.
pub fn init_workbook(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    std::fs::create_dir_all(dir)?;

    let mut created = Vec::new();
    for collection in Collection::ALL {
        let store = CsvStore::in_workbook(dir, collection);
        if store.path().exists() {
            continue;
        }
        store.write(&Sheet {
            header: collection
                .default_header()
                .iter()
                .map(|h| h.to_string())
                .collect(),
            rows: Vec::new(),
        })?;
        tracing::info!("Created {}", store.path().display());
        created.push(store.path().to_owned());
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_workbook(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sheet-ledger-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn init_creates_missing_files_only() {
        let dir = temp_workbook("init");
        let created = init_workbook(&dir).unwrap();
        assert_eq!(created.len(), 3);

        let inventory = CsvStore::in_workbook(&dir, Collection::Inventory);
        assert_eq!(
            inventory.header_row().unwrap(),
            vec!["Item", "Buy Price", "Sell Price", "Stock"]
        );

        assert!(init_workbook(&dir).unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writes_round_trip_through_the_file() {
        let dir = temp_workbook("rw");
        init_workbook(&dir).unwrap();
        let mut sales = CsvStore::in_workbook(&dir, Collection::Sales);

        sales
            .append_row(
                vec![
                    "2025-03-01".into(),
                    "Pen, blue".into(),
                    Value::from(3i64),
                    Value::from("1.50"),
                ],
                ValueInputMode::UserEntered,
            )
            .unwrap();
        sales.update_cell(2, 5, Value::from("4.50")).unwrap();

        let table = sales.get_all_records().unwrap();
        assert_eq!(table.len(), 1);
        let record = table.record(0).unwrap();
        assert_eq!(record.get(1), &Value::from("Pen, blue"));
        assert_eq!(record.get(2).to_integer(), Some(3));
        assert_eq!(record.get(4).to_decimal(), "4.50".parse().ok());

        sales.delete_row(2).unwrap();
        assert!(sales.get_all_records().unwrap().is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn byte_order_mark_is_not_part_of_the_header() {
        let dir = temp_workbook("bom");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Inventory.csv");
        std::fs::write(&path, "\u{feff}Item,Stock\nPen,3\n").unwrap();

        let mut store = CsvStore::new(&path);
        assert_eq!(store.header_row().unwrap(), vec!["Item", "Stock"]);
        store.update_cell(2, 2, Value::from(4i64)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Item,Stock\nPen,4\n");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_error() {
        let store = CsvStore::new(temp_workbook("missing").join("Inventory.csv"));
        assert!(store.get_all_records().is_err());
    }
}
