use sheet_ledger::store::CsvStore;
use sheet_ledger::{Book, LedgerConfig};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

#[derive(Clone, Debug)]
pub struct FileChangeEvent;

/// Shared server state.
///
/// Every request locks the whole book, so one action's reads and writes never
/// interleave with another's.
#[derive(Clone)]
pub struct AppState {
    pub book: Arc<Mutex<Book<CsvStore>>>,
    pub file_change_tx: broadcast::Sender<FileChangeEvent>,
}

impl AppState {
    pub fn new(
        workbook: &Path,
        config: LedgerConfig,
        file_change_tx: broadcast::Sender<FileChangeEvent>,
    ) -> Self {
        AppState {
            book: Arc::new(Mutex::new(Book::open_dir(workbook, config))),
            file_change_tx,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Book<CsvStore>> {
        // Book keeps no in-memory state between calls
        self.book.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
