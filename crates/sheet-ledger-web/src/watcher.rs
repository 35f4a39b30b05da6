use anyhow::Result;
use notify::{EventKind, RecursiveMode};
use notify_debouncer_full::{Debouncer, NoCache, new_debouncer};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Watches a workbook directory and calls back when one of its CSV files changes.
pub struct FileWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher, NoCache>,
}

impl FileWatcher {
    pub fn new<F>(workbook: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let mut debouncer = new_debouncer(
            Duration::from_millis(100),
            None,
            move |res: Result<Vec<notify_debouncer_full::DebouncedEvent>, _>| {
                let mut events = match res {
                    Ok(events) => events,
                    Err(e) => {
                        error!("Watch error: {:?}", e);
                        return;
                    }
                };

                events.retain(|e| {
                    matches!(
                        e.event.kind,
                        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                    ) && e.event.paths.iter().any(|path| is_sheet(path))
                });

                if !events.is_empty() {
                    info!("Workbook modification detected: {} events", events.len());

                    on_change();
                }
            },
        )?;

        info!("Watching workbook: {:?}", workbook);
        debouncer.watch(workbook, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

fn is_sheet(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "csv")
}
