use crate::schema::{Field, SchemaConflict};
use crate::{Collection, Decimal};

/// Failures that abort the current action.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("item '{0}' does not exist in the inventory")]
    ItemNotFound(String),
    #[error("no record in {collection} matches the given criteria")]
    RecordNotMatched { collection: Collection },
    #[error("no record at position {position} in {collection}")]
    PositionOutOfRange {
        collection: Collection,
        position: usize,
    },
    #[error("selling {requested} of '{item}' exceeds the {available} in stock")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },
    #[error("{collection} has no '{field}' column")]
    MissingColumn { collection: Collection, field: Field },
    #[error("invalid value '{value}' in column '{column}'")]
    InvalidValue { column: String, value: String },
    #[error("{0}")]
    InvalidInput(String),
    #[error("{what} is too large to compute")]
    Overflow { what: &'static str },
    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Error::StoreUnavailable(error)
    }
}

/// Errors raised by a [`RecordStore`](crate::store::RecordStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row} is outside the sheet ({rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
    #[error("column {column} is outside the sheet ({columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("the header row cannot be modified")]
    HeaderRow,
}

/// Things an action reports without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Two raw headers resolved to the same field; the first one keeps the mapping.
    SchemaConflict(SchemaConflict),
    /// Stock would have gone below zero and was floored at zero instead.
    NegativeStockAttempt {
        item: String,
        available: i64,
        requested: i64,
    },
    /// Several records matched a delete request; only the first was removed.
    AmbiguousMatch {
        collection: Collection,
        positions: Vec<usize>,
    },
    /// A purchase referenced an unknown item, which was added to the inventory.
    ItemCreated { item: String, sell_price: Decimal },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::SchemaConflict(SchemaConflict {
                field,
                kept,
                ignored,
            }) => write!(
                f,
                "columns '{kept}' and '{ignored}' both map to '{field}', keeping '{kept}'"
            ),
            Warning::NegativeStockAttempt {
                item,
                available,
                requested,
            } => write!(
                f,
                "stock of '{item}' would go negative ({available} - {requested}), clamped to 0"
            ),
            Warning::AmbiguousMatch {
                collection,
                positions,
            } => write!(
                f,
                "{} records in {collection} matched, deleted the first (positions {positions:?})",
                positions.len()
            ),
            Warning::ItemCreated { item, sell_price } => {
                write!(f, "added new item '{item}' with sell price {sell_price}")
            }
        }
    }
}
