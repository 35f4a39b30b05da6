//! Keeping an inventory sheet consistent with the sales and purchases recorded next to it.
//!
//! Every operation reads the current state of the sheets before changing them; nothing is
//! cached between calls.

pub mod book;
pub mod error;
pub mod inventory;
pub mod locate;
pub mod report;
pub mod row;
pub mod schema;
pub mod store;

pub type Decimal = rust_decimal::Decimal;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub use book::{Book, NewTransaction, Outcome, Transaction, TransactionKind};
pub use error::{Error, StoreError, Warning};
pub use inventory::{Item, LedgerConfig, LedgerUpdater, StockPolicy};
pub use schema::{Field, HeaderMap, SchemaMapper};

use serde::Serialize;
use std::fmt;

/// The three sheets making up a workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Inventory,
    Sales,
    Purchases,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Inventory,
        Collection::Sales,
        Collection::Purchases,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Inventory => "Inventory",
            Collection::Sales => "Sales",
            Collection::Purchases => "Purchases",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    /// Header written when a collection is created from scratch.
    pub fn default_header(self) -> &'static [&'static str] {
        match self {
            Collection::Inventory => &["Item", "Buy Price", "Sell Price", "Stock"],
            Collection::Sales => &["Date", "Item", "Units Sold", "Price", "Total"],
            Collection::Purchases => &["Date", "Item", "Units Bought", "Price", "Total"],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
