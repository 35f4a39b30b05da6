//! Recording and deleting sales and purchases across the three sheets of a workbook.
//!
//! Each action is a sequence of separate store calls (append or delete the transaction
//! row, then update the stock). They are not atomic: when a later step fails, earlier
//! ones stay applied and the error is returned as is.

use crate::error::{Error, Warning};
use crate::inventory::{
    Inventory, Item, LedgerConfig, LedgerUpdater, check_price, check_quantity, decimal_cell,
    default_sell_price, integer_cell, text_cell,
};
use crate::locate::{Criteria, locate_all};
use crate::report::{self, Summary};
use crate::row::{RowValues, append_record};
use crate::schema::{Field, HeaderMap, SchemaMapper};
use crate::store::{CsvStore, RecordStore, Table, sheet_row};
use crate::{Collection, Decimal, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl TransactionKind {
    pub fn collection(self) -> Collection {
        match self {
            TransactionKind::Sale => Collection::Sales,
            TransactionKind::Purchase => Collection::Purchases,
        }
    }

    /// The field holding the unit price of this kind of transaction.
    pub fn price_field(self) -> Field {
        match self {
            TransactionKind::Sale => Field::SellPrice,
            TransactionKind::Purchase => Field::BuyPrice,
        }
    }
}

/// A sale or purchase about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub item: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl NewTransaction {
    pub fn total(&self) -> Result<Decimal> {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "total of {} × {} is too large",
                    self.quantity, self.price
                ))
            })
    }

    fn validate(&self) -> Result<()> {
        if self.item.trim().is_empty() {
            return Err(Error::InvalidInput("item name must not be empty".into()));
        }
        check_quantity(self.quantity)?;
        check_price(self.price)?;
        self.total().map(|_| ())
    }
}

/// A recorded sale or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// 0-based position in its sheet.
    pub position: usize,
    pub date: String,
    pub item: String,
    pub quantity: i64,
    pub price: Decimal,
    /// The total as stored, if the sheet has one.
    pub total: Option<Decimal>,
}

impl Transaction {
    /// The stored total, or quantity × price when the sheet does not keep one.
    /// `None` when that product does not fit in a [`Decimal`].
    pub fn total(&self) -> Option<Decimal> {
        match self.total {
            Some(total) => Some(total),
            None => self.price.checked_mul(Decimal::from(self.quantity)),
        }
    }
}

/// What a successful action had to report along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub warnings: Vec<Warning>,
}

impl Outcome {
    fn new(warnings: Vec<Warning>) -> Self {
        for warning in &warnings {
            tracing::debug!("{}", warning);
        }
        Outcome { warnings }
    }
}

/// A workbook: inventory, sales and purchases, each in its own store.
#[derive(Debug)]
pub struct Book<S> {
    inventory: S,
    sales: S,
    purchases: S,
    config: LedgerConfig,
}

impl Book<CsvStore> {
    /// The workbook whose CSV files live in `dir`.
    pub fn open_dir(dir: impl AsRef<Path>, config: LedgerConfig) -> Self {
        let dir = dir.as_ref();
        Book::new(
            CsvStore::in_workbook(dir, Collection::Inventory),
            CsvStore::in_workbook(dir, Collection::Sales),
            CsvStore::in_workbook(dir, Collection::Purchases),
            config,
        )
    }
}

impl<S: RecordStore> Book<S> {
    pub fn new(inventory: S, sales: S, purchases: S, config: LedgerConfig) -> Self {
        Book {
            inventory,
            sales,
            purchases,
            config,
        }
    }

    fn store(&self, collection: Collection) -> &S {
        match collection {
            Collection::Inventory => &self.inventory,
            Collection::Sales => &self.sales,
            Collection::Purchases => &self.purchases,
        }
    }

    fn store_mut(&mut self, collection: Collection) -> &mut S {
        match collection {
            Collection::Inventory => &mut self.inventory,
            Collection::Sales => &mut self.sales,
            Collection::Purchases => &mut self.purchases,
        }
    }

    fn ledger(&mut self) -> LedgerUpdater<'_, S> {
        LedgerUpdater::new(&mut self.inventory, &self.config)
    }

    fn transaction_headers(&self, kind: TransactionKind) -> Result<HeaderMap> {
        let collection = kind.collection();
        let header = self.store(collection).header_row()?;
        let headers = SchemaMapper::for_collection(collection).normalize(&header);
        headers.require(Field::Item, collection)?;
        headers.require(Field::Quantity, collection)?;
        Ok(headers)
    }

    pub fn inventory(&self) -> Result<Vec<Item>> {
        Ok(Inventory::read(&self.inventory)?.into_items())
    }

    /// The current sell price of `item`, used when a sale is recorded without one.
    pub fn sell_price(&self, item: &str) -> Result<Decimal> {
        let inventory = Inventory::read(&self.inventory)?;
        let (_, found) = inventory
            .find(item.trim())
            .ok_or_else(|| Error::ItemNotFound(item.trim().to_owned()))?;
        Ok(found.sell_price)
    }

    pub fn transactions(&self, kind: TransactionKind) -> Result<Vec<Transaction>> {
        let collection = kind.collection();
        let table = self.store(collection).get_all_records()?;
        let headers = SchemaMapper::for_collection(collection).normalize(table.header());
        read_transactions(&table, &headers, kind)
    }

    pub fn sales(&self) -> Result<Vec<Transaction>> {
        self.transactions(TransactionKind::Sale)
    }

    pub fn purchases(&self) -> Result<Vec<Transaction>> {
        self.transactions(TransactionKind::Purchase)
    }

    pub fn dashboard(&self) -> Result<Summary> {
        let inventory = self.inventory()?;
        let sales = self.sales()?;
        report::summarize(&inventory, &sales)
    }

    /// Append a sale and take the units out of stock.
    ///
    /// The item has to exist. Under [`StockPolicy::Reject`](crate::StockPolicy::Reject) a sale exceeding the stock is
    /// refused before anything is written.
    pub fn record_sale(&mut self, sale: &NewTransaction) -> Result<Outcome> {
        sale.validate()?;
        self.ledger().check_sale(sale.item.trim(), sale.quantity)?;

        let mut warnings = self.append_transaction(TransactionKind::Sale, sale)?;
        warnings.extend(
            self.ledger()
                .apply_sale(sale.item.trim(), sale.quantity, sale.price)?,
        );

        tracing::info!(
            "Recorded sale of {} '{}' at {} on {}",
            sale.quantity,
            sale.item,
            sale.price,
            sale.date
        );
        Ok(Outcome::new(warnings))
    }

    /// Append a purchase and add the units to stock, creating the item if it is new.
    pub fn record_purchase(&mut self, purchase: &NewTransaction) -> Result<Outcome> {
        purchase.validate()?;
        // a new item gets a marked-up sell price, which has to fit too
        default_sell_price(purchase.price)?;

        let mut warnings = self.append_transaction(TransactionKind::Purchase, purchase)?;
        warnings.extend(self.ledger().apply_purchase(
            purchase.item.trim(),
            purchase.quantity,
            purchase.price,
        )?);

        tracing::info!(
            "Recorded purchase of {} '{}' at {} on {}",
            purchase.quantity,
            purchase.item,
            purchase.price,
            purchase.date
        );
        Ok(Outcome::new(warnings))
    }

    fn append_transaction(
        &mut self,
        kind: TransactionKind,
        transaction: &NewTransaction,
    ) -> Result<Vec<Warning>> {
        let headers = self.transaction_headers(kind)?;
        let values = RowValues::new()
            .with(Field::Date, transaction.date.to_string())
            .with(Field::Item, transaction.item.trim())
            .with(Field::Quantity, transaction.quantity)
            .with(kind.price_field(), transaction.price)
            .with(Field::Total, transaction.total()?);

        let collection = kind.collection();
        append_record(self.store_mut(collection), &headers, &values, collection)?;
        Ok(headers.warnings().collect())
    }

    pub fn delete_sale(&mut self, criteria: &Criteria) -> Result<Outcome> {
        self.delete_matching(TransactionKind::Sale, criteria)
    }

    pub fn delete_purchase(&mut self, criteria: &Criteria) -> Result<Outcome> {
        self.delete_matching(TransactionKind::Purchase, criteria)
    }

    pub fn delete_sale_at(&mut self, position: usize) -> Result<Outcome> {
        self.delete_at(TransactionKind::Sale, position)
    }

    pub fn delete_purchase_at(&mut self, position: usize) -> Result<Outcome> {
        self.delete_at(TransactionKind::Purchase, position)
    }

    /// Delete the first record matching `criteria` and undo its effect on stock.
    ///
    /// When several records match, the first is deleted and the others are reported
    /// through [`Warning::AmbiguousMatch`].
    pub fn delete_matching(
        &mut self,
        kind: TransactionKind,
        criteria: &Criteria,
    ) -> Result<Outcome> {
        if criteria.is_empty() {
            return Err(Error::InvalidInput(
                "at least one field is needed to find the record to delete".into(),
            ));
        }

        let collection = kind.collection();
        let table = self.store(collection).get_all_records()?;
        let headers = SchemaMapper::for_collection(collection).normalize(table.header());

        let positions = locate_all(&table, &headers, criteria);
        let Some(&position) = positions.first() else {
            return Err(Error::RecordNotMatched { collection });
        };

        let mut warnings = Vec::new();
        if positions.len() > 1 {
            tracing::warn!(
                "{} records in {} match, deleting the first one at position {}",
                positions.len(),
                collection,
                position
            );
            warnings.push(Warning::AmbiguousMatch {
                collection,
                positions,
            });
        }

        warnings.extend(self.delete_record(kind, &table, &headers, position)?);
        Ok(Outcome::new(warnings))
    }

    /// Delete the record at 0-based `position` and undo its effect on stock.
    pub fn delete_at(&mut self, kind: TransactionKind, position: usize) -> Result<Outcome> {
        let collection = kind.collection();
        let table = self.store(collection).get_all_records()?;
        let headers = SchemaMapper::for_collection(collection).normalize(table.header());
        let warnings = self.delete_record(kind, &table, &headers, position)?;
        Ok(Outcome::new(warnings))
    }

    fn delete_record(
        &mut self,
        kind: TransactionKind,
        table: &Table,
        headers: &HeaderMap,
        position: usize,
    ) -> Result<Vec<Warning>> {
        let collection = kind.collection();
        let record = table
            .record(position)
            .ok_or(Error::PositionOutOfRange {
                collection,
                position,
            })?;

        let item = text_cell(&record, Some(headers.require(Field::Item, collection)?));
        let quantity_column = headers.require(Field::Quantity, collection)?;
        let quantity = integer_cell(&record, Some(quantity_column), headers)?
            .and_then(|quantity| u32::try_from(quantity).ok())
            .filter(|quantity| *quantity > 0)
            .ok_or_else(|| Error::InvalidValue {
                column: headers.columns()[quantity_column].raw.clone(),
                value: record.get(quantity_column).to_string(),
            })?;

        self.store_mut(collection)
            .delete_row(sheet_row(position))?;
        tracing::info!(
            "Deleted {} of {} '{}' from {}",
            match kind {
                TransactionKind::Sale => "sale",
                TransactionKind::Purchase => "purchase",
            },
            quantity,
            item,
            collection
        );

        let mut warnings: Vec<Warning> = headers.warnings().collect();
        let mut ledger = self.ledger();
        warnings.extend(match kind {
            TransactionKind::Sale => ledger.reverse_sale(&item, quantity)?,
            TransactionKind::Purchase => ledger.reverse_purchase(&item, quantity)?,
        });
        Ok(warnings)
    }
}

fn read_transactions(
    table: &Table,
    headers: &HeaderMap,
    kind: TransactionKind,
) -> Result<Vec<Transaction>> {
    let collection = kind.collection();
    let item_column = headers.require(Field::Item, collection)?;
    let quantity_column = headers.position(Field::Quantity);
    let price_column = headers.position(kind.price_field());
    let date_column = headers.position(Field::Date);
    let total_column = headers.position(Field::Total);

    let mut transactions = Vec::with_capacity(table.len());
    for record in table.records() {
        let item = text_cell(&record, Some(item_column));
        if item.is_empty() {
            continue;
        }
        transactions.push(Transaction {
            position: record.position(),
            date: text_cell(&record, date_column),
            item,
            quantity: integer_cell(&record, quantity_column, headers)?.unwrap_or_default(),
            price: decimal_cell(&record, price_column, headers)?.unwrap_or_default(),
            total: decimal_cell(&record, total_column, headers)?,
        });
    }
    Ok(transactions)
}
