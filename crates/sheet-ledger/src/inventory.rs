//! The stock ledger: on-hand quantities in the inventory sheet, kept in step with
//! every sale and purchase.

use crate::error::{Error, Warning};
use crate::row::{RowValues, append_record};
use crate::schema::{Field, HeaderMap, SchemaMapper};
use crate::store::{Record, RecordStore, Value, sheet_row};
use crate::{Collection, Decimal, Result};
use serde::{Deserialize, Serialize};

/// What to do when an update would take stock below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockPolicy {
    /// Floor the stock at zero and report a warning.
    #[default]
    Clamp,
    /// Refuse the update.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub stock_policy: StockPolicy,
    /// Overwrite the item's sell price with the price of each sale.
    pub refresh_sell_price_on_sale: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            stock_policy: StockPolicy::Clamp,
            refresh_sell_price_on_sale: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub name: String,
    pub buy_price: Decimal,
    pub sell_price: Decimal,
    pub stock: i64,
}

/// Sell price given to an item first seen in a purchase: 20% over the buy price.
pub fn default_sell_price(buy_price: Decimal) -> Result<Decimal> {
    buy_price
        .checked_mul(Decimal::new(12, 1))
        .map(|price| price.round_dp(2))
        .ok_or_else(|| Error::InvalidInput(format!("buy price {buy_price} is too large")))
}

pub(crate) fn text_cell(record: &Record<'_>, column: Option<usize>) -> String {
    column
        .map(|column| record.get(column).to_string().trim().to_owned())
        .unwrap_or_default()
}

pub(crate) fn decimal_cell(
    record: &Record<'_>,
    column: Option<usize>,
    headers: &HeaderMap,
) -> Result<Option<Decimal>> {
    let Some(column) = column else {
        return Ok(None);
    };
    let value = record.get(column);
    if value.is_empty() {
        return Ok(None);
    }
    value
        .to_decimal()
        .map(Some)
        .ok_or_else(|| invalid_value(headers, column, value))
}

pub(crate) fn integer_cell(
    record: &Record<'_>,
    column: Option<usize>,
    headers: &HeaderMap,
) -> Result<Option<i64>> {
    let Some(column) = column else {
        return Ok(None);
    };
    let value = record.get(column);
    if value.is_empty() {
        return Ok(None);
    }
    value
        .to_integer()
        .map(Some)
        .ok_or_else(|| invalid_value(headers, column, value))
}

fn invalid_value(headers: &HeaderMap, column: usize, value: &Value) -> Error {
    Error::InvalidValue {
        column: headers.columns()[column].raw.clone(),
        value: value.to_string(),
    }
}

/// The inventory sheet as read at one point in time.
#[derive(Debug, Clone)]
pub struct Inventory {
    headers: HeaderMap,
    items: Vec<(usize, Item)>,
}

impl Inventory {
    pub fn read<S: RecordStore>(store: &S) -> Result<Self> {
        let table = store.get_all_records()?;
        let headers = SchemaMapper::for_collection(Collection::Inventory).normalize(table.header());

        let name_column = headers.require(Field::Item, Collection::Inventory)?;
        let buy_column = headers.position(Field::BuyPrice);
        let sell_column = headers.position(Field::SellPrice);
        let stock_column = headers.position(Field::Stock);

        let mut items: Vec<(usize, Item)> = Vec::with_capacity(table.len());
        for record in table.records() {
            let name = text_cell(&record, Some(name_column));
            if name.is_empty() {
                continue;
            }
            if items.iter().any(|(_, item)| item.name == name) {
                tracing::warn!("Inventory lists '{}' more than once, using the first row", name);
            }
            items.push((
                record.position(),
                Item {
                    name,
                    buy_price: decimal_cell(&record, buy_column, &headers)?.unwrap_or_default(),
                    sell_price: decimal_cell(&record, sell_column, &headers)?.unwrap_or_default(),
                    stock: integer_cell(&record, stock_column, &headers)?.unwrap_or_default(),
                },
            ));
        }

        Ok(Inventory { headers, items })
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().map(|(_, item)| item)
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items.into_iter().map(|(_, item)| item).collect()
    }

    /// The first item named exactly `name`, with its position in the sheet.
    pub fn find(&self, name: &str) -> Option<(usize, &Item)> {
        self.items
            .iter()
            .find(|(_, item)| item.name == name)
            .map(|(position, item)| (*position, item))
    }
}

/// Applies transactions to the stock column of an inventory sheet.
///
/// Each operation re-reads the sheet, computes the new value and writes it back.
pub struct LedgerUpdater<'a, S> {
    inventory: &'a mut S,
    config: &'a LedgerConfig,
}

impl<'a, S: RecordStore> LedgerUpdater<'a, S> {
    pub fn new(inventory: &'a mut S, config: &'a LedgerConfig) -> Self {
        LedgerUpdater { inventory, config }
    }

    /// Add purchased stock, creating the item if it is new. Prices of an existing item
    /// are left alone.
    pub fn apply_purchase(
        &mut self,
        item: &str,
        quantity: u32,
        buy_price: Decimal,
    ) -> Result<Vec<Warning>> {
        check_quantity(quantity)?;
        check_price(buy_price)?;

        let inventory = Inventory::read(&*self.inventory)?;
        let mut warnings: Vec<Warning> = inventory.headers().warnings().collect();

        if inventory.find(item).is_some() {
            warnings.extend(self.adjust(&inventory, item, i64::from(quantity))?);
            return Ok(warnings);
        }

        let sell_price = default_sell_price(buy_price)?;
        let values = RowValues::new()
            .with(Field::Item, item)
            .with(Field::BuyPrice, buy_price)
            .with(Field::SellPrice, sell_price)
            .with(Field::Stock, quantity);
        inventory
            .headers()
            .require(Field::Stock, Collection::Inventory)?;
        append_record(
            &mut *self.inventory,
            inventory.headers(),
            &values,
            Collection::Inventory,
        )?;

        tracing::info!("Added '{}' to inventory with {} in stock", item, quantity);
        warnings.push(Warning::ItemCreated {
            item: item.to_owned(),
            sell_price,
        });
        Ok(warnings)
    }

    /// Take sold units out of stock. The item must already exist.
    pub fn apply_sale(
        &mut self,
        item: &str,
        quantity: u32,
        sell_price: Decimal,
    ) -> Result<Vec<Warning>> {
        check_quantity(quantity)?;
        check_price(sell_price)?;

        let inventory = Inventory::read(&*self.inventory)?;
        let mut warnings: Vec<Warning> = inventory.headers().warnings().collect();
        warnings.extend(self.adjust(&inventory, item, -i64::from(quantity))?);

        if self.config.refresh_sell_price_on_sale {
            let (position, current) = inventory
                .find(item)
                .ok_or_else(|| Error::ItemNotFound(item.to_owned()))?;
            if current.sell_price != sell_price {
                let column = inventory
                    .headers()
                    .require(Field::SellPrice, Collection::Inventory)?;
                self.inventory
                    .update_cell(sheet_row(position), column + 1, Value::from(sell_price))?;
                tracing::info!(
                    "Sell price of '{}' changed from {} to {}",
                    item,
                    current.sell_price,
                    sell_price
                );
            }
        }
        Ok(warnings)
    }

    /// Put back the stock taken by a deleted sale.
    pub fn reverse_sale(&mut self, item: &str, quantity: u32) -> Result<Vec<Warning>> {
        check_quantity(quantity)?;
        let inventory = Inventory::read(&*self.inventory)?;
        let mut warnings: Vec<Warning> = inventory.headers().warnings().collect();
        warnings.extend(self.adjust(&inventory, item, i64::from(quantity))?);
        Ok(warnings)
    }

    /// Remove the stock added by a deleted purchase. The item stays in the inventory
    /// even when its stock drops to zero.
    pub fn reverse_purchase(&mut self, item: &str, quantity: u32) -> Result<Vec<Warning>> {
        check_quantity(quantity)?;
        let inventory = Inventory::read(&*self.inventory)?;
        let mut warnings: Vec<Warning> = inventory.headers().warnings().collect();
        warnings.extend(self.adjust(&inventory, item, -i64::from(quantity))?);
        Ok(warnings)
    }

    /// Check that a sale of `quantity` units of `item` would be accepted, without writing
    /// anything.
    pub fn check_sale(&self, item: &str, quantity: u32) -> Result<()> {
        check_quantity(quantity)?;
        let inventory = Inventory::read(&*self.inventory)?;
        let (_, current) = inventory
            .find(item)
            .ok_or_else(|| Error::ItemNotFound(item.to_owned()))?;
        next_stock(self.config.stock_policy, current, -i64::from(quantity)).map(|_| ())
    }

    fn adjust(&mut self, inventory: &Inventory, item: &str, delta: i64) -> Result<Vec<Warning>> {
        let (position, current) = inventory
            .find(item)
            .ok_or_else(|| Error::ItemNotFound(item.to_owned()))?;
        let column = inventory
            .headers()
            .require(Field::Stock, Collection::Inventory)?;

        let (stock, warning) = next_stock(self.config.stock_policy, current, delta)?;
        self.inventory
            .update_cell(sheet_row(position), column + 1, Value::from(stock))?;
        tracing::info!("Stock of '{}' changed from {} to {}", item, current.stock, stock);

        Ok(warning.into_iter().collect())
    }
}

/// Stock after applying `delta`. The policy only applies to decreases that end below zero;
/// additions always land in full, even on a stock that is already negative.
fn next_stock(policy: StockPolicy, item: &Item, delta: i64) -> Result<(i64, Option<Warning>)> {
    let stock = item
        .stock
        .checked_add(delta)
        .ok_or(Error::Overflow { what: "stock" })?;
    if stock >= 0 || delta >= 0 {
        return Ok((stock, None));
    }

    match policy {
        StockPolicy::Clamp => {
            tracing::warn!(
                "Stock of '{}' would drop to {}, clamping to 0",
                item.name,
                stock
            );
            Ok((
                0,
                Some(Warning::NegativeStockAttempt {
                    item: item.name.clone(),
                    available: item.stock,
                    requested: -delta,
                }),
            ))
        }
        StockPolicy::Reject => Err(Error::InsufficientStock {
            item: item.name.clone(),
            available: item.stock,
            requested: -delta,
        }),
    }
}

pub(crate) fn check_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(Error::InvalidInput("quantity must be at least 1".into()));
    }
    Ok(())
}

pub(crate) fn check_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::InvalidInput(format!(
            "price must not be negative, got {price}"
        )));
    }
    Ok(())
}
