//! Aggregate figures for the dashboard.

use crate::book::Transaction;
use crate::error::Error;
use crate::inventory::Item;
use crate::{Decimal, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSales {
    pub item: String,
    pub units: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Units sold valued at the current inventory sell price.
    pub revenue: Decimal,
    /// Units sold valued at the current inventory buy price.
    pub cost: Decimal,
    pub profit: Decimal,
    /// Sum of the totals recorded with each sale.
    pub recorded_revenue: Decimal,
    pub sales_count: usize,
    pub units_sold: i64,
    /// Units sold per item, best sellers first.
    pub most_sold: Vec<ItemSales>,
    /// Items that were sold but are not in the inventory, so have no prices.
    pub unknown_items: Vec<String>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.sales_count == 0
    }
}

pub fn summarize(inventory: &[Item], sales: &[Transaction]) -> Result<Summary> {
    // reversed so the first row wins when a name appears twice
    let prices: BTreeMap<&str, &Item> = inventory
        .iter()
        .rev()
        .map(|item| (item.name.as_str(), item))
        .collect();

    let mut summary = Summary::default();
    let mut units: BTreeMap<&str, i64> = BTreeMap::new();
    let mut unknown: BTreeSet<&str> = BTreeSet::new();

    for sale in sales {
        summary.sales_count += 1;
        summary.units_sold = summary
            .units_sold
            .checked_add(sale.quantity)
            .ok_or(Error::Overflow { what: "units sold" })?;
        summary.recorded_revenue = sale
            .total()
            .and_then(|total| summary.recorded_revenue.checked_add(total))
            .ok_or(Error::Overflow {
                what: "recorded revenue",
            })?;
        let sold = units.entry(sale.item.as_str()).or_default();
        *sold = sold
            .checked_add(sale.quantity)
            .ok_or(Error::Overflow { what: "units sold" })?;

        match prices.get(sale.item.as_str()) {
            Some(item) => {
                let quantity = Decimal::from(sale.quantity);
                summary.revenue = add_product(summary.revenue, quantity, item.sell_price)
                    .ok_or(Error::Overflow {
                        what: "total revenue",
                    })?;
                summary.cost = add_product(summary.cost, quantity, item.buy_price)
                    .ok_or(Error::Overflow { what: "total cost" })?;
            }
            None => {
                unknown.insert(sale.item.as_str());
            }
        }
    }

    summary.profit = summary
        .revenue
        .checked_sub(summary.cost)
        .ok_or(Error::Overflow {
            what: "total profit",
        })?;
    summary.most_sold = units
        .into_iter()
        .map(|(item, units)| ItemSales {
            item: item.to_owned(),
            units,
        })
        .collect();
    // stable sort keeps the alphabetical order among ties
    summary.most_sold.sort_by(|a, b| b.units.cmp(&a.units));
    summary.unknown_items = unknown.into_iter().map(str::to_owned).collect();
    Ok(summary)
}

/// `sum + quantity × price`, or `None` on overflow.
fn add_product(sum: Decimal, quantity: Decimal, price: Decimal) -> Option<Decimal> {
    sum.checked_add(quantity.checked_mul(price)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn item(name: &str, buy: &str, sell: &str) -> Item {
        Item {
            name: name.into(),
            buy_price: dec(buy),
            sell_price: dec(sell),
            stock: 0,
        }
    }

    fn sale(item: &str, quantity: i64, price: &str) -> Transaction {
        Transaction {
            position: 0,
            date: "2025-01-01".into(),
            item: item.into(),
            quantity,
            price: dec(price),
            total: None,
        }
    }

    #[test]
    fn no_sales() {
        let summary = summarize(&[item("Pen", "5", "8")], &[]).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn figures_use_inventory_prices() {
        let inventory = [item("Pen", "5", "8"), item("Ink", "2", "3.5")];
        let sales = [sale("Pen", 2, "9"), sale("Ink", 4, "3"), sale("Pen", 1, "8")];
        let summary = summarize(&inventory, &sales).unwrap();

        assert_eq!(summary.revenue, dec("38"));
        assert_eq!(summary.cost, dec("23"));
        assert_eq!(summary.profit, dec("15"));
        assert_eq!(summary.recorded_revenue, dec("38"));
        assert_eq!(summary.units_sold, 7);
        assert_eq!(
            summary.most_sold,
            vec![
                ItemSales {
                    item: "Ink".into(),
                    units: 4
                },
                ItemSales {
                    item: "Pen".into(),
                    units: 3
                },
            ]
        );
    }

    #[test]
    fn unknown_items_count_units_only() {
        let inventory = [item("Pen", "5", "8")];
        let mut stapler = sale("Stapler", 2, "4");
        stapler.total = Some(dec("8"));
        let summary = summarize(&inventory, &[sale("Pen", 1, "8"), stapler]).unwrap();

        assert_eq!(summary.revenue, dec("8"));
        assert_eq!(summary.recorded_revenue, dec("16"));
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.unknown_items, vec!["Stapler"]);
    }

    #[test]
    fn ties_are_ordered_by_name() {
        let sales = [sale("Pen", 1, "1"), sale("Ink", 1, "1"), sale("Tape", 2, "1")];
        let summary = summarize(&[], &sales).unwrap();
        let order: Vec<_> = summary.most_sold.iter().map(|s| s.item.as_str()).collect();
        assert_eq!(order, vec!["Tape", "Ink", "Pen"]);
    }

    #[test]
    fn oversized_totals_are_an_error() {
        let inventory = [item("Pen", "5", &Decimal::MAX.to_string())];
        let sales = [sale("Pen", 2, "8")];
        assert!(matches!(
            summarize(&inventory, &sales),
            Err(Error::Overflow {
                what: "total revenue"
            })
        ));

        let sales = [sale("Ink", 2, &Decimal::MAX.to_string())];
        assert!(matches!(
            summarize(&[], &sales),
            Err(Error::Overflow {
                what: "recorded revenue"
            })
        ));
    }
}
