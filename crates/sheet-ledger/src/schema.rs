//! Mapping the headers a sheet happens to use onto the fields the ledger understands.

use crate::error::{Error, Warning};
use crate::{Collection, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Item,
    Quantity,
    SellPrice,
    BuyPrice,
    Total,
    Date,
    Stock,
}

/// Spellings of a per-unit price that do not say whether it is a buy or a sell price.
const UNIT_PRICE_SYNONYMS: &[&str] = &["price", "unitprice"];

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Item,
        Field::Quantity,
        Field::SellPrice,
        Field::BuyPrice,
        Field::Total,
        Field::Date,
        Field::Stock,
    ];

    /// The canonical header for this field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Item => "Item",
            Field::Quantity => "Quantity",
            Field::SellPrice => "Sell Price",
            Field::BuyPrice => "Buy Price",
            Field::Total => "Total",
            Field::Date => "Date",
            Field::Stock => "Stock",
        }
    }

    /// Folded spellings that always mean this field.
    fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Item => &["item", "itemname", "item_name"],
            Field::Quantity => &[
                "quantity",
                "qty",
                "units",
                "unitssold",
                "units_sold",
                "unitsbought",
                "units_bought",
            ],
            Field::SellPrice => &["sellprice", "sellingprice"],
            Field::BuyPrice => &["buyprice", "buyingprice", "cost", "costperunit"],
            Field::Total => &["total", "amount", "totalamount", "costtotal"],
            Field::Date => &["date", "dates", "transactiondate"],
            Field::Stock => &["stock"],
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase and drop all whitespace, so "Units Sold" and " unitssold" compare equal.
pub(crate) fn fold(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConflict {
    pub field: Field,
    pub kept: String,
    pub ignored: String,
}

/// One column of a sheet, as found in its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub raw: String,
    pub field: Option<Field>,
}

impl Column {
    /// The canonical name for mapped columns, the trimmed raw header otherwise.
    pub fn name(&self) -> &str {
        match self.field {
            Some(field) => field.name(),
            None => self.raw.trim(),
        }
    }
}

/// The result of normalizing a header row. Columns stay in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: Vec<Column>,
    conflicts: Vec<SchemaConflict>,
}

impl HeaderMap {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = Warning> + '_ {
        self.conflicts.iter().cloned().map(Warning::SchemaConflict)
    }

    /// 0-based index of the column mapped to `field`.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.field == Some(field))
    }

    /// Like [`position`](Self::position), but a missing column is an error.
    pub fn require(&self, field: Field, collection: Collection) -> Result<usize> {
        self.position(field)
            .ok_or(Error::MissingColumn { collection, field })
    }
}

/// Resolves raw headers to [`Field`]s.
#[derive(Debug, Clone, Copy)]
pub struct SchemaMapper {
    unit_price: Field,
}

impl Default for SchemaMapper {
    fn default() -> Self {
        SchemaMapper {
            unit_price: Field::SellPrice,
        }
    }
}

impl SchemaMapper {
    /// A bare "Price" column is the buy price in purchases and the sell price elsewhere.
    pub fn for_collection(collection: Collection) -> Self {
        let unit_price = match collection {
            Collection::Purchases => Field::BuyPrice,
            Collection::Inventory | Collection::Sales => Field::SellPrice,
        };
        SchemaMapper { unit_price }
    }

    pub fn resolve(&self, header: &str) -> Option<Field> {
        let folded = fold(header);
        if UNIT_PRICE_SYNONYMS.contains(&folded.as_str()) {
            return Some(self.unit_price);
        }
        Field::ALL
            .into_iter()
            .find(|field| field.synonyms().contains(&folded.as_str()))
    }

    /// Map every header to its field. The first column claiming a field keeps it; later
    /// ones are reported as conflicts and kept as unmapped columns.
    pub fn normalize<S: AsRef<str>>(&self, headers: &[S]) -> HeaderMap {
        if headers.is_empty() {
            tracing::debug!("Empty header row, nothing to normalize");
            return HeaderMap::default();
        }

        let mut map = HeaderMap::default();
        for header in headers {
            let raw = header.as_ref().trim().to_owned();
            let mut field = self.resolve(&raw);

            if let Some(resolved) = field
                && let Some(first) = map.columns.iter().find(|c| c.field == Some(resolved))
            {
                tracing::warn!(
                    "Columns '{}' and '{}' both map to '{}', keeping the first",
                    first.raw,
                    raw,
                    resolved
                );
                map.conflicts.push(SchemaConflict {
                    field: resolved,
                    kept: first.raw.clone(),
                    ignored: raw.clone(),
                });
                field = None;
            }

            map.columns.push(Column { raw, field });
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The header row with every mapped column renamed to its canonical name.
    fn canonical_headers(map: &HeaderMap) -> Vec<String> {
        map.columns()
            .iter()
            .map(|column| column.name().to_owned())
            .collect()
    }

    #[test]
    fn every_synonym_maps_to_its_field() {
        let mapper = SchemaMapper::default();
        for field in Field::ALL {
            for synonym in field.synonyms() {
                assert_eq!(mapper.resolve(synonym), Some(field), "{synonym}");
                assert_eq!(
                    mapper.resolve(&format!("  {}  ", synonym.to_uppercase())),
                    Some(field),
                    "{synonym}"
                );
            }
        }
    }

    #[test]
    fn casing_and_whitespace_are_ignored() {
        let mapper = SchemaMapper::default();
        assert_eq!(mapper.resolve("Units Sold"), Some(Field::Quantity));
        assert_eq!(mapper.resolve(" item NAME "), Some(Field::Item));
        assert_eq!(mapper.resolve("Cost Per Unit"), Some(Field::BuyPrice));
        assert_eq!(mapper.resolve("Transaction\tDate"), Some(Field::Date));
        assert_eq!(mapper.resolve("Item_Name"), Some(Field::Item));
    }

    #[test]
    fn bare_price_depends_on_collection() {
        let sales = SchemaMapper::for_collection(Collection::Sales);
        let purchases = SchemaMapper::for_collection(Collection::Purchases);
        assert_eq!(sales.resolve("Price"), Some(Field::SellPrice));
        assert_eq!(sales.resolve("Unit Price"), Some(Field::SellPrice));
        assert_eq!(purchases.resolve("Price"), Some(Field::BuyPrice));
        assert_eq!(purchases.resolve("Sell Price"), Some(Field::SellPrice));
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_headers() {
        for collection in Collection::ALL {
            let mapper = SchemaMapper::for_collection(collection);
            let once = mapper.normalize(collection.default_header());
            let canonical = canonical_headers(&once);
            let twice = mapper.normalize(&canonical);
            assert_eq!(canonical_headers(&twice), canonical);

            let fields = |map: &HeaderMap| map.columns().iter().map(|c| c.field).collect::<Vec<_>>();
            assert_eq!(fields(&once), fields(&twice));
        }

        let canonical: Vec<_> = Field::ALL.iter().map(|f| f.name()).collect();
        let map = SchemaMapper::default().normalize(&canonical);
        assert_eq!(canonical_headers(&map), canonical);
        assert_eq!(map.warnings().count(), 0);
    }

    #[test]
    fn unknown_headers_pass_through() {
        let map = SchemaMapper::default().normalize(&["Item Name", " Supplier ", "Stock"]);
        assert_eq!(canonical_headers(&map), vec!["Item", "Supplier", "Stock"]);
        assert_eq!(map.columns()[1].field, None);
        assert_eq!(map.position(Field::Stock), Some(2));
        assert_eq!(map.position(Field::Date), None);
    }

    #[test]
    fn duplicate_synonyms_keep_the_first() {
        let map = SchemaMapper::default().normalize(&["Date", "Qty", "Units Sold", "Price"]);

        assert_eq!(
            map.warnings().collect::<Vec<_>>(),
            vec![Warning::SchemaConflict(SchemaConflict {
                field: Field::Quantity,
                kept: "Qty".into(),
                ignored: "Units Sold".into(),
            })]
        );
        assert_eq!(map.position(Field::Quantity), Some(1));
        assert_eq!(map.columns()[2].field, None);
        assert_eq!(
            canonical_headers(&map),
            vec!["Date", "Quantity", "Units Sold", "Sell Price"]
        );
    }

    #[test]
    fn empty_header_row() {
        let map = SchemaMapper::default().normalize::<&str>(&[]);
        assert!(map.is_empty());
        assert!(matches!(
            map.require(Field::Item, Collection::Inventory),
            Err(Error::MissingColumn { field: Field::Item, .. })
        ));
    }
}
