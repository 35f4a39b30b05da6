//! Finding the record a delete request refers to.

use crate::schema::{Field, HeaderMap};
use crate::store::{Record, Table};

/// Expected values per field. Empty expectations match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    entries: Vec<(Field, String)>,
}

impl Criteria {
    pub fn new() -> Self {
        Criteria::default()
    }

    pub fn with(mut self, field: Field, expected: impl ToString) -> Self {
        self.entries.push((field, expected.to_string()));
        self
    }

    /// Like [`with`](Self::with), skipping `None`.
    pub fn with_opt(self, field: Field, expected: Option<impl ToString>) -> Self {
        match expected {
            Some(expected) => self.with(field, expected),
            None => self,
        }
    }

    /// True when no criterion would restrict the match.
    pub fn is_empty(&self) -> bool {
        self.active().next().is_none()
    }

    fn active(&self) -> impl Iterator<Item = (Field, &str)> {
        self.entries
            .iter()
            .map(|(field, expected)| (*field, expected.trim()))
            .filter(|(_, expected)| !expected.is_empty())
    }

    fn matches(&self, headers: &HeaderMap, record: &Record<'_>) -> bool {
        self.active().all(|(field, expected)| {
            headers
                .position(field)
                .is_some_and(|column| record.get(column).to_string().trim() == expected)
        })
    }
}

/// Position of the first record matching every criterion.
pub fn locate(table: &Table, headers: &HeaderMap, criteria: &Criteria) -> Option<usize> {
    table
        .records()
        .find(|record| criteria.matches(headers, record))
        .map(|record| record.position())
}

/// Positions of all matching records, in sheet order.
pub fn locate_all(table: &Table, headers: &HeaderMap, criteria: &Criteria) -> Vec<usize> {
    table
        .records()
        .filter(|record| criteria.matches(headers, record))
        .map(|record| record.position())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Collection;
    use crate::schema::SchemaMapper;
    use crate::store::{MemoryStore, RecordStore};

    fn sales() -> (Table, HeaderMap) {
        let table = MemoryStore::new(&["Date", "Item Name", "Units Sold", "Price"])
            .with_row(&["2025-01-01", "Pen", "3", "8"])
            .with_row(&["2025-01-02", "Ink", "1", "3"])
            .with_row(&["2025-01-02", " Pen ", "3", "8"])
            .with_row(&["2025-01-03", "Pen", "3", "8"])
            .get_all_records()
            .unwrap();
        let headers = SchemaMapper::for_collection(Collection::Sales).normalize(table.header());
        (table, headers)
    }

    #[test]
    fn first_match_wins() {
        let (table, headers) = sales();
        let criteria = Criteria::new().with(Field::Item, "Pen").with(Field::Quantity, 3);

        assert_eq!(locate(&table, &headers, &criteria), Some(0));
        assert_eq!(locate_all(&table, &headers, &criteria), vec![0, 2, 3]);
    }

    #[test]
    fn values_are_compared_trimmed() {
        let (table, headers) = sales();
        let criteria = Criteria::new()
            .with(Field::Date, "2025-01-02 ")
            .with(Field::Item, "Pen");

        assert_eq!(locate(&table, &headers, &criteria), Some(2));
    }

    #[test]
    fn empty_criteria_are_ignored() {
        let (table, headers) = sales();
        let criteria = Criteria::new()
            .with(Field::Date, "")
            .with(Field::Item, "Ink")
            .with_opt(Field::Quantity, None::<u32>);

        assert!(!criteria.is_empty());
        assert_eq!(locate(&table, &headers, &criteria), Some(1));
        assert!(Criteria::new().with(Field::Item, "  ").is_empty());
    }

    #[test]
    fn no_match() {
        let (table, headers) = sales();
        let criteria = Criteria::new().with(Field::Item, "Pen").with(Field::Quantity, 2);
        assert_eq!(locate(&table, &headers, &criteria), None);
        assert!(locate_all(&table, &headers, &criteria).is_empty());
    }

    #[test]
    fn criterion_on_missing_column_never_matches() {
        let (table, headers) = sales();
        let criteria = Criteria::new().with(Field::Stock, 3);
        assert_eq!(locate(&table, &headers, &criteria), None);
    }
}
