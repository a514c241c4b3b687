//! Table-name normalization.
//!
//! Table names arrive from file names, configuration and callers with
//! inconsistent spelling (`Order_Items`, `OrderItems`, `order-items`). Every
//! table lookup in the workspace goes through [`table_key`], so the registry
//! and the cleaner factory always agree on which names are the same table.

use std::fmt;

/// Normalized lookup key for a table name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey(String);

impl TableKey {
    pub fn new(name: &str) -> Self {
        Self(table_key(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lower-cased ASCII alphanumerics of `name`; everything else is dropped.
pub fn table_key(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spellings_collapse_to_one_key() {
        assert_eq!(table_key("Order_Items"), "orderitems");
        assert_eq!(table_key("OrderItems"), "orderitems");
        assert_eq!(table_key(" order-items "), "orderitems");
        assert_eq!(
            table_key("Product_Category_Name_Translation"),
            table_key("ProductCategoryNameTranslation")
        );
    }

    #[test]
    fn distinct_tables_stay_distinct() {
        assert_ne!(TableKey::new("Orders"), TableKey::new("Order_Items"));
        assert!(TableKey::new("__").is_empty());
    }
}
