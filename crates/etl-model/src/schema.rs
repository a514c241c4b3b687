//! Per-table column contracts and the registry that holds them.
//!
//! The registry is built once, before any table is cleaned, and is shared
//! read-only (usually behind an `Arc`) by every cleaner in a run. A table
//! without an entry is cleaned without type enforcement; that is different
//! from a table whose entry declares zero columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::logical_type::LogicalType;
use crate::lookup::TableKey;

/// Column contract for one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    columns: Vec<(String, LogicalType)>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Build a schema from `(column, type)` pairs, rejecting repeated columns.
    pub fn from_columns<I, S>(name: impl Into<String>, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, LogicalType)>,
        S: Into<String>,
    {
        let mut schema = Self::new(name);
        for (column, logical_type) in columns {
            let column = column.into();
            if schema.logical_type(&column).is_some() {
                return Err(ModelError::DuplicateColumn {
                    table: schema.name,
                    column,
                });
            }
            schema.columns.push((column, logical_type));
        }
        Ok(schema)
    }

    /// Declare a column. Redeclaring a column replaces its type in place.
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>, logical_type: LogicalType) -> Self {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = logical_type,
            None => self.columns.push((column, logical_type)),
        }
        self
    }

    /// Declared type of `column`. Column names are matched exactly.
    pub fn logical_type(&self, column: &str) -> Option<LogicalType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, logical_type)| *logical_type)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, LogicalType)> + '_ {
        self.columns
            .iter()
            .map(|(name, logical_type)| (name.as_str(), *logical_type))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Immutable table-name → schema mapping.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<TableKey, TableSchema>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    /// Schema for `table_name`, matched through [`crate::table_key`].
    pub fn lookup(&self, table_name: &str) -> Option<&TableSchema> {
        self.tables.get(&TableKey::new(table_name))
    }

    pub fn contains(&self, table_name: &str) -> bool {
        self.lookup(table_name).is_some()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> + '_ {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Contracts for the nine tables of the Olist e-commerce export.
    pub fn olist() -> Self {
        use LogicalType::{Category, Float64, Int64, NullableInt64, Text, Timestamp};

        let tables = [
            TableSchema::new("Orders")
                .with_column("order_id", Text)
                .with_column("customer_id", Text)
                .with_column("order_status", Category)
                .with_column("order_purchase_timestamp", Timestamp)
                .with_column("order_approved_at", Timestamp)
                .with_column("order_delivered_carrier_date", Timestamp)
                .with_column("order_delivered_customer_date", Timestamp)
                .with_column("order_estimated_delivery_date", Timestamp),
            TableSchema::new("Customers")
                .with_column("customer_id", Text)
                .with_column("customer_unique_id", Text)
                .with_column("customer_zip_code_prefix", Int64)
                .with_column("customer_city", Text)
                .with_column("customer_state", Text)
                .with_column("created_at", Timestamp),
            TableSchema::new("Products")
                .with_column("product_id", Text)
                .with_column("product_category_name", Text)
                .with_column("product_name_length", NullableInt64)
                .with_column("product_description_length", NullableInt64)
                .with_column("product_photos_qty", NullableInt64)
                .with_column("product_weight_g", NullableInt64)
                .with_column("product_length_cm", NullableInt64)
                .with_column("product_height_cm", NullableInt64)
                .with_column("product_width_cm", NullableInt64),
            TableSchema::new("Sellers")
                .with_column("seller_id", Text)
                .with_column("seller_zip_code_prefix", NullableInt64)
                .with_column("seller_city", Text)
                .with_column("seller_state", Text),
            TableSchema::new("OrderItems")
                .with_column("order_id", Text)
                .with_column("order_item_id", Int64)
                .with_column("product_id", Text)
                .with_column("seller_id", Text)
                .with_column("shipping_limit_date", Timestamp)
                .with_column("price", Float64)
                .with_column("freight_value", Float64),
            TableSchema::new("OrderPayments")
                .with_column("order_id", Text)
                .with_column("payment_sequential", Int64)
                .with_column("payment_type", Text)
                .with_column("payment_installments", Int64)
                .with_column("payment_value", Float64),
            TableSchema::new("OrderReviews")
                .with_column("review_id", Text)
                .with_column("order_id", Text)
                .with_column("review_score", Int64)
                .with_column("review_comment_title", Text)
                .with_column("review_comment_message", Text)
                .with_column("review_creation_date", Timestamp)
                .with_column("review_answer_timestamp", Timestamp),
            TableSchema::new("Geolocation")
                .with_column("geolocation_zip_code_prefix", Int64)
                .with_column("geolocation_lat", Float64)
                .with_column("geolocation_lng", Float64)
                .with_column("geolocation_city", Text)
                .with_column("geolocation_state", Text),
            TableSchema::new("ProductCategoryNameTranslation")
                .with_column("product_category_name", Text)
                .with_column("product_category_name_english", Text),
        ];

        let mut registry = Self::default();
        for schema in tables {
            registry.tables.insert(TableKey::new(&schema.name), schema);
        }
        registry
    }
}

/// Collects schemas and checks that no two names normalize to the same key.
#[derive(Debug, Default)]
pub struct SchemaRegistryBuilder {
    tables: Vec<TableSchema>,
}

impl SchemaRegistryBuilder {
    #[must_use]
    pub fn table(mut self, schema: TableSchema) -> Self {
        self.tables.push(schema);
        self
    }

    pub fn build(self) -> Result<SchemaRegistry> {
        let mut tables: BTreeMap<TableKey, TableSchema> = BTreeMap::new();
        for schema in self.tables {
            let key = TableKey::new(&schema.name);
            if key.is_empty() {
                return Err(ModelError::EmptyTableName(schema.name));
            }
            if let Some(existing) = tables.get(&key) {
                return Err(ModelError::DuplicateTable {
                    table: schema.name,
                    existing: existing.name.clone(),
                });
            }
            tables.insert(key, schema);
        }
        Ok(SchemaRegistry { tables })
    }
}
