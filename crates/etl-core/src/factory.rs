//! Table name → cleaner variant dispatch.
//!
//! The factory is built once from an explicit registration table and is
//! immutable afterwards. Lookups go through [`etl_model::table_key`], the same
//! normalization the schema registry uses, so `Order_Items`, `OrderItems` and
//! `order-items` resolve to the same entry. Unregistered tables are an error;
//! there is no passthrough fallback.

use std::collections::BTreeMap;
use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::{debug, info_span};

use etl_model::{ModelError, SchemaRegistry, TableKey};

use crate::cleaners::{CleanedTable, CleanerVariant, CleaningContext, KeyedRules, LifecycleRules};
use crate::error::{CleaningError, Result};

#[derive(Debug, Clone)]
struct Registration {
    name: String,
    variant: CleanerVariant,
}

#[derive(Debug, Clone)]
pub struct CleanerFactory {
    registry: Arc<SchemaRegistry>,
    variants: BTreeMap<TableKey, Registration>,
}

impl CleanerFactory {
    pub fn builder(registry: impl Into<Arc<SchemaRegistry>>) -> CleanerFactoryBuilder {
        CleanerFactoryBuilder {
            registry: registry.into(),
            entries: Vec::new(),
        }
    }

    /// Registrations for the nine Olist tables against [`SchemaRegistry::olist`].
    pub fn olist() -> Self {
        let mut variants = BTreeMap::new();
        let entries = [
            ("Customers", CleanerVariant::Keyed(KeyedRules::olist_customers())),
            ("Products", CleanerVariant::Keyed(KeyedRules::olist_products())),
            ("Orders", CleanerVariant::Lifecycle(LifecycleRules::olist_orders())),
            ("Geolocation", CleanerVariant::Generic),
            ("OrderItems", CleanerVariant::Generic),
            ("OrderPayments", CleanerVariant::Generic),
            ("OrderReviews", CleanerVariant::Generic),
            ("Sellers", CleanerVariant::Generic),
            ("ProductCategoryNameTranslation", CleanerVariant::Generic),
        ];
        for (name, variant) in entries {
            variants.insert(
                TableKey::new(name),
                Registration {
                    name: name.to_string(),
                    variant,
                },
            );
        }
        Self {
            registry: Arc::new(SchemaRegistry::olist()),
            variants,
        }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Variant registered for `table_name`, if any.
    pub fn resolve(&self, table_name: &str) -> Option<&CleanerVariant> {
        self.variants
            .get(&TableKey::new(table_name))
            .map(|registration| &registration.variant)
    }

    /// Registered table names with their variants, in key order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &CleanerVariant)> + '_ {
        self.variants
            .values()
            .map(|registration| (registration.name.as_str(), &registration.variant))
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Binds the variant for `table_name` to a private copy of `raw`.
    pub fn create(&self, table_name: &str, raw: &DataFrame) -> Result<Cleaner> {
        let variant = self
            .resolve(table_name)
            .ok_or_else(|| CleaningError::UnregisteredTable {
                table: table_name.to_string(),
            })?;
        Ok(Cleaner {
            table: table_name.to_string(),
            variant: variant.clone(),
            registry: Arc::clone(&self.registry),
            raw: raw.clone(),
            keep_rejected: true,
        })
    }
}

pub struct CleanerFactoryBuilder {
    registry: Arc<SchemaRegistry>,
    entries: Vec<(String, CleanerVariant)>,
}

impl CleanerFactoryBuilder {
    #[must_use]
    pub fn register(mut self, table_name: impl Into<String>, variant: CleanerVariant) -> Self {
        self.entries.push((table_name.into(), variant));
        self
    }

    pub fn build(self) -> Result<CleanerFactory> {
        let mut variants: BTreeMap<TableKey, Registration> = BTreeMap::new();
        for (name, variant) in self.entries {
            let key = TableKey::new(&name);
            if key.is_empty() {
                return Err(ModelError::EmptyTableName(name).into());
            }
            if let Some(existing) = variants.get(&key) {
                return Err(CleaningError::DuplicateRegistration {
                    table: name,
                    existing: existing.name.clone(),
                });
            }
            variants.insert(key, Registration { name, variant });
        }
        Ok(CleanerFactory {
            registry: self.registry,
            variants,
        })
    }
}

/// One table's cleaner, bound to its own copy of the raw data.
///
/// Cleaning works on further copies, so the raw frame stays untouched whether
/// cleaning succeeds or fails.
pub struct Cleaner {
    table: String,
    variant: CleanerVariant,
    registry: Arc<SchemaRegistry>,
    raw: DataFrame,
    keep_rejected: bool,
}

impl Cleaner {
    #[must_use]
    pub fn with_keep_rejected(mut self, keep: bool) -> Self {
        self.keep_rejected = keep;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn variant(&self) -> &CleanerVariant {
        &self.variant
    }

    pub fn raw(&self) -> &DataFrame {
        &self.raw
    }

    pub fn clean(&self) -> Result<CleanedTable> {
        let span = info_span!(
            "clean_table",
            table = %self.table,
            variant = self.variant.label()
        );
        span.in_scope(|| -> Result<CleanedTable> {
            let schema = self.registry.lookup(&self.table);
            if schema.is_none() {
                debug!(table = %self.table, "no schema registered, skipping type enforcement");
            }
            let ctx = CleaningContext {
                table: &self.table,
                schema,
                keep_rejected: self.keep_rejected,
            };
            let mut cleaned = self.variant.cleaner().clean(&ctx, self.raw.clone())?;
            cleaned.variant = self.variant.label().to_string();
            Ok(cleaned)
        })
    }
}
