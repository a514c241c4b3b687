//! Raw table discovery.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{IngestError, Result};

/// A CSV file and the table name derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTable {
    pub name: String,
    pub path: PathBuf,
}

/// Lists all CSV files in a directory, sorted by file name.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Finds the CSV exports in `dir` and names each one after its file.
pub fn discover_tables(dir: &Path) -> Result<Vec<DiscoveredTable>> {
    let tables = list_csv_files(dir)?
        .into_iter()
        .filter_map(|path| {
            let name = table_name_from_stem(path.file_stem()?.to_str()?);
            if name.is_empty() {
                warn!(path = %path.display(), "cannot derive a table name, skipping");
                return None;
            }
            Some(DiscoveredTable { name, path })
        })
        .collect();
    Ok(tables)
}

/// `olist_order_items_dataset` → `order_items`.
pub fn table_name_from_stem(stem: &str) -> String {
    let trimmed = stem.trim();
    let without_prefix = strip_prefix_ignore_case(trimmed, "olist_");
    strip_suffix_ignore_case(without_prefix, "_dataset").to_string()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &value[prefix.len()..],
        _ => value,
    }
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> &'a str {
    let Some(split) = value.len().checked_sub(suffix.len()) else {
        return value;
    };
    match value.get(split..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &value[..split],
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_export_prefix_and_suffix() {
        assert_eq!(table_name_from_stem("olist_orders_dataset"), "orders");
        assert_eq!(table_name_from_stem("olist_order_items_dataset"), "order_items");
        assert_eq!(
            table_name_from_stem("product_category_name_translation"),
            "product_category_name_translation"
        );
        assert_eq!(table_name_from_stem("OLIST_Sellers_Dataset"), "Sellers");
        assert_eq!(table_name_from_stem("_dataset"), "");
    }
}
