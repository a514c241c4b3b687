//! Stable, keep-first row deduplication.

use std::collections::HashSet;

use polars::prelude::DataFrame;

use crate::error::Result;
use crate::frame_utils::{filter_rows, has_column, text_values};

/// Removes rows that repeat an earlier row in every column.
///
/// Cells are compared by their text rendering; a null never equals an empty
/// string. Returns the deduplicated frame and the number of rows removed.
pub fn dedupe_exact(df: &DataFrame) -> Result<(DataFrame, usize)> {
    dedupe_by_keys::<&str>(df, &[])
}

/// Removes rows whose key columns repeat an earlier row's.
///
/// Key columns missing from the frame are ignored; when none are present the
/// frame is deduplicated on whole rows instead.
pub fn dedupe_by_keys<S: AsRef<str>>(df: &DataFrame, keys: &[S]) -> Result<(DataFrame, usize)> {
    let (deduped, source_rows) = dedupe_tracked(df, keys)?;
    Ok((deduped, df.height() - source_rows.len()))
}

/// Same as [`dedupe_by_keys`], but returns the input position of every kept
/// row instead of the removed count.
pub fn dedupe_tracked<S: AsRef<str>>(
    df: &DataFrame,
    keys: &[S],
) -> Result<(DataFrame, Vec<usize>)> {
    let columns = dedupe_columns(df, keys);
    let keep = keep_mask(df, &columns)?;
    let source_rows: Vec<usize> = keep
        .iter()
        .enumerate()
        .filter_map(|(idx, kept)| kept.then_some(idx))
        .collect();
    if source_rows.len() == df.height() {
        return Ok((df.clone(), source_rows));
    }
    Ok((filter_rows(df, &keep)?, source_rows))
}

fn dedupe_columns<S: AsRef<str>>(df: &DataFrame, keys: &[S]) -> Vec<String> {
    let present: Vec<String> = keys
        .iter()
        .map(|key| key.as_ref())
        .filter(|key| has_column(df, key))
        .map(str::to_string)
        .collect();
    if !present.is_empty() {
        return present;
    }
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn keep_mask(df: &DataFrame, columns: &[String]) -> Result<Vec<bool>> {
    if df.height() < 2 || columns.is_empty() {
        return Ok(vec![true; df.height()]);
    }
    let mut key_columns = Vec::with_capacity(columns.len());
    for name in columns {
        key_columns.push(text_values(df, name)?);
    }
    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(df.height());
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key: Vec<Option<&str>> = key_columns
            .iter()
            .map(|values| values[idx].as_deref())
            .collect();
        keep.push(seen.insert(key));
    }
    Ok(keep)
}
