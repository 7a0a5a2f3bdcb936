//! Combining per-page batches into one ordered collection
//!
//! Two distinct operations live here:
//! - `merge_batches` concatenates whole batches in the order they are given
//! - `coalesce_adjacent` folds immediately consecutive items that share a key
//!   into the item emitted just before them

use crate::scrape::record::{RawRecord, Record};
use std::collections::HashSet;

/// Concatenates batches in the supplied order
///
/// No deduplication happens across batches; each batch is expected to come
/// from a different result page.
pub fn merge_batches<I>(batches: I) -> Vec<Record>
where
    I: IntoIterator<Item = Vec<RawRecord>>,
{
    batches
        .into_iter()
        .flatten()
        .map(Record::from)
        .collect()
}

/// Drops repeated identities within one parse pass, keeping the first occurrence
pub fn dedup_by_identity(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            let first = seen.insert(record.key().to_string());
            if !first {
                tracing::debug!("Dropping repeated listing {}", record.url);
            }
            first
        })
        .collect()
}

/// Folds consecutive items with equal keys into the most recently emitted item
///
/// Only the immediately preceding emitted item is compared, so equal keys that
/// are separated by any other item stay separate.
///
/// # Arguments
///
/// * `items` - Raw items in page order
/// * `key` - Grouping key of an item
/// * `absorb` - Moves the secondary data of a duplicate into the emitted item
pub fn coalesce_adjacent<T, K, F, G>(
    items: impl IntoIterator<Item = T>,
    key: F,
    mut absorb: G,
) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
    G: FnMut(&mut T, T),
{
    struct Accumulator<T, K> {
        emitted: Vec<T>,
        last_key: Option<K>,
    }

    let start = Accumulator {
        emitted: Vec::new(),
        last_key: None,
    };

    items
        .into_iter()
        .fold(start, |mut acc, item| {
            let item_key = key(&item);
            let previous = if acc.last_key.as_ref() == Some(&item_key) {
                acc.emitted.last_mut()
            } else {
                None
            };

            match previous {
                Some(previous) => absorb(previous, item),
                None => {
                    acc.emitted.push(item);
                    acc.last_key = Some(item_key);
                }
            }
            acc
        })
        .emitted
}
