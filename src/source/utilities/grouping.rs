//! Deterministic grouping helpers shared by pipeline stages.
//!
//! Groups are keyed in a `BTreeMap`, so iteration order depends only on the
//! keys. Per-group transforms are pure (`key, values -> output`), which lets
//! them run sequentially or on the rayon pool with identical results.

use std::collections::BTreeMap;

use rayon::prelude::*;

/// Bucket `items` by `key`, preserving input order inside each bucket.
pub fn group_by_key<T, K, I, F>(items: I, key: F) -> BTreeMap<K, Vec<T>>
where
    I: IntoIterator<Item = T>,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(&item)).or_default().push(item);
    }
    groups
}

/// Apply `transform` to every group and return the results under the same keys.
///
/// With `parallel` set, groups are processed on the rayon pool. Groups share
/// no state, so the output is the same either way.
pub fn transform_groups<K, V, U, F>(
    groups: BTreeMap<K, V>,
    parallel: bool,
    transform: F,
) -> BTreeMap<K, U>
where
    K: Ord + Send,
    V: Send,
    U: Send,
    F: Fn(&K, V) -> U + Sync + Send,
{
    if parallel {
        groups
            .into_par_iter()
            .map(|(key, values)| {
                let output = transform(&key, values);
                (key, output)
            })
            .collect()
    } else {
        groups
            .into_iter()
            .map(|(key, values)| {
                let output = transform(&key, values);
                (key, output)
            })
            .collect()
    }
}
