use std::{collections::HashMap, fmt::Display, hash::Hash};

use crate::error::AppError;

/// Maps each item to `table[id_of(item)]`, keeping input order.
///
/// Fails with [`AppError::MissingKey`] naming the first id that has no entry.
pub fn association_lookup<I, K, V, F>(
    items: &[I],
    table: &HashMap<K, V>,
    id_of: F,
) -> Result<Vec<V>, AppError>
where
    K: Eq + Hash + Display,
    V: Clone,
    F: Fn(&I) -> &K,
{
    items
        .iter()
        .map(|item| {
            let id = id_of(item);
            table
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::MissingKey(id.to_string()))
        })
        .collect()
}
