//! `findTransactions`: union within a predicate list, intersection across
//! lists.

use crate::domain::error::{ApiError, ApiResult};
use crate::domain::requests::FindTransactionsParams;
use std::collections::HashSet;
use tangle_storage::{GraphStore, Pointer};
use tangle_types::{Hash, Tag};
use tracing::debug;

pub struct IndexSearch<'a> {
    store: &'a dyn GraphStore,
}

fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    list.as_deref().filter(|l| !l.is_empty())
}

impl<'a> IndexSearch<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    /// Hashes matching every supplied list whose lookup found something.
    /// No lists, no results.
    pub fn find(&self, query: &FindTransactionsParams) -> ApiResult<Vec<Hash>> {
        // Reject bad tags before touching any index.
        let tags = match non_empty(&query.tags) {
            Some(raw) => Some(
                raw.iter()
                    .map(|t| Tag::padded(t))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ApiError::invalid_parameter(format!("tags: {}", e)))?,
            ),
            None => None,
        };

        let mut sets: Vec<HashSet<Pointer>> = Vec::with_capacity(4);
        if let Some(bundles) = non_empty(&query.bundles) {
            sets.push(self.collect(bundles, |h| self.store.bundle_pointers(h)));
        }
        if let Some(addresses) = non_empty(&query.addresses) {
            sets.push(self.collect(addresses, |h| self.store.address_pointers(h)));
        }
        if let Some(tags) = &tags {
            sets.push(self.collect(tags, |t| self.store.tag_pointers(t)));
        }
        if let Some(approvees) = non_empty(&query.approvees) {
            sets.push(self.collect(approvees, |h| self.store.approvers_of(h)));
        }

        // A list that matched nothing does not narrow the result.
        sets.retain(|s| !s.is_empty());
        sets.sort_by_key(HashSet::len);
        let mut sets = sets.into_iter();
        let Some(mut result) = sets.next() else {
            return Ok(Vec::new());
        };
        for other in sets {
            result.retain(|p| other.contains(p));
        }

        let mut pointers: Vec<Pointer> = result.into_iter().collect();
        pointers.sort_unstable();
        let mut hashes = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            hashes.push(self.store.load(pointer)?.hash);
        }
        debug!(matches = hashes.len(), "findTransactions");
        Ok(hashes)
    }

    fn collect<K>(&self, keys: &[K], lookup: impl Fn(&K) -> Vec<Pointer>) -> HashSet<Pointer> {
        keys.iter().flat_map(lookup).collect()
    }
}
