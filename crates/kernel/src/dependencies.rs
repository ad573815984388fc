// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `check_dependencies` (spec.md §4.2.9): consulted by a scheduler that
//! embeds this kernel's `apply_request` handler before routing work to it.
//! Out of scope per spec.md §1, the client's result store is modeled only
//! at its boundary: a status-only lookup by dependency id.

use serde_json::Value;

pub trait DependencyStore: Send + Sync {
    /// Whether `dep_id` has completed. `Err` models a store-level failure
    /// (e.g. the id is unknown to the store).
    fn is_completed(&self, dep_id: &str) -> Result<bool, ()>;
}

enum Quantifier {
    Any,
    All,
}

/// Parse `deps` as `[("any"|"all"), [id, ...]]`; any other shape defaults
/// to `"all"` over the ids found (spec.md §4.2.9).
fn parse(deps: &Value) -> (Quantifier, Vec<String>) {
    if let Some(arr) = deps.as_array() {
        if let [q, ids] = arr.as_slice() {
            if let (Some(q), Some(ids)) = (q.as_str(), ids.as_array()) {
                let quantifier = if q == "any" { Quantifier::Any } else { Quantifier::All };
                let ids = ids.iter().filter_map(|v| v.as_str().map(String::from)).collect();
                return (quantifier, ids);
            }
        }
        let ids = arr.iter().filter_map(|v| v.as_str().map(String::from)).collect();
        return (Quantifier::All, ids);
    }
    (Quantifier::All, Vec::new())
}

/// Evaluate whether `deps` are satisfied (spec.md §4.2.9).
pub fn check_dependencies(deps: &Value, store: &dyn DependencyStore) -> bool {
    let (quantifier, ids) = parse(deps);
    let mut statuses = Vec::with_capacity(ids.len());
    for id in &ids {
        match store.is_completed(id) {
            Ok(done) => statuses.push(done),
            Err(()) => return false,
        }
    }
    match quantifier {
        Quantifier::Any => statuses.iter().any(|&done| done),
        Quantifier::All => statuses.iter().all(|&done| done),
    }
}

#[cfg(test)]
#[path = "dependencies_tests.rs"]
mod tests;
