// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::*;
use serde_json::json;

struct FakeStore(HashMap<&'static str, bool>);

impl DependencyStore for FakeStore {
    fn is_completed(&self, dep_id: &str) -> Result<bool, ()> {
        self.0.get(dep_id).copied().ok_or(())
    }
}

#[test]
fn all_quantifier_requires_every_dependency_done() {
    let store = FakeStore(HashMap::from([("a", true), ("b", false)]));
    assert!(!check_dependencies(&json!(["all", ["a", "b"]]), &store));

    let store = FakeStore(HashMap::from([("a", true), ("b", true)]));
    assert!(check_dependencies(&json!(["all", ["a", "b"]]), &store));
}

#[test]
fn any_quantifier_requires_one_dependency_done() {
    let store = FakeStore(HashMap::from([("a", false), ("b", false)]));
    assert!(!check_dependencies(&json!(["any", ["a", "b"]]), &store));

    let store = FakeStore(HashMap::from([("a", false), ("b", true)]));
    assert!(check_dependencies(&json!(["any", ["a", "b"]]), &store));
}

#[test]
fn unrecognized_shape_defaults_to_all_over_ids() {
    let store = FakeStore(HashMap::from([("a", true)]));
    assert!(check_dependencies(&json!(["a"]), &store));
}

#[test]
fn store_error_makes_dependencies_unmet() {
    let store = FakeStore(HashMap::new());
    assert!(!check_dependencies(&json!(["all", ["missing"]]), &store));
}

#[test]
fn empty_dependency_list_is_vacuously_true_under_all() {
    let store = FakeStore(HashMap::new());
    assert!(check_dependencies(&json!(["all", []]), &store));
}
