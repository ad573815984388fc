// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn exec_assigns_an_arithmetic_expression() {
    let mut ns = UserNamespace::new();
    let mut exec = ScriptExecutor::new();
    exec.exec("x=2+3", &mut ns).unwrap();
    assert_eq!(ns.get("x"), Some(&Value::from(5)));
}

#[test]
fn exec_references_prior_bindings() {
    let mut ns = UserNamespace::new();
    let mut exec = ScriptExecutor::new();
    exec.exec("x=2+3", &mut ns).unwrap();
    exec.exec("y=x*2", &mut ns).unwrap();
    assert_eq!(ns.get("y"), Some(&Value::from(10)));
}

#[test]
fn exec_raise_surfaces_ename_and_evalue() {
    let mut ns = UserNamespace::new();
    let mut exec = ScriptExecutor::new();
    let err = exec.exec("raise ValueError('bad')", &mut ns).unwrap_err();
    assert_eq!(err.ename, "ValueError");
    assert_eq!(err.evalue, "bad");
}

#[test]
fn exec_unknown_name_is_a_name_error() {
    let mut ns = UserNamespace::new();
    let mut exec = ScriptExecutor::new();
    let err = exec.exec("y=unknown_var", &mut ns).unwrap_err();
    assert_eq!(err.ename, "NameError");
}

#[test]
fn call_dispatches_to_a_registered_function() {
    let mut exec = ScriptExecutor::new();
    exec.register(
        "double",
        Arc::new(|args: &[Value], _kwargs: &HashMap<String, Value>| {
            let n = args[0].as_f64().unwrap_or(0.0);
            Ok(Value::from(n * 2.0))
        }),
    );
    let result = exec
        .call(&Value::from("double"), &[Value::from(21)], &HashMap::new())
        .unwrap();
    assert_eq!(result, Value::from(42.0));
}

#[test]
fn call_unregistered_name_is_a_name_error() {
    let exec = ScriptExecutor::new();
    let err = exec
        .call(&Value::from("missing"), &[], &HashMap::new())
        .unwrap_err();
    assert_eq!(err.ename, "NameError");
}
