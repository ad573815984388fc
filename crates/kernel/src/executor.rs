// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Executor` collaborator: compiles and runs `execute_request` source,
//! and invokes the callable named in an `apply_request` (spec.md §4.2.2,
//! §4.2.3, §9 "`eval`-based apply").
//!
//! The source compiles and `eval`s arbitrary host-language code and passes
//! a deserialized callable straight to `eval`. Neither indirection applies
//! here: user code is not eval'd in a systems language. `ScriptExecutor`
//! below is a minimal expression/assignment language standing in for
//! "compile and exec", and `apply` dispatches by name into a
//! [`FunctionRegistry`] instead of invoking a deserialized closure, per the
//! design note's guidance to "call the deserialized callable directly".

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ExecError;

pub type UserNamespace = HashMap<String, Value>;

/// A registered callable, looked up by name from an `apply_request`'s
/// deserialized `f` (spec.md §4.2.3 step 3-4).
pub type UserFn = Arc<dyn Fn(&[Value], &HashMap<String, Value>) -> Result<Value, ExecError> + Send + Sync>;

pub trait Executor: Send {
    /// Compile and run `code` against `ns`, used as both globals and locals
    /// (spec.md §4.2.2 steps 3-4).
    fn exec(&mut self, code: &str, ns: &mut UserNamespace) -> Result<(), ExecError>;

    /// Invoke the callable named by `f` with `args`/`kwargs`
    /// (spec.md §4.2.3 step 4).
    fn call(&self, f: &Value, args: &[Value], kwargs: &HashMap<String, Value>) -> Result<Value, ExecError>;
}

/// A small assignment/arithmetic/raise language sufficient to drive the
/// `execute_request` scenarios this core is tested against (spec.md §8 S1,
/// S2): `name = <number|name> (op <number|name>)*` and
/// `raise Ident("message")`. Statements are separated by `;` or newlines.
#[derive(Default)]
pub struct ScriptExecutor {
    functions: HashMap<String, UserFn>,
}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, f: UserFn) {
        self.functions.insert(name.into(), f);
    }

    fn eval_expr(expr: &str, ns: &UserNamespace) -> Result<Value, ExecError> {
        let expr = expr.trim();
        let mut tokens = tokenize_expr(expr);
        let mut acc = Self::resolve_operand(&tokens.remove(0), ns)?;
        while tokens.len() >= 2 {
            let op = tokens.remove(0);
            let rhs = Self::resolve_operand(&tokens.remove(0), ns)?;
            acc = apply_op(&op, acc, rhs)?;
        }
        Ok(acc)
    }

    fn resolve_operand(tok: &str, ns: &UserNamespace) -> Result<Value, ExecError> {
        if let Ok(i) = tok.parse::<i64>() {
            return Ok(Value::from(i));
        }
        if let Ok(f) = tok.parse::<f64>() {
            return Ok(Value::from(f));
        }
        if let Some(s) = tok.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return Ok(Value::from(s));
        }
        if let Some(s) = tok.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return Ok(Value::from(s));
        }
        ns.get(tok)
            .cloned()
            .ok_or_else(|| ExecError::new("NameError", format!("name '{tok}' is not defined")))
    }
}

fn tokenize_expr(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in expr.chars() {
        if "+-*/".contains(ch) && !current.trim().is_empty() {
            tokens.push(current.trim().to_string());
            tokens.push(ch.to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    tokens
}

fn apply_op(op: &str, lhs: Value, rhs: Value) -> Result<Value, ExecError> {
    let (Some(a), Some(b)) = (as_f64(&lhs), as_f64(&rhs)) else {
        return Err(ExecError::new("TypeError", "unsupported operand type(s)"));
    };
    let result = match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" => a / b,
        _ => return Err(ExecError::new("SyntaxError", format!("unknown operator {op}"))),
    };
    if a.fract() == 0.0 && b.fract() == 0.0 && op != "/" {
        Ok(Value::from(result as i64))
    } else {
        Ok(Value::from(result))
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
}

/// `raise Ident("message")` or `raise Ident('message')`.
fn parse_raise(stmt: &str) -> Option<ExecError> {
    let rest = stmt.strip_prefix("raise ")?.trim();
    let (ename, rest) = rest.split_once('(')?;
    let arg = rest.strip_suffix(')')?.trim();
    let evalue = arg
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| arg.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(arg);
    Some(ExecError::new(ename.trim(), evalue))
}

impl Executor for ScriptExecutor {
    fn exec(&mut self, code: &str, ns: &mut UserNamespace) -> Result<(), ExecError> {
        for stmt in code.split(['\n', ';']) {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            if let Some(err) = parse_raise(stmt) {
                return Err(err);
            }
            let Some((name, expr)) = stmt.split_once('=') else {
                return Err(ExecError::new(
                    "SyntaxError",
                    format!("cannot execute statement: {stmt}"),
                ));
            };
            let value = Self::eval_expr(expr, ns)?;
            ns.insert(name.trim().to_string(), value);
        }
        Ok(())
    }

    fn call(&self, f: &Value, args: &[Value], kwargs: &HashMap<String, Value>) -> Result<Value, ExecError> {
        let name = f
            .as_str()
            .ok_or_else(|| ExecError::new("TypeError", "f is not callable"))?;
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| ExecError::new("NameError", format!("function '{name}' is not registered")))?;
        func(args, kwargs)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
