// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-kernel: the single-threaded message-driven engine dispatch core
//! (spec.md §4.2 `EngineKernel`).

pub mod completer;
pub mod content;
pub mod dependencies;
pub mod error;
pub mod executor;
pub mod kernel;

pub use completer::{Completer, NamespaceCompleter};
pub use dependencies::{check_dependencies, DependencyStore};
pub use error::{ExecError, KernelError};
pub use executor::{Executor, ScriptExecutor, UserFn, UserNamespace};
pub use kernel::EngineKernel;
