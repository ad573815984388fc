// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn start_then_stop_transitions_forward_only() {
    let mut core = LauncherCore::new();
    assert_eq!(core.state(), LauncherState::Before);
    assert!(core.notify_start(StartData::Pid(1)));
    assert_eq!(core.state(), LauncherState::Running);
    core.notify_stop(StopData::Local {
        exit_code: Some(0),
        pid: Some(1),
    });
    assert_eq!(core.state(), LauncherState::After);
}

#[test]
fn notify_start_outside_before_fails() {
    let mut core = LauncherCore::new();
    assert!(core.notify_start(StartData::Pid(1)));
    assert!(!core.notify_start(StartData::Pid(2)));
    assert_eq!(core.state(), LauncherState::Running);
}

#[test]
fn notify_stop_is_idempotent_and_does_not_refire_callbacks() {
    let mut core = LauncherCore::new();
    assert!(core.notify_start(StartData::Pid(1)));
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    core.on_stop(Box::new(move |_| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    }));
    core.notify_stop(StopData::Local {
        exit_code: Some(0),
        pid: Some(1),
    });
    core.notify_stop(StopData::Local {
        exit_code: Some(1),
        pid: Some(1),
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn on_stop_registered_after_after_fires_immediately_inline() {
    let mut core = LauncherCore::new();
    core.notify_start(StartData::Pid(1));
    core.notify_stop(StopData::Local {
        exit_code: Some(0),
        pid: Some(1),
    });
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();
    core.on_stop(Box::new(move |_| {
        calls_clone.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn callbacks_fire_in_registration_order() {
    let mut core = LauncherCore::new();
    core.notify_start(StartData::Pid(1));
    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3 {
        let order = order.clone();
        core.on_stop(Box::new(move |_| order.lock().push(i)));
    }
    core.notify_stop(StopData::Local {
        exit_code: Some(0),
        pid: Some(1),
    });
    assert_eq!(*order.lock(), vec![0, 1, 2]);
}
