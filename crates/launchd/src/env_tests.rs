// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::env as std_env;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn state_dir_prefers_pf_state_dir() {
    let _guard = ENV_LOCK.lock().unwrap();
    std_env::set_var("PF_STATE_DIR", "/tmp/pf-launchd-explicit");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/pf-launchd-explicit"));
    std_env::remove_var("PF_STATE_DIR");
}

#[test]
fn state_dir_falls_back_to_home() {
    let _guard = ENV_LOCK.lock().unwrap();
    std_env::remove_var("PF_STATE_DIR");
    std_env::remove_var("XDG_STATE_HOME");
    std_env::set_var("HOME", "/tmp/home-launchd");
    assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/home-launchd/.local/state/pf"));
}
