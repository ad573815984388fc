// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::env as std_env;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn load_defaults_connection_addresses_and_derives_log_path() {
    let _guard = ENV_LOCK.lock().unwrap();
    std_env::set_var("PF_STATE_DIR", "/tmp/pf-cfg-test");
    std_env::set_var("PF_ENGINE_IDENT", "engine-a");
    std_env::remove_var("PF_ENGINE_SHELL_ADDR");
    std_env::remove_var("PF_ENGINE_CONTROL_ADDR");
    std_env::remove_var("PF_ENGINE_IOPUB_ADDR");

    let config = Config::load(PathBuf::from("/p")).unwrap();

    assert_eq!(config.ident, "engine-a");
    assert_eq!(config.profile_dir, PathBuf::from("/p"));
    assert_eq!(config.log_path, PathBuf::from("/tmp/pf-cfg-test/engine-engine-a.log"));
    assert_eq!(config.shell_addr, "127.0.0.1:8090");

    std_env::remove_var("PF_STATE_DIR");
    std_env::remove_var("PF_ENGINE_IDENT");
}

#[test]
fn load_honors_explicit_connection_addresses() {
    let _guard = ENV_LOCK.lock().unwrap();
    std_env::set_var("PF_STATE_DIR", "/tmp/pf-cfg-test");
    std_env::set_var("PF_ENGINE_SHELL_ADDR", "10.0.0.1:9000");

    let config = Config::load(PathBuf::from(".")).unwrap();
    assert_eq!(config.shell_addr, "10.0.0.1:9000");

    std_env::remove_var("PF_STATE_DIR");
    std_env::remove_var("PF_ENGINE_SHELL_ADDR");
}
