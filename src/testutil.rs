// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use std::collections::HashMap;

use tempfile::TempDir;

use crate::auth::password::Hasher;
use crate::config::{AppConfig, CACHE_ENABLED_ENV, DATA_DIR_ENV, JWT_SECRET_ENV};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret-0123456789abcdef-0123456789";

/// Config rooted in `dir`, plus any overrides.
pub fn test_config(dir: &TempDir, overrides: &[(&str, &str)]) -> AppConfig {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert(JWT_SECRET_ENV.to_string(), TEST_SECRET.to_string());
    vars.insert(
        DATA_DIR_ENV.to_string(),
        dir.path().to_string_lossy().into_owned(),
    );
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    AppConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

/// State over a fresh temp directory with cheap password hashing.
pub fn test_state() -> (AppState, TempDir) {
    test_state_with(&[])
}

pub fn test_state_with(overrides: &[(&str, &str)]) -> (AppState, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let config = test_config(&dir, overrides);
    let hasher = Hasher::with_params(4, 8, 1).expect("scrypt params");
    let state = AppState::with_hasher(config, hasher).expect("app state");
    (state, dir)
}

/// State with the lookup cache turned off.
pub fn uncached_state() -> (AppState, TempDir) {
    test_state_with(&[(CACHE_ENABLED_ENV, "false")])
}
