// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory and configuration file resolution.

use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV: &str = "SCANDESK_CONFIG";

const CONFIG_FILE: &str = "config.json";

/// Application data directory, e.g. `%APPDATA%\scandesk`. Not created here.
pub fn data_dir() -> PathBuf {
    base_dir(dirs::data_dir())
}

/// Configuration file: `$SCANDESK_CONFIG`, else `<data_dir>/config.json`.
pub fn config_path() -> PathBuf {
    resolve_config_path(std::env::var_os(CONFIG_ENV), dirs::data_dir())
}

fn base_dir(platform: Option<PathBuf>) -> PathBuf {
    platform.unwrap_or_else(std::env::temp_dir).join("scandesk")
}

fn resolve_config_path(override_path: Option<OsString>, platform: Option<PathBuf>) -> PathBuf {
    match override_path.filter(|value| !value.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => base_dir(platform).join(CONFIG_FILE),
    }
}
