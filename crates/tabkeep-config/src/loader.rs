// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tabkeep.toml` > `~/.config/tabkeep/tabkeep.toml` >
//! `/etc/tabkeep/tabkeep.toml` with environment variable overrides via `TABKEEP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TabkeepConfig;

/// Sections recognised in `TABKEEP_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["storage", "queue", "snapshot", "bus", "logging"];

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tabkeep/tabkeep.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tabkeep.toml";

/// Per-user config file under the XDG config directory, if one can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tabkeep").join("tabkeep.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tabkeep/tabkeep.toml`
/// 3. `~/.config/tabkeep/tabkeep.toml`
/// 4. `./tabkeep.toml`
/// 5. `TABKEEP_*` environment variables
pub fn load_config() -> Result<TabkeepConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TabkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabkeepConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TabkeepConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TabkeepConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment without extracting it.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(TabkeepConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `TABKEEP_QUEUE_MAX_ENTRIES` to `queue.max_entries`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores stay intact.
fn env_provider() -> Env {
    Env::prefixed("TABKEEP_").map(|key| {
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = ENV_SECTIONS
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key_str);
        mapped.into()
    })
}
