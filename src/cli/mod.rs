//! Subcommand runners behind the `catalog-explorer` binary. Each one opens
//! a session, computes one surface and prints it as JSON on stdout.

pub mod charts;
pub mod explore;

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{ConfigOverrides, ExplorerConfig};
use crate::session::Session;
use crate::util::env as env_util;

/// Resolve the configuration and load the catalog.
pub fn open_session(overrides: ConfigOverrides) -> Result<Session> {
    let config = ExplorerConfig::resolve(overrides).context("resolving explorer configuration")?;
    Ok(Session::open(&config))
}

/// Pretty JSON unless `CATALOG_COMPACT_JSON` is set.
pub fn emit<T: Serialize>(value: &T) -> Result<()> {
    let body = if env_util::env_flag("CATALOG_COMPACT_JSON", false) {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    let mut out = std::io::stdout().lock();
    writeln!(out, "{body}").context("writing output")?;
    Ok(())
}
