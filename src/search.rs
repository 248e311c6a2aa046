//! The query rewriter: turn a typed search phrase plus the persisted tiles
//! into one destination URL.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::config::CommandExec;
use crate::store::TileStore;
use crate::tiles::Tile;

pub const SEARCH_BASE: &str = "https://www.google.com/search?q=";

/// Trim the typed phrase; `None` means no navigation happens at all.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Base URL + encoded query + every tile fragment in list order. Fragments
/// already carry their own `&` separator.
pub fn build_search_url(query: &str, tiles: &[Tile]) -> String {
    let mut dest = String::from(SEARCH_BASE);
    dest.push_str(&urlencoding::encode(query));
    for tile in tiles {
        dest.push_str(&tile.value);
    }
    dest
}

/// Resolve a typed phrase into the rewritten destination. Returns `None` for
/// blank input. Reads the persisted list exactly once, at trigger time.
pub fn trigger(query: &str, store: &dyn TileStore) -> Result<Option<Url>> {
    let Some(query) = normalize_query(query) else {
        return Ok(None);
    };
    let tiles = store.get().context("failed to load persisted tiles")?;
    let dest = build_search_url(query, &tiles);
    let url =
        Url::parse(&dest).with_context(|| format!("rewrote query into an invalid URL: {dest}"))?;
    Ok(Some(url))
}

/// Hand the destination to the configured opener command.
pub fn navigate(url: &Url, opener: &CommandExec) -> Result<()> {
    let status = Command::new(&opener.program)
        .args(&opener.args)
        .arg(url.as_str())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("failed to run opener `{}`", opener.program))?;

    if !status.success() {
        bail!("opener `{}` exited with {}", opener.program, status);
    }
    Ok(())
}
