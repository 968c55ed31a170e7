// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opportunistic queue extraction through host script injection.
//!
//! Extraction is best-effort enrichment: an empty result, a vanished tab or a
//! host failure all mean "no queue" and are only logged.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use tabkeep_core::types::{QueueItem, ScriptKind, Tab};
use tabkeep_core::{BrowserAdapter, TabkeepError};

use crate::canonical::{QueueParams, queue_info};
use crate::queue_cache::QueueCache;

/// One entry as reported by the page script.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    item_id: Option<String>,
}

/// Turns raw script output into an ordered, de-duplicated queue.
///
/// Relative URLs resolve against `base_url`. Entries whose item id can be
/// neither read nor derived from their URL are dropped, as are malformed
/// entries. The first occurrence of an item id wins.
pub fn normalize_items(raw: &Value, base_url: &str, params: &QueueParams) -> Vec<QueueItem> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };
    let base = Url::parse(base_url).ok();
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());

    for entry in entries {
        let Ok(raw) = RawItem::deserialize(entry) else {
            continue;
        };
        let resolved = match &base {
            Some(base) => base.join(&raw.url),
            None => Url::parse(&raw.url),
        };
        let Ok(resolved) = resolved else {
            continue;
        };
        let item_id = raw
            .item_id
            .filter(|id| !id.is_empty())
            .or_else(|| params.item_id(&resolved));
        let Some(item_id) = item_id else {
            continue;
        };
        if !seen.insert(item_id.clone()) {
            continue;
        }
        items.push(QueueItem {
            item_id,
            title: raw.title.trim().to_string(),
            url: resolved.into(),
        });
    }
    items
}

/// Extracts and caches the queue of `tab` if it is on a queue-bearing page.
///
/// Returns whether a queue was stored. Host failures are swallowed; only
/// storage failures propagate.
pub async fn refresh_queue(
    browser: &dyn BrowserAdapter,
    cache: &QueueCache,
    tab: &Tab,
) -> Result<bool, TabkeepError> {
    let Some(info) = queue_info(&tab.url, cache.params()) else {
        return Ok(false);
    };

    let raw = match browser.inject_script(tab.id, ScriptKind::ExtractQueue).await {
        Ok(raw) => raw,
        Err(e) if e.is_transient() => {
            debug!(tab_id = %tab.id, error = %e, "tab gone during queue extraction");
            return Ok(false);
        }
        Err(e) => {
            debug!(tab_id = %tab.id, error = %e, "queue extraction failed");
            return Ok(false);
        }
    };

    let items = normalize_items(&raw, &tab.url, cache.params());
    if items.is_empty() {
        debug!(tab_id = %tab.id, canonical = %info.canonical, "page reported no queue");
        return Ok(false);
    }

    // The tab may have closed or navigated while the script ran. Its identity
    // can then be reused, so only a still-matching tab gets a session record.
    let still_owner = match browser.get_tab(tab.id).await {
        Ok(current) => queue_info(&current.url, cache.params())
            .is_some_and(|now| now.canonical == info.canonical),
        Err(e) => {
            debug!(tab_id = %tab.id, error = %e, "tab gone before queue was stored");
            false
        }
    };
    if still_owner {
        cache.capture(tab.id, &info, items).await
    } else {
        cache.capture_canonical(&info, items).await
    }
}
