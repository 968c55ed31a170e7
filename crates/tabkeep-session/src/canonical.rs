// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical content identity for queue-bearing pages.
//!
//! A page is queue-bearing when its URL carries both the item parameter and
//! the collection parameter. Its canonical form keeps scheme, host, path and
//! exactly those two parameters, so positional parameters such as `index` or
//! `t` never change the cache key.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use tabkeep_config::model::QueueConfig;

/// Names of the identity-determining query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueParams {
    pub item: String,
    pub collection: String,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

impl QueueParams {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            item: config.item_param.clone(),
            collection: config.collection_param.clone(),
        }
    }

    /// First non-empty value of the item parameter.
    pub fn item_id(&self, url: &Url) -> Option<String> {
        first_param(url, &self.item)
    }
}

/// A normalized URL usable as a durable cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a queue-bearing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueInfo {
    pub canonical: CanonicalUrl,
    pub item_id: String,
    pub collection_id: String,
}

/// Derives the queue identity of `url`, or `None` if it is not queue-bearing.
pub fn queue_info(url: &str, params: &QueueParams) -> Option<QueueInfo> {
    let parsed = Url::parse(url).ok()?;
    if parsed.cannot_be_a_base() {
        return None;
    }
    let item_id = first_param(&parsed, &params.item)?;
    let collection_id = first_param(&parsed, &params.collection)?;

    let mut canonical = parsed;
    canonical.set_fragment(None);
    canonical.set_query(None);
    // Credentials never identify content.
    let _ = canonical.set_username("");
    let _ = canonical.set_password(None);
    canonical
        .query_pairs_mut()
        .append_pair(&params.item, &item_id)
        .append_pair(&params.collection, &collection_id);

    Some(QueueInfo {
        canonical: CanonicalUrl(canonical.into()),
        item_id,
        collection_id,
    })
}

/// Canonical key of `url`, or `None` if it is not queue-bearing.
pub fn canonicalize(url: &str, params: &QueueParams) -> Option<CanonicalUrl> {
    queue_info(url, params).map(|info| info.canonical)
}

fn first_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> QueueParams {
        QueueParams::default()
    }

    #[test]
    fn keeps_only_identity_parameters() {
        let key = canonicalize(
            "https://www.youtube.com/watch?index=3&v=abc&t=42s&list=PL1#comments",
            &params(),
        )
        .unwrap();
        assert_eq!(key.as_str(), "https://www.youtube.com/watch?v=abc&list=PL1");
    }

    #[test]
    fn missing_item_or_collection_is_not_queue_bearing() {
        assert!(canonicalize("https://www.youtube.com/watch?v=abc", &params()).is_none());
        assert!(canonicalize("https://www.youtube.com/playlist?list=PL1", &params()).is_none());
        assert!(canonicalize("https://www.youtube.com/watch?v=&list=PL1", &params()).is_none());
        assert!(canonicalize("not a url", &params()).is_none());
        assert!(canonicalize("data:text/plain,v=1&list=2", &params()).is_none());
    }

    #[test]
    fn host_case_and_credentials_are_normalized() {
        let a = canonicalize("https://User:pw@WWW.YouTube.com/watch?v=a&list=b", &params());
        let b = canonicalize("https://www.youtube.com/watch?list=b&v=a", &params());
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_items_have_distinct_keys() {
        let a = canonicalize("https://h.test/watch?v=a&list=L", &params());
        let b = canonicalize("https://h.test/watch?v=b&list=L", &params());
        assert_ne!(a, b);
    }

    #[test]
    fn custom_parameter_names() {
        let params = QueueParams {
            item: "track".into(),
            collection: "album".into(),
        };
        let info = queue_info("https://music.test/play?album=7&pos=2&track=x", &params).unwrap();
        assert_eq!(info.item_id, "x");
        assert_eq!(info.collection_id, "7");
        assert_eq!(info.canonical.as_str(), "https://music.test/play?track=x&album=7");
    }

    #[test]
    fn reserved_characters_are_encoded_stably() {
        let info = queue_info("https://h.test/w?v=a%26b&list=c+d", &params()).unwrap();
        assert_eq!(info.item_id, "a&b");
        assert_eq!(info.collection_id, "c d");
        let again = canonicalize(info.canonical.as_str(), &params()).unwrap();
        assert_eq!(again, info.canonical);
    }

    proptest! {
        #[test]
        fn positional_parameters_never_change_the_key(
            item in "[A-Za-z0-9_-]{1,11}",
            list in "[A-Za-z0-9_-]{1,34}",
            index_a in 0u32..500,
            index_b in 0u32..500,
            extra in proptest::option::of("[a-z]{1,6}"),
        ) {
            let base = format!("https://www.youtube.com/watch?v={item}&list={list}");
            let a = format!("{base}&index={index_a}");
            let b = match &extra {
                Some(e) => format!("https://www.youtube.com/watch?index={index_b}&list={list}&pp={e}&v={item}#t"),
                None => format!("{base}&index={index_b}"),
            };
            let key_a = canonicalize(&a, &params());
            prop_assert!(key_a.is_some());
            prop_assert_eq!(key_a, canonicalize(&b, &params()));
        }
    }
}
