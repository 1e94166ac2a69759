//! Cursor pagination over ordered collections
//!
//! A cursor is the URL-safe base64 of the key of the last item returned. The
//! empty cursor means "from the start". An empty `next_cursor` is only
//! returned once fewer than `limit` items remained.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TwinError};

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page; empty once fewer than `limit` items remained
    pub next_cursor: String,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: String::new(),
        }
    }

    /// Build a page from up to `limit + 1` items
    ///
    /// The extra item past the limit is dropped. A full page carries the key
    /// of its last item as the cursor even when nothing follows; the next
    /// call then yields an empty last page.
    pub fn from_overshot(mut raw: Vec<T>, limit: usize, key_fn: impl Fn(&T) -> String) -> Self {
        raw.truncate(limit);
        let next_cursor = if limit > 0 && raw.len() == limit {
            raw.last()
                .map(|item| encode_cursor(&key_fn(item)))
                .unwrap_or_default()
        } else {
            String::new()
        };
        Page {
            items: raw,
            next_cursor,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_cursor.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

pub fn encode_cursor(key: &str) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

/// Decode a cursor back to the item key; `None` for the empty cursor
///
/// # Errors
/// * `InvalidCursor` - not base64 or not UTF-8
pub fn decode_cursor(cursor: &str) -> Result<Option<String>> {
    if cursor.is_empty() {
        return Ok(None);
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor.as_bytes())
        .map_err(|_| TwinError::InvalidCursor {
            reason: "base64 decode failed".to_string(),
        })?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| TwinError::InvalidCursor {
            reason: "UTF-8 decode failed".to_string(),
        })
}

/// Take one page out of an ordered collection
///
/// Items after the one whose key matches the cursor are returned, up to
/// `limit`. A cursor whose key is no longer present restarts from the first
/// item. A `limit` of zero yields an empty last page.
///
/// # Errors
/// * `InvalidCursor` - the cursor cannot be decoded
pub fn paginate<T>(
    items: Vec<T>,
    limit: usize,
    cursor: &str,
    key_fn: impl Fn(&T) -> String,
) -> Result<Page<T>> {
    let after = decode_cursor(cursor)?;
    if limit == 0 {
        return Ok(Page::empty());
    }

    let start = match after {
        None => 0,
        Some(key) => match items.iter().position(|item| key_fn(item) == key) {
            Some(pos) => pos + 1,
            None => {
                tracing::debug!(cursor_key = %key, "stale cursor, restarting from first item");
                0
            }
        },
    };

    let raw: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(limit.saturating_add(1))
        .collect();
    Ok(Page::from_overshot(raw, limit, key_fn))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("k{}", i)).collect()
    }

    #[test]
    fn test_first_page_and_cursor() {
        let page = paginate(keys(5), 2, "", |k| k.clone()).unwrap();
        assert_eq!(page.items, vec!["k0", "k1"]);
        assert_eq!(decode_cursor(&page.next_cursor).unwrap().as_deref(), Some("k1"));
    }

    #[test]
    fn test_exactly_full_page_still_carries_cursor() {
        let page = paginate(keys(4), 4, "", |k| k.clone()).unwrap();
        assert_eq!(page.len(), 4);
        assert_eq!(decode_cursor(&page.next_cursor).unwrap().as_deref(), Some("k3"));

        let tail = paginate(keys(4), 4, &page.next_cursor, |k| k.clone()).unwrap();
        assert!(tail.is_empty());
        assert!(tail.is_last());
    }

    #[test]
    fn test_short_page_has_empty_cursor() {
        let page = paginate(keys(3), 4, "", |k| k.clone()).unwrap();
        assert_eq!(page.len(), 3);
        assert!(page.is_last());
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let page = paginate(keys(3), 0, "", |k| k.clone()).unwrap();
        assert!(page.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn test_stale_cursor_restarts() {
        let cursor = encode_cursor("gone");
        let page = paginate(keys(3), 10, &cursor, |k| k.clone()).unwrap();
        assert_eq!(page.items, keys(3));
    }

    #[test]
    fn test_malformed_cursor_rejected() {
        let err = paginate(keys(3), 10, "***", |k| k.clone()).unwrap_err();
        assert!(matches!(err, TwinError::InvalidCursor { .. }));
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let c = encode_cursor("https://example.com/ids/sm/1?x=ÿ");
        assert!(!c.contains('+') && !c.contains('/') && !c.contains('='));
    }
}
