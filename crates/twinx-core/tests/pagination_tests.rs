#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::prop;
use proptest::prelude::*;
use twinx_core::model::{ElementContainer, SubmodelElement};
use twinx_core::ops::{decode_cursor, encode_cursor, paginate, Page};

fn elements(n: usize) -> Vec<SubmodelElement> {
    (0..n).map(|i| prop(&format!("p{}", i), "v")).collect()
}

fn page_of(items: Vec<SubmodelElement>, limit: usize, cursor: &str) -> Page<SubmodelElement> {
    paginate(items, limit, cursor, |e| e.id_short.clone()).unwrap()
}

#[test]
fn test_150_elements_in_pages_of_100() {
    let container: ElementContainer = elements(150).into_iter().collect();
    let all: Vec<SubmodelElement> = container.iter().cloned().collect();

    let first = page_of(all.clone(), 100, "");
    assert_eq!(first.len(), 100);
    assert!(!first.next_cursor.is_empty());
    assert_eq!(first.items[99].id_short, "p99");

    let second = page_of(all, 100, &first.next_cursor);
    assert_eq!(second.len(), 50);
    assert_eq!(second.next_cursor, "");
    assert_eq!(second.items[0].id_short, "p100");
    assert_eq!(second.items[49].id_short, "p149");
}

#[test]
fn test_100_elements_with_limit_100_need_a_second_call() {
    let all = elements(100);
    let first = page_of(all.clone(), 100, "");
    assert_eq!(first.len(), 100);
    assert_eq!(decode_cursor(&first.next_cursor).unwrap().as_deref(), Some("p99"));

    let second = page_of(all, 100, &first.next_cursor);
    assert!(second.is_empty());
    assert_eq!(second.next_cursor, "");
}

#[test]
fn test_cursor_carries_last_key() {
    let page = page_of(elements(10), 3, "");
    assert_eq!(decode_cursor(&page.next_cursor).unwrap().as_deref(), Some("p2"));
}

#[test]
fn test_deleted_cursor_item_restarts_from_start() {
    let page = page_of(elements(10), 3, "");
    let mut remaining = elements(10);
    remaining.retain(|e| e.id_short != "p2");
    let next = page_of(remaining, 3, &page.next_cursor);
    assert_eq!(next.items[0].id_short, "p0");
}

#[test]
fn test_empty_collection() {
    let page = page_of(Vec::new(), 5, "");
    assert!(page.is_empty());
    assert!(page.is_last());
}

#[test]
fn test_cursor_for_last_item_yields_empty_page() {
    let cursor = encode_cursor("p4");
    let page = page_of(elements(5), 5, &cursor);
    assert!(page.is_empty());
    assert!(page.is_last());
}

proptest! {
    #[test]
    fn prop_paging_visits_every_item_once(n in 0usize..120, limit in 1usize..40) {
        let items = elements(n);
        let mut seen = Vec::new();
        let mut cursor = String::new();
        let mut rounds = 0;
        loop {
            let page = page_of(items.clone(), limit, &cursor);
            prop_assert!(page.len() <= limit);
            seen.extend(page.items.iter().map(|e| e.id_short.clone()));
            if page.is_last() {
                break;
            }
            cursor = page.next_cursor;
            rounds += 1;
            prop_assert!(rounds <= n, "paging did not terminate");
        }
        let expected: Vec<String> = items.iter().map(|e| e.id_short.clone()).collect();
        prop_assert_eq!(seen, expected);
    }
}
