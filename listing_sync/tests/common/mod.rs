#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDateTime;
use listing_sync::ListingCache;
use listing_sync::models::NewItem;
use tempfile::TempDir;

pub struct TestDb {
    _dir: TempDir, // keep alive for the life of the test
    pub path: String,
}

pub fn setup_db() -> (TestDb, ListingCache) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    let cache = ListingCache::open(&path).expect("open cache");
    (TestDb { _dir: dir, path }, cache)
}

pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp literal")
}

/// Inserts a listing with sensible defaults for fields a test doesn't care
/// about.
pub fn insert_item(cache: &mut ListingCache, item_id: i64, active: &str, quantity: i32, end: &str) {
    let title = format!("Item {item_id}");
    let sku = format!("SKU-{item_id}");
    let row = NewItem {
        item_id,
        active,
        available_quantity: quantity,
        title: &title,
        sku: &sku,
        start_date: ts("2020-02-01 10:00:00"),
        end_date: ts(end),
        category_id: 11450,
        category_name: "Widgets",
        condition_name: "Used",
        condition_description: "Light wear",
        description: "<p>A widget.</p>",
    };
    cache.upsert_item(&row).expect("insert item");
}
