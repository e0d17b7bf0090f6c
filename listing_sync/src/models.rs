//! Row types for the listing cache tables.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::{item_metadata, items, sync_cursor};

/// A cached listing, as read back from the `items` table.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = items)]
#[diesel(primary_key(item_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ItemRecord {
    /// Source marketplace listing id.
    pub item_id: i64,
    /// Source listing status string, `"Active"` while the listing is live.
    pub active: String,
    /// Quantity listed minus quantity sold, floored at zero.
    pub available_quantity: i32,
    /// Listing title.
    pub title: String,
    /// Seller SKU.
    pub sku: String,
    /// When the listing started, UTC.
    pub start_date: NaiveDateTime,
    /// When the listing ends or ended, UTC.
    pub end_date: NaiveDateTime,
    /// Source category id.
    pub category_id: i64,
    /// Source category display name.
    pub category_name: String,
    /// Condition display name, empty when the source omitted it.
    pub condition_name: String,
    /// Seller's condition notes, empty when omitted.
    pub condition_description: String,
    /// Full listing description HTML, empty when omitted.
    pub description: String,
    /// Destination product id once pushed, `None` until then.
    pub post_id: Option<i64>,
}

/// Insert/update payload for the `items` table.
///
/// Deliberately has no `post_id` field: refreshing a listing from the
/// source must never clobber the push marker.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = items)]
#[diesel(primary_key(item_id))]
pub struct NewItem<'a> {
    /// Source marketplace listing id.
    pub item_id: i64,
    /// Source listing status string.
    pub active: &'a str,
    /// Quantity listed minus quantity sold, floored at zero.
    pub available_quantity: i32,
    /// Listing title.
    pub title: &'a str,
    /// Seller SKU.
    pub sku: &'a str,
    /// When the listing started, UTC.
    pub start_date: NaiveDateTime,
    /// When the listing ends or ended, UTC.
    pub end_date: NaiveDateTime,
    /// Source category id.
    pub category_id: i64,
    /// Source category display name.
    pub category_name: &'a str,
    /// Condition display name.
    pub condition_name: &'a str,
    /// Seller's condition notes.
    pub condition_description: &'a str,
    /// Full listing description HTML.
    pub description: &'a str,
}

/// One key/value pair attached to a listing, e.g. an image URL or an
/// item specific.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = item_metadata)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MetadataRecord {
    /// Cache-local row id.
    pub id: i32,
    /// Listing the pair belongs to.
    pub item_id: i64,
    /// Pair name, `"picture_url"` for gallery entries.
    pub key: String,
    /// Pair value.
    pub value: String,
    /// Destination media id once uploaded, `None` until then.
    pub post_id: Option<i64>,
}

/// The single bookkeeping row tracking pull progress and request budget.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sync_cursor)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncCursor {
    /// Always 1; the table holds exactly one row.
    pub id: i32,
    /// Source API calls spent since the counter was last reset.
    pub requests_today: i32,
    /// JSON array of item ids still awaiting a detail fetch.
    pub pending_item_ids: String,
    /// ISO date of the last completed listing pull, `None` before the first.
    pub last_pull_date: Option<String>,
}
