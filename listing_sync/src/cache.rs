//! The local listing cache, system of record for the sync.
//!
//! Every read the destination push needs is answered from here, never from
//! the source API. One [`ListingCache`] wraps one SQLite connection; worker
//! threads each open their own.

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};
use tracing::{debug, warn};

use crate::db::{connection, migrate};
use crate::models::{ItemRecord, MetadataRecord, NewItem, SyncCursor};
use crate::schema::{item_metadata, items, sync_cursor};

/// Metadata key under which gallery image URLs are stored.
pub const IMAGE_KEY: &str = "picture_url";

/// Handle to the cache database.
pub struct ListingCache {
    conn: SqliteConnection,
}

impl ListingCache {
    /// Opens the cache at `database_url`, applying pending migrations first.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        migrate::run_sqlite(database_url)
            .with_context(|| format!("migrating cache at {database_url}"))?;
        let conn = connection::connect_sqlite(database_url)?;
        Ok(Self { conn })
    }

    /// Inserts or refreshes a listing row.
    ///
    /// All descriptive fields are overwritten; `post_id` is untouched, so a
    /// refresh never loses track of an already-pushed product.
    pub fn upsert_item(&mut self, row: &NewItem<'_>) -> anyhow::Result<()> {
        insert_into(items::table)
            .values(row)
            .on_conflict(items::item_id)
            .do_update()
            .set(row)
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Attaches a key/value pair to a listing, once.
    ///
    /// The same (item_id, key, value) triple is never stored twice; repeat
    /// calls are no-ops, which lets bulk and detail responses both report
    /// the same picture URLs harmlessly.
    pub fn upsert_metadata(&mut self, item_id: i64, key: &str, value: &str) -> anyhow::Result<()> {
        let existing: i64 = item_metadata::table
            .filter(item_metadata::item_id.eq(item_id))
            .filter(item_metadata::key.eq(key))
            .filter(item_metadata::value.eq(value))
            .count()
            .get_result(&mut self.conn)?;
        if existing > 0 {
            debug!(item_id, key, "metadata pair already cached, skipping");
            return Ok(());
        }
        insert_into(item_metadata::table)
            .values((
                item_metadata::item_id.eq(item_id),
                item_metadata::key.eq(key),
                item_metadata::value.eq(value),
            ))
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// The listing row backing a product create, if it is pushable.
    ///
    /// Rows with zero available quantity are not pushable and read back as
    /// `None`, same as an unknown id.
    pub fn product_data(&mut self, item_id: i64) -> anyhow::Result<Option<ItemRecord>> {
        let row = items::table
            .find(item_id)
            .filter(items::available_quantity.gt(0))
            .select(ItemRecord::as_select())
            .first(&mut self.conn)
            .optional()?;
        Ok(row)
    }

    /// The destination product id for a listing, pushable or not.
    pub fn item_post_id(&mut self, item_id: i64) -> anyhow::Result<Option<i64>> {
        let post_id = items::table
            .find(item_id)
            .select(items::post_id)
            .first::<Option<i64>>(&mut self.conn)
            .optional()?;
        Ok(post_id.flatten())
    }

    /// Gallery image rows for a listing, in stable value order.
    pub fn image_urls(&mut self, item_id: i64) -> anyhow::Result<Vec<MetadataRecord>> {
        let rows = item_metadata::table
            .filter(item_metadata::item_id.eq(item_id))
            .filter(item_metadata::key.eq(IMAGE_KEY))
            .order(item_metadata::value.asc())
            .select(MetadataRecord::as_select())
            .load(&mut self.conn)?;
        Ok(rows)
    }

    /// Every metadata row for a listing, gallery images included.
    pub fn all_metadata(&mut self, item_id: i64) -> anyhow::Result<Vec<MetadataRecord>> {
        let rows = item_metadata::table
            .filter(item_metadata::item_id.eq(item_id))
            .order(item_metadata::id.asc())
            .select(MetadataRecord::as_select())
            .load(&mut self.conn)?;
        Ok(rows)
    }

    /// Ids of live listings that have not been pushed yet.
    pub fn active_item_ids(&mut self) -> anyhow::Result<Vec<i64>> {
        let ids = items::table
            .filter(items::active.eq("Active"))
            .filter(items::post_id.is_null())
            .order(items::item_id.asc())
            .select(items::item_id)
            .load(&mut self.conn)?;
        Ok(ids)
    }

    /// Ids of pushed listings whose source side has since ended.
    ///
    /// A listing counts as ended when its status left `"Active"` or its end
    /// date is in the past; either way it must already carry a `post_id`,
    /// never-pushed rows are not reconciliation work.
    pub fn inactive_pushed_item_ids(&mut self, as_of: NaiveDateTime) -> anyhow::Result<Vec<i64>> {
        let ids = items::table
            .filter(items::post_id.is_not_null())
            .filter(items::active.ne("Active").or(items::end_date.le(as_of)))
            .order(items::item_id.asc())
            .select(items::item_id)
            .load(&mut self.conn)?;
        Ok(ids)
    }

    /// Records the destination product id for a pushed listing.
    pub fn mark_item_pushed(&mut self, item_id: i64, post_id: i64) -> anyhow::Result<()> {
        diesel::update(items::table.find(item_id))
            .set(items::post_id.eq(post_id))
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Records the destination media id for an uploaded metadata row.
    ///
    /// Keyed by the metadata row id so two rows with equal values cannot
    /// shadow each other.
    pub fn mark_metadata_pushed(&mut self, metadata_id: i32, post_id: i64) -> anyhow::Result<()> {
        diesel::update(item_metadata::table.find(metadata_id))
            .set(item_metadata::post_id.eq(post_id))
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Reverts a listing to the unpushed state.
    pub fn clear_item_post_id(&mut self, item_id: i64) -> anyhow::Result<()> {
        diesel::update(items::table.find(item_id))
            .set(items::post_id.eq(None::<i64>))
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn cursor(&mut self) -> anyhow::Result<SyncCursor> {
        let row = sync_cursor::table
            .find(1)
            .select(SyncCursor::as_select())
            .first(&mut self.conn)?;
        Ok(row)
    }

    /// Source API calls spent since the counter was last reset.
    pub fn request_count(&mut self) -> anyhow::Result<i32> {
        Ok(self.cursor()?.requests_today)
    }

    /// Bumps the request counter by one.
    pub fn increment_request_count(&mut self) -> anyhow::Result<()> {
        diesel::update(sync_cursor::table.find(1))
            .set(sync_cursor::requests_today.eq(sync_cursor::requests_today + 1))
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Persists the detail-fetch checkpoint.
    ///
    /// An empty slice clears it, meaning the previous run finished.
    pub fn store_pending_ids(&mut self, ids: &[i64]) -> anyhow::Result<()> {
        let encoded = serde_json::to_string(ids)?;
        diesel::update(sync_cursor::table.find(1))
            .set(sync_cursor::pending_item_ids.eq(encoded))
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Ids still awaiting a detail fetch.
    ///
    /// Falls back to the current active set when no checkpoint is stored,
    /// so a fresh pull picks up where classification left off.
    pub fn pending_detail_ids(&mut self) -> anyhow::Result<Vec<i64>> {
        let cursor = self.cursor()?;
        let stored: Vec<i64> = serde_json::from_str(&cursor.pending_item_ids)
            .with_context(|| format!("corrupt pending id checkpoint: {}", cursor.pending_item_ids))?;
        if !stored.is_empty() {
            return Ok(stored);
        }
        warn!("no continue point stored, falling back to the active set");
        self.active_item_ids()
    }

    /// Same-day guard for the listing pull.
    ///
    /// Returns false when a pull already ran today (or the stored date is
    /// somehow in the future). Otherwise records today's date and resets
    /// the request counter in one transaction, and returns true.
    pub fn try_begin_seller_list_run(&mut self, today: NaiveDate) -> anyhow::Result<bool> {
        let cursor = self.cursor()?;
        if let Some(stored) = cursor.last_pull_date.as_deref() {
            let last = NaiveDate::parse_from_str(stored, "%Y-%m-%d")
                .with_context(|| format!("corrupt last pull date: {stored}"))?;
            if last >= today {
                warn!(%last, "listing pull already ran today, refusing to run again");
                return Ok(false);
            }
        }
        self.conn.immediate_transaction(|conn| {
            diesel::update(sync_cursor::table.find(1))
                .set((
                    sync_cursor::last_pull_date.eq(today.format("%Y-%m-%d").to_string()),
                    sync_cursor::requests_today.eq(0),
                ))
                .execute(conn)?;
            diesel::QueryResult::Ok(())
        })?;
        Ok(true)
    }
}
