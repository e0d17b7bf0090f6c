//! Pulling listings from the marketplace into the cache.
//!
//! A pull has two phases. The paginated bulk call stores every listing in
//! the window and classifies it active or inactive. The detail phase then
//! walks the pending-id set one listing at a time to pick up specifics,
//! checkpointing wherever the daily request budget runs out so the next
//! run resumes instead of restarting.

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use marketplace_api::params::DEFAULT_ENTRIES_PER_PAGE;
use marketplace_api::response::ListingItem;
use marketplace_api::{DateWindow, ListingSource, MarketplaceError, SellerListParams};
use tracing::{error, info, warn};

use crate::cache::{IMAGE_KEY, ListingCache};
use crate::models::NewItem;

/// Work the source side knows how to perform.
#[derive(Debug, Clone)]
pub enum SourceCommand {
    /// Pull every listing in the window, then fetch details for the
    /// pending set.
    PullSellerList {
        /// Date range and dimension to search.
        window: DateWindow,
    },
}

/// Executes [`SourceCommand`]s against a cache and a listing source.
pub struct SourceSync<M: ListingSource> {
    cache: ListingCache,
    marketplace: M,
    daily_limit: u32,
}

/// Retries a source call once when the failure is transient.
fn call_with_retry<T>(
    f: impl Fn() -> Result<T, MarketplaceError>,
) -> Result<T, MarketplaceError> {
    match f() {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "transient source error, retrying once");
            f()
        }
        other => other,
    }
}

impl<M: ListingSource> SourceSync<M> {
    /// Bundles a cache handle and a listing source.
    pub fn new(cache: ListingCache, marketplace: M, daily_limit: u32) -> Self {
        Self {
            cache,
            marketplace,
            daily_limit,
        }
    }

    /// Runs one command to completion.
    pub fn dispatch(&mut self, command: SourceCommand) -> anyhow::Result<()> {
        match command {
            SourceCommand::PullSellerList { window } => self.pull_seller_list(window),
        }
    }

    fn pull_seller_list(&mut self, window: DateWindow) -> anyhow::Result<()> {
        if !self.cache.try_begin_seller_list_run(Utc::now().date_naive())? {
            return Ok(());
        }

        let mut params = SellerListParams::new(window, DEFAULT_ENTRIES_PER_PAGE);
        let mut received: u64 = 0;
        let mut active: u64 = 0;
        let mut inactive: u64 = 0;

        loop {
            self.cache.increment_request_count()?;
            let page = match call_with_retry(|| self.marketplace.seller_list(&params)) {
                Ok(page) => page,
                Err(MarketplaceError::Connection(msg)) => {
                    error!(error = %msg, "lost connection to the source, abandoning this pull");
                    return Ok(());
                }
                Err(e) => return Err(e).context("bulk listing pull failed"),
            };

            received += page.returned_item_count_actual;
            let total = page.pagination_result.total_number_of_entries;
            info!(got = received, total, "got {received} of {total} items");

            for item in page.items() {
                match self.store_item(&item) {
                    Ok(true) => active += 1,
                    Ok(false) => inactive += 1,
                    Err(e) => {
                        error!(item_id = %item.item_id, error = %e, "skipping malformed listing")
                    }
                }
            }

            if received < total && params.page_number < page.pagination_result.total_number_of_pages
            {
                params.page_number += 1;
            } else {
                break;
            }
        }
        info!(active, inactive, "classified pulled listings");

        let pending = self.cache.pending_detail_ids()?;
        self.fetch_details(&pending)
    }

    /// Fetches per-listing details for `ids`, spending request budget.
    ///
    /// When the budget runs out the unvisited tail is checkpointed and the
    /// phase ends cleanly; a connection loss checkpoints the same way. A
    /// full walk clears the checkpoint.
    fn fetch_details(&mut self, ids: &[i64]) -> anyhow::Result<()> {
        for (idx, &item_id) in ids.iter().enumerate() {
            let spent = self.cache.request_count()?;
            if spent >= self.daily_limit as i32 {
                warn!(
                    spent,
                    limit = self.daily_limit,
                    remaining = ids.len() - idx,
                    "daily request budget exhausted, saving a continue point"
                );
                self.cache.store_pending_ids(&ids[idx..])?;
                return Ok(());
            }

            self.cache.increment_request_count()?;
            let detail = match call_with_retry(|| self.marketplace.item_detail(item_id, true)) {
                Ok(detail) => detail,
                Err(MarketplaceError::Connection(msg)) => {
                    error!(error = %msg, "lost connection to the source, saving a continue point");
                    self.cache.store_pending_ids(&ids[idx..])?;
                    return Ok(());
                }
                Err(e) => return Err(e).with_context(|| format!("detail fetch for {item_id}")),
            };

            if let Err(e) = self.store_item(&detail) {
                error!(item_id, error = %e, "skipping malformed listing detail");
            }
        }

        self.cache.store_pending_ids(&[])?;
        Ok(())
    }

    /// Stores one listing and its metadata; true when the listing is live.
    fn store_item(&mut self, item: &ListingItem) -> anyhow::Result<bool> {
        let item_id: i64 = item
            .item_id
            .parse()
            .with_context(|| format!("non-numeric item id {:?}", item.item_id))?;
        let category_id: i64 = item
            .primary_category
            .category_id
            .parse()
            .with_context(|| {
                format!(
                    "non-numeric category id {:?}",
                    item.primary_category.category_id
                )
            })?;
        let start_date = parse_wire_timestamp(&item.listing_details.start_time)?;
        let end_date = parse_wire_timestamp(&item.listing_details.end_time)?;
        let available_quantity = (item.quantity - item.selling_status.quantity_sold).max(0);

        let row = NewItem {
            item_id,
            active: &item.selling_status.listing_status,
            available_quantity,
            title: &item.title,
            sku: &item.sku,
            start_date,
            end_date,
            category_id,
            category_name: &item.primary_category.category_name,
            condition_name: item.condition_display_name.as_deref().unwrap_or(""),
            condition_description: item.condition_description.as_deref().unwrap_or(""),
            description: item.description.as_deref().unwrap_or(""),
        };
        self.cache.upsert_item(&row)?;

        if let Some(pictures) = &item.picture_details {
            for url in pictures.picture_url.to_vec() {
                self.cache.upsert_metadata(item_id, IMAGE_KEY, &url)?;
            }
        }
        if let Some(specifics) = &item.item_specifics {
            for pair in specifics.name_value_list.to_vec() {
                self.cache
                    .upsert_metadata(item_id, &pair.name, &pair.joined_value())?;
            }
        }

        Ok(item.selling_status.listing_status == "Active")
    }
}

/// Parses the marketplace's ISO-8601 timestamps to UTC-naive.
fn parse_wire_timestamp(raw: &str) -> anyhow::Result<NaiveDateTime> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("unparseable listing timestamp {raw:?}"))?;
    Ok(parsed.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace_api::response::SellerListPage;

    struct FakeSource;

    impl ListingSource for FakeSource {
        fn seller_list(&self, _: &SellerListParams) -> Result<SellerListPage, MarketplaceError> {
            unreachable!("the budget test never pulls pages")
        }

        fn item_detail(&self, item_id: i64, _: bool) -> Result<ListingItem, MarketplaceError> {
            let raw = format!(
                r#"{{
                    "ItemID": "{item_id}",
                    "Title": "Widget",
                    "Quantity": 2,
                    "SellingStatus": {{"ListingStatus": "Active", "QuantitySold": 0}},
                    "ListingDetails": {{"StartTime": "2020-02-01T10:00:00.000Z", "EndTime": "2020-03-01T10:00:00.000Z"}},
                    "PrimaryCategory": {{"CategoryID": "11450", "CategoryName": "Widgets"}}
                }}"#
            );
            Ok(serde_json::from_str(&raw).unwrap())
        }
    }

    #[test]
    fn budget_boundary_checkpoints_the_unvisited_tail() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let path = temp.path().to_string_lossy().to_string();
        let mut cache = ListingCache::open(&path).unwrap();
        for _ in 0..999 {
            cache.increment_request_count().unwrap();
        }

        let mut sync = SourceSync::new(cache, FakeSource, 1000);
        sync.fetch_details(&[1, 2]).unwrap();

        assert_eq!(sync.cache.request_count().unwrap(), 1000);
        assert!(sync.cache.product_data(1).unwrap().is_some());
        assert!(sync.cache.product_data(2).unwrap().is_none());

        assert_eq!(sync.cache.pending_detail_ids().unwrap(), vec![2]);
    }
}
