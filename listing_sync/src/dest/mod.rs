//! Pushing cached listings to the storefront.
//!
//! Every command reads exclusively from the cache, never from the source
//! API. Commands are idempotent at this layer: re-running one against an
//! already-synced listing spends zero network calls.

pub mod category;

use std::thread::sleep;
use std::time::Duration;

use storefront_api::products::{
    BATCH_DELETE_LIMIT, CategoryRef, NewProduct, ProductAttribute,
};
use storefront_api::{StorefrontApi, StorefrontError};
use tracing::{debug, info, warn};

use crate::cache::{IMAGE_KEY, ListingCache};
use self::category::CategoryMap;

/// Pause before retrying a timed-out storefront call.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Work the destination side knows how to perform.
#[derive(Debug, Clone)]
pub enum DestCommand {
    /// Create the product for a cached listing.
    CreateProduct(i64),
    /// Upload the listing's images and set the product gallery.
    UploadImages(i64),
    /// Push the listing's metadata as product attributes.
    UploadAttributes(i64),
    /// Permanently delete the listing's product.
    DeleteProduct(i64),
    /// Bulk-delete products by destination id.
    DeleteAllProducts(Vec<i64>),
}

/// Retries a storefront call once, after a pause, when the failure is
/// transient.
fn call_with_retry<T>(
    f: impl Fn() -> Result<T, StorefrontError>,
) -> Result<T, StorefrontError> {
    match f() {
        Err(e) if e.is_transient() => {
            warn!(error = %e, "transient storefront error, retrying once");
            sleep(RETRY_DELAY);
            f()
        }
        other => other,
    }
}

/// Executes [`DestCommand`]s against a cache and a storefront.
pub struct DestinationSync<S: StorefrontApi> {
    cache: ListingCache,
    storefront: S,
    categories: CategoryMap,
}

impl<S: StorefrontApi> DestinationSync<S> {
    /// Bundles a cache handle, a storefront client, and the category map.
    pub fn new(cache: ListingCache, storefront: S, categories: CategoryMap) -> Self {
        Self {
            cache,
            storefront,
            categories,
        }
    }

    /// Runs one command to completion.
    pub fn dispatch(&mut self, command: DestCommand) -> anyhow::Result<()> {
        match command {
            DestCommand::CreateProduct(item_id) => self.create_product(item_id),
            DestCommand::UploadImages(item_id) => self.upload_images(item_id),
            DestCommand::UploadAttributes(item_id) => self.upload_attributes(item_id),
            DestCommand::DeleteProduct(item_id) => self.delete_product(item_id),
            DestCommand::DeleteAllProducts(post_ids) => self.delete_all_products(&post_ids),
        }
    }

    fn create_product(&mut self, item_id: i64) -> anyhow::Result<()> {
        let Some(row) = self.cache.product_data(item_id)? else {
            warn!(item_id, "nothing pushable cached for listing, skipping create");
            return Ok(());
        };
        if let Some(post_id) = row.post_id {
            debug!(item_id, post_id, "product already created, skipping");
            return Ok(());
        }

        let categories = match self.categories.lookup(row.category_id) {
            Some(id) => vec![CategoryRef { id }],
            None => Vec::new(),
        };
        let product = NewProduct {
            name: row.title.clone(),
            product_type: "simple".to_string(),
            sku: row.sku.clone(),
            description: row.description.clone(),
            short_description: row.condition_description.clone(),
            status: "publish".to_string(),
            categories,
        };

        let post_id = match call_with_retry(|| self.storefront.create_product(&product)) {
            Ok(post_id) => post_id,
            Err(StorefrontError::DuplicateSku { resource_id }) => {
                warn!(
                    item_id,
                    post_id = resource_id,
                    "destination already has this SKU, adopting the existing product"
                );
                resource_id
            }
            Err(e) => return Err(e.into()),
        };
        self.cache.mark_item_pushed(item_id, post_id)?;
        info!(item_id, post_id, "product created");
        Ok(())
    }

    fn upload_images(&mut self, item_id: i64) -> anyhow::Result<()> {
        let Some(post_id) = self.cache.item_post_id(item_id)? else {
            warn!(item_id, "listing has no product yet, skipping image upload");
            return Ok(());
        };

        let rows = self.cache.image_urls(item_id)?;
        let mut gallery = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(media_id) = row.post_id {
                gallery.push(media_id);
                continue;
            }

            let image = call_with_retry(|| self.storefront.fetch_image(&row.value))?;
            let media_id = match self.storefront.find_media_by_slug(&image.slug) {
                Ok(Some(existing)) => {
                    debug!(item_id, slug = %image.slug, media_id = existing, "image already on the destination, reusing");
                    existing
                }
                Ok(None) => call_with_retry(|| self.storefront.upload_media(&image))?,
                Err(e) => {
                    warn!(item_id, slug = %image.slug, error = %e, "slug lookup failed, uploading anyway");
                    call_with_retry(|| self.storefront.upload_media(&image))?
                }
            };
            self.cache.mark_metadata_pushed(row.id, media_id)?;
            gallery.push(media_id);
        }

        if gallery.is_empty() {
            debug!(item_id, "listing has no images, leaving the gallery alone");
            return Ok(());
        }
        call_with_retry(|| self.storefront.update_gallery(post_id, &gallery))?;
        info!(item_id, post_id, images = gallery.len(), "gallery updated");
        Ok(())
    }

    fn upload_attributes(&mut self, item_id: i64) -> anyhow::Result<()> {
        let Some(post_id) = self.cache.item_post_id(item_id)? else {
            warn!(item_id, "listing has no product yet, skipping attributes");
            return Ok(());
        };

        let attributes: Vec<ProductAttribute> = self
            .cache
            .all_metadata(item_id)?
            .into_iter()
            .filter(|row| row.key != IMAGE_KEY)
            .map(|row| ProductAttribute::single(row.key, row.value))
            .collect();
        if attributes.is_empty() {
            debug!(item_id, "listing has no attributes to push");
            return Ok(());
        }

        call_with_retry(|| self.storefront.update_attributes(post_id, &attributes))?;
        info!(item_id, post_id, count = attributes.len(), "attributes updated");
        Ok(())
    }

    fn delete_product(&mut self, item_id: i64) -> anyhow::Result<()> {
        let Some(post_id) = self.cache.item_post_id(item_id)? else {
            debug!(item_id, "listing was never pushed, nothing to delete");
            return Ok(());
        };

        match call_with_retry(|| self.storefront.delete_product(post_id, true)) {
            Ok(()) => {
                info!(item_id, post_id, "product deleted");
            }
            Err(StorefrontError::NotFound) => {
                warn!(item_id, post_id, "product already gone from the destination");
            }
            Err(e) => return Err(e.into()),
        }
        self.cache.clear_item_post_id(item_id)?;
        Ok(())
    }

    fn delete_all_products(&mut self, post_ids: &[i64]) -> anyhow::Result<()> {
        for chunk in post_ids.chunks(BATCH_DELETE_LIMIT) {
            call_with_retry(|| self.storefront.batch_delete(chunk))?;
            info!(count = chunk.len(), "bulk delete issued");
        }
        Ok(())
    }
}
