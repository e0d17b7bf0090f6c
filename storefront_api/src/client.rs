//! Blocking HTTP client for the storefront's product and media APIs.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use shim_utils::env::get_env_var;
use tracing::{debug, info};

use crate::errors::{StorefrontError, StorefrontInitError};
use crate::media::{Image, extension_for_mime, slug_from_url};
use crate::products::{NewProduct, ProductAttribute, ProductResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Interface the sync layer uses to push products and media.
///
/// One implementation talks HTTP ([`StorefrontClient`]); tests substitute a
/// scripted fake. Each worker thread owns its own implementation instance.
pub trait StorefrontApi {
    /// Creates a product, returning the destination-assigned id.
    ///
    /// A duplicate-SKU rejection surfaces as
    /// [`StorefrontError::DuplicateSku`] carrying the existing product id.
    fn create_product(&self, product: &NewProduct) -> Result<i64, StorefrontError>;

    /// Replaces the product's image gallery with the given media ids.
    fn update_gallery(&self, post_id: i64, media_ids: &[i64]) -> Result<(), StorefrontError>;

    /// Replaces the product's attribute list.
    fn update_attributes(
        &self,
        post_id: i64,
        attributes: &[ProductAttribute],
    ) -> Result<(), StorefrontError>;

    /// Deletes a product; `force` bypasses the destination's trash.
    fn delete_product(&self, post_id: i64, force: bool) -> Result<(), StorefrontError>;

    /// Deletes up to [`crate::products::BATCH_DELETE_LIMIT`] products in one
    /// call. Callers are responsible for chunking.
    fn batch_delete(&self, post_ids: &[i64]) -> Result<(), StorefrontError>;

    /// Looks up an existing media asset by slug. Best-effort: the
    /// destination's slug index can lag behind recent uploads.
    fn find_media_by_slug(&self, slug: &str) -> Result<Option<i64>, StorefrontError>;

    /// Uploads an image to the media library, returning its media id.
    fn upload_media(&self, image: &Image) -> Result<i64, StorefrontError>;

    /// Downloads source image bytes and packages them for upload.
    fn fetch_image(&self, url: &str) -> Result<Image, StorefrontError>;
}

impl<T: StorefrontApi + ?Sized> StorefrontApi for &T {
    fn create_product(&self, product: &NewProduct) -> Result<i64, StorefrontError> {
        (**self).create_product(product)
    }

    fn update_gallery(&self, post_id: i64, media_ids: &[i64]) -> Result<(), StorefrontError> {
        (**self).update_gallery(post_id, media_ids)
    }

    fn update_attributes(
        &self,
        post_id: i64,
        attributes: &[ProductAttribute],
    ) -> Result<(), StorefrontError> {
        (**self).update_attributes(post_id, attributes)
    }

    fn delete_product(&self, post_id: i64, force: bool) -> Result<(), StorefrontError> {
        (**self).delete_product(post_id, force)
    }

    fn batch_delete(&self, post_ids: &[i64]) -> Result<(), StorefrontError> {
        (**self).batch_delete(post_ids)
    }

    fn find_media_by_slug(&self, slug: &str) -> Result<Option<i64>, StorefrontError> {
        (**self).find_media_by_slug(slug)
    }

    fn upload_media(&self, image: &Image) -> Result<i64, StorefrontError> {
        (**self).upload_media(image)
    }

    fn fetch_image(&self, url: &str) -> Result<Image, StorefrontError> {
        (**self).fetch_image(url)
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<ApiErrorData>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorData {
    #[serde(default)]
    resource_id: Option<i64>,
}

/// Maps a failed response to a typed error.
///
/// A rejection body carrying a `resource_id` means the destination already
/// holds a product with the submitted SKU; that id is surfaced so callers
/// can adopt it instead of failing the sync loop.
fn parse_error_body(status: u16, body: &str) -> StorefrontError {
    if let Ok(api) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(resource_id) = api.data.and_then(|d| d.resource_id) {
            debug!(code = %api.code, message = %api.message, "rejection carries existing resource id");
            return StorefrontError::DuplicateSku { resource_id };
        }
    }
    if status == 404 {
        return StorefrontError::NotFound;
    }
    StorefrontError::Api {
        status,
        body: body.to_string(),
    }
}

/// Blocking HTTP implementation of [`StorefrontApi`].
pub struct StorefrontClient {
    http: Client,
    base_url: String,
    key: String,
    secret: SecretString,
}

impl StorefrontClient {
    /// Creates a client from the environment.
    ///
    /// Reads `storefront_url`, `storefront_key`, and `storefront_secret`.
    /// A missing variable fails this constructor (and hence the calls that
    /// needed it), never the whole process.
    pub fn from_env() -> Result<Self, StorefrontInitError> {
        let base_url = get_env_var("storefront_url")?
            .trim_end_matches('/')
            .to_string();
        let key = get_env_var("storefront_key")?;
        let secret = SecretString::from(get_env_var("storefront_secret")?);

        info!(url = %base_url, "opening new API connection to storefront");
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url,
            key,
            secret,
        })
    }

    fn products_url(&self, suffix: &str) -> String {
        format!("{}/wp-json/wc/v3/products{suffix}", self.base_url)
    }

    fn media_url(&self, suffix: &str) -> String {
        format!("{}/wp-json/wp/v2/media{suffix}", self.base_url)
    }

    fn check<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<T, StorefrontError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>()?);
        }
        let body = response.text().unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }

    fn check_ok(&self, response: reqwest::blocking::Response) -> Result<(), StorefrontError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }
}

impl StorefrontApi for StorefrontClient {
    fn create_product(&self, product: &NewProduct) -> Result<i64, StorefrontError> {
        let response = self
            .http
            .post(self.products_url(""))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .json(product)
            .send()?;
        let created: ProductResponse = self.check(response)?;
        Ok(created.id)
    }

    fn update_gallery(&self, post_id: i64, media_ids: &[i64]) -> Result<(), StorefrontError> {
        let images: Vec<_> = media_ids.iter().map(|id| json!({ "id": id })).collect();
        let response = self
            .http
            .put(self.products_url(&format!("/{post_id}")))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .json(&json!({ "images": images }))
            .send()?;
        self.check_ok(response)
    }

    fn update_attributes(
        &self,
        post_id: i64,
        attributes: &[ProductAttribute],
    ) -> Result<(), StorefrontError> {
        let response = self
            .http
            .put(self.products_url(&format!("/{post_id}")))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .json(&json!({ "attributes": attributes }))
            .send()?;
        self.check_ok(response)
    }

    fn delete_product(&self, post_id: i64, force: bool) -> Result<(), StorefrontError> {
        let response = self
            .http
            .delete(self.products_url(&format!("/{post_id}")))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .query(&[("force", force)])
            .send()?;
        self.check_ok(response)
    }

    fn batch_delete(&self, post_ids: &[i64]) -> Result<(), StorefrontError> {
        let response = self
            .http
            .post(self.products_url("/batch"))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .json(&json!({ "delete": post_ids }))
            .send()?;
        self.check_ok(response)
    }

    fn find_media_by_slug(&self, slug: &str) -> Result<Option<i64>, StorefrontError> {
        let response = self
            .http
            .get(self.media_url(""))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .query(&[("slug", slug)])
            .send()?;
        let matches: Vec<MediaResponse> = self.check(response)?;
        Ok(matches.first().map(|m| m.id))
    }

    fn upload_media(&self, image: &Image) -> Result<i64, StorefrontError> {
        let filename = format!("{}.{}", image.slug, extension_for_mime(&image.mime_type));
        let response = self
            .http
            .post(self.media_url(""))
            .basic_auth(&self.key, Some(self.secret.expose_secret()))
            .header(CONTENT_TYPE, &image.mime_type)
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            )
            .body(image.data.clone())
            .send()?;
        let uploaded: MediaResponse = self.check(response)?;
        Ok(uploaded.id)
    }

    fn fetch_image(&self, url: &str) -> Result<Image, StorefrontError> {
        debug!(%url, "downloading source image");
        let response = self.http.get(url).send()?;
        if !response.status().is_success() {
            return Err(StorefrontError::Api {
                status: response.status().as_u16(),
                body: format!("image download failed for {url}"),
            });
        }
        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let data = response.bytes()?.to_vec();

        let name = url.rsplit('/').next().unwrap_or(url).to_string();
        Ok(Image {
            slug: slug_from_url(url),
            name,
            source_url: url.to_string(),
            mime_type,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_sku_rejection_carries_resource_id() {
        let body = r#"{
            "code": "product_invalid_sku",
            "message": "Invalid or duplicated SKU.",
            "data": {"status": 400, "resource_id": 77}
        }"#;
        match parse_error_body(400, body) {
            StorefrontError::DuplicateSku { resource_id } => assert_eq!(resource_id, 77),
            other => panic!("expected DuplicateSku, got {other:?}"),
        }
    }

    #[test]
    fn missing_resource_maps_to_not_found() {
        match parse_error_body(404, r#"{"code": "rest_no_route"}"#) {
            StorefrontError::NotFound => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_rejections_keep_status_and_body() {
        match parse_error_body(500, "boom") {
            StorefrontError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
