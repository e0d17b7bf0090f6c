//! HTTP client for the marketplace listing API.

use std::time::Duration;

use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shim_utils::env::get_env_var;
use tracing::{debug, info};

use crate::errors::{MarketplaceError, MarketplaceInitError};
use crate::params::SellerListParams;
use crate::response::{ItemDetailResponse, ListingItem, SellerListPage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Interface the sync layer uses to pull listings.
///
/// Kept deliberately narrow: one paginated bulk call, one detail call.
/// The HTTP implementation is [`MarketplaceClient`]; tests use a scripted
/// fake instead of the network.
pub trait ListingSource {
    /// Fetches one page of listings matching the params' date window.
    fn seller_list(&self, params: &SellerListParams) -> Result<SellerListPage, MarketplaceError>;

    /// Fetches one listing, optionally with its specification attributes.
    fn item_detail(
        &self,
        item_id: i64,
        include_specifics: bool,
    ) -> Result<ListingItem, MarketplaceError>;
}

impl<T: ListingSource + ?Sized> ListingSource for &T {
    fn seller_list(&self, params: &SellerListParams) -> Result<SellerListPage, MarketplaceError> {
        (**self).seller_list(params)
    }

    fn item_detail(
        &self,
        item_id: i64,
        include_specifics: bool,
    ) -> Result<ListingItem, MarketplaceError> {
        (**self).item_detail(item_id, include_specifics)
    }
}

/// Blocking HTTP implementation of [`ListingSource`].
///
/// Each worker thread owns its own client; connections are never shared
/// across threads.
pub struct MarketplaceClient {
    http: Client,
    endpoint: String,
    token: SecretString,
}

impl MarketplaceClient {
    /// Creates a client from the environment.
    ///
    /// Reads `marketplace_endpoint` and `marketplace_token`. A missing
    /// variable fails this constructor (and hence the calls that needed
    /// it), never the whole process.
    pub fn from_env() -> Result<Self, MarketplaceInitError> {
        let endpoint = get_env_var("marketplace_endpoint")?;
        let token = SecretString::from(get_env_var("marketplace_token")?);

        info!(%endpoint, "opening new API connection to marketplace");
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    fn execute<T: DeserializeOwned>(&self, call: &str, body: &Value) -> Result<T, MarketplaceError> {
        debug!(call, "executing marketplace call");
        let response = self
            .http
            .post(&self.endpoint)
            .header("X-API-CALL", call)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()?;

        if !response.status().is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unknown API error".to_string());
            return Err(MarketplaceError::Api(message));
        }

        Ok(response.json::<T>()?)
    }
}

impl ListingSource for MarketplaceClient {
    fn seller_list(&self, params: &SellerListParams) -> Result<SellerListPage, MarketplaceError> {
        self.execute("GetSellerList", &params.request_body())
    }

    fn item_detail(
        &self,
        item_id: i64,
        include_specifics: bool,
    ) -> Result<ListingItem, MarketplaceError> {
        let body = json!({
            "ItemID": item_id.to_string(),
            "IncludeItemSpecifics": include_specifics,
        });
        let detail: ItemDetailResponse = self.execute("GetItem", &body)?;
        Ok(detail.item)
    }
}
