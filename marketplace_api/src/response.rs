//! Response models for the marketplace listing API.
//!
//! The API collapses single-element arrays into bare objects, so every
//! nested list (items, picture URLs, specifics, specific values) is modeled
//! as [`OneOrMany`] and normalized to a `Vec` before iteration.

use serde::Deserialize;

/// A value that the wire format may encode as either one object or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// The usual case: a JSON array.
    Many(Vec<T>),
    /// A single bare object, produced when the array had one element.
    One(T),
}

impl<T> OneOrMany<T> {
    /// Consumes the value, normalizing to a `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(v) => v,
            Self::One(v) => vec![v],
        }
    }

    /// Clones the contents into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        match self {
            Self::Many(v) => v.clone(),
            Self::One(v) => vec![v.clone()],
        }
    }
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// One page of the bulk seller-list response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SellerListPage {
    /// Totals across the whole result set, not just this page.
    pub pagination_result: PaginationResult,
    /// Number of items actually returned on this page.
    pub returned_item_count_actual: u64,
    /// The items, absent when the window matched nothing.
    #[serde(default)]
    pub item_array: Option<ItemArray>,
}

impl SellerListPage {
    /// Items on this page, normalized to a list.
    pub fn items(&self) -> Vec<ListingItem> {
        self.item_array
            .as_ref()
            .map(|a| a.item.to_vec())
            .unwrap_or_default()
    }
}

/// Pagination totals reported by the bulk call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaginationResult {
    /// Total matching items across all pages.
    pub total_number_of_entries: u64,
    /// Total pages at the requested page size.
    pub total_number_of_pages: u32,
}

/// Wrapper object around the item list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemArray {
    /// One listing, or several.
    pub item: OneOrMany<ListingItem>,
}

/// One marketplace listing, as returned by both the bulk and detail calls.
/// The detail call additionally fills in `item_specifics`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingItem {
    /// Marketplace-assigned listing id, numeric but transported as a string.
    #[serde(rename = "ItemID")]
    pub item_id: String,
    /// Listing title.
    pub title: String,
    /// Seller-assigned SKU, may be empty.
    #[serde(rename = "SKU", default)]
    pub sku: String,
    /// Listed quantity.
    pub quantity: i32,
    /// Selling state for the listing.
    pub selling_status: SellingStatus,
    /// Start/end timestamps for the listing.
    pub listing_details: ListingDetails,
    /// The listing's primary category.
    pub primary_category: PrimaryCategory,
    /// Display name of the item condition, when present.
    #[serde(default)]
    pub condition_display_name: Option<String>,
    /// Free-text condition description, when present.
    #[serde(default)]
    pub condition_description: Option<String>,
    /// Listing description HTML, present at `ItemReturnDescription` level.
    #[serde(default)]
    pub description: Option<String>,
    /// Picture URLs, present on both bulk and detail calls.
    #[serde(default)]
    pub picture_details: Option<PictureDetails>,
    /// Specification attributes, present on detail calls that ask for them.
    #[serde(default)]
    pub item_specifics: Option<ItemSpecifics>,
}

/// Selling state of a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SellingStatus {
    /// Listing status string; `"Active"` means live.
    pub listing_status: String,
    /// Units already sold.
    pub quantity_sold: i32,
}

/// Start and end timestamps of a listing, ISO-8601 UTC.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingDetails {
    /// When the listing started.
    pub start_time: String,
    /// When the listing ends or ended.
    pub end_time: String,
}

/// The listing's primary category.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrimaryCategory {
    /// Marketplace category id, numeric but transported as a string.
    #[serde(rename = "CategoryID")]
    pub category_id: String,
    /// Human-readable category path.
    pub category_name: String,
}

/// Picture URLs attached to a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PictureDetails {
    /// One URL, or several.
    #[serde(rename = "PictureURL", default)]
    pub picture_url: OneOrMany<String>,
}

/// Specification attributes attached to a listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemSpecifics {
    /// One name/value pair, or several.
    #[serde(default)]
    pub name_value_list: OneOrMany<NameValue>,
}

/// One specification attribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameValue {
    /// Attribute name, e.g. `"Brand"`.
    pub name: String,
    /// Attribute value(s); multi-valued specifics are possible.
    #[serde(default)]
    pub value: OneOrMany<String>,
}

impl NameValue {
    /// Flattens multi-valued specifics to a single comma-joined string.
    pub fn joined_value(&self) -> String {
        self.value.to_vec().join(", ")
    }
}

/// Envelope of the per-item detail response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemDetailResponse {
    /// The enriched listing.
    pub item: ListingItem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_item_array_normalizes_to_list() {
        let raw = r#"{
            "PaginationResult": {"TotalNumberOfEntries": 1, "TotalNumberOfPages": 1},
            "ReturnedItemCountActual": 1,
            "ItemArray": {"Item": {
                "ItemID": "1001",
                "Title": "Widget",
                "Quantity": 1,
                "SellingStatus": {"ListingStatus": "Active", "QuantitySold": 0},
                "ListingDetails": {"StartTime": "2020-02-01T10:00:00.000Z", "EndTime": "2020-03-01T10:00:00.000Z"},
                "PrimaryCategory": {"CategoryID": "11450", "CategoryName": "Widgets"}
            }}
        }"#;
        let page: SellerListPage = serde_json::from_str(raw).unwrap();
        let items = page.items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "1001");
    }

    #[test]
    fn missing_item_array_yields_empty_list() {
        let raw = r#"{
            "PaginationResult": {"TotalNumberOfEntries": 0, "TotalNumberOfPages": 0},
            "ReturnedItemCountActual": 0
        }"#;
        let page: SellerListPage = serde_json::from_str(raw).unwrap();
        assert!(page.items().is_empty());
    }

    #[test]
    fn single_picture_url_normalizes() {
        let raw = r#"{"PictureURL": "https://img.example/a.jpg"}"#;
        let pd: PictureDetails = serde_json::from_str(raw).unwrap();
        assert_eq!(pd.picture_url.to_vec(), vec!["https://img.example/a.jpg"]);

        let raw = r#"{"PictureURL": ["https://img.example/a.jpg", "https://img.example/b.jpg"]}"#;
        let pd: PictureDetails = serde_json::from_str(raw).unwrap();
        assert_eq!(pd.picture_url.to_vec().len(), 2);
    }

    #[test]
    fn multi_valued_specific_joins_with_comma() {
        let raw = r#"{"Name": "Ports", "Value": ["USB-C", "HDMI"]}"#;
        let nv: NameValue = serde_json::from_str(raw).unwrap();
        assert_eq!(nv.joined_value(), "USB-C, HDMI");

        let raw = r#"{"Name": "Brand", "Value": "Acme"}"#;
        let nv: NameValue = serde_json::from_str(raw).unwrap();
        assert_eq!(nv.joined_value(), "Acme");
    }
}
