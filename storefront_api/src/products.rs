//! Product payload shapes for the storefront REST API.

use serde::{Deserialize, Serialize};

/// The storefront caps bulk operations at this many ids per call.
pub const BATCH_DELETE_LIMIT: usize = 100;

/// Payload for creating a product.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    /// Product display name.
    pub name: String,
    /// Product kind; the shim only creates `"simple"` products.
    #[serde(rename = "type")]
    pub product_type: String,
    /// Seller SKU; unique on the destination.
    pub sku: String,
    /// Full description HTML.
    pub description: String,
    /// Short blurb shown in listings.
    pub short_description: String,
    /// Publication status; created products go straight to `"publish"`.
    pub status: String,
    /// Destination category assignments; empty means uncategorized.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<CategoryRef>,
}

/// Reference to a destination category by id.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRef {
    /// Destination category id.
    pub id: i64,
}

/// One product attribute, as the storefront's attribute list expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute values; the shim always sends a single-valued list.
    pub options: Vec<String>,
    /// Shown on the product page.
    pub visible: bool,
    /// Whether the attribute drives variations; never, for synced items.
    pub variation: bool,
}

impl ProductAttribute {
    /// A visible, non-variation attribute with a single value.
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: vec![value.into()],
            visible: true,
            variation: false,
        }
    }
}

/// The subset of a product response the shim cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductResponse {
    /// Destination-assigned product id.
    pub id: i64,
}
