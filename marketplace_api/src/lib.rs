//! Client for the marketplace listing API.
//!
//! This crate defines the [`ListingSource`] trait, which is the interface the
//! sync layer uses to pull listings: a paginated bulk call over a date window
//! plus a per-item detail call. The HTTP implementation is
//! [`client::MarketplaceClient`]; tests substitute a scripted fake.

pub mod client;
pub mod errors;
pub mod params;
pub mod response;

pub use client::{ListingSource, MarketplaceClient};
pub use errors::{MarketplaceError, MarketplaceInitError};
pub use params::{DateWindow, SellerListParams, WindowDimension};
