//! Client for the destination storefront.
//!
//! Two remote surfaces live behind one trait: the storefront's product REST
//! API (create/update/delete, capped batch delete) and its content-management
//! media API (binary uploads, slug lookups). [`StorefrontApi`] is the
//! interface the sync layer programs against; [`client::StorefrontClient`]
//! is the blocking HTTP implementation.

pub mod client;
pub mod errors;
pub mod media;
pub mod products;

pub use client::{StorefrontApi, StorefrontClient};
pub use errors::{StorefrontError, StorefrontInitError};
