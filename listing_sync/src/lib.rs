//! Listing sync core: a local SQLite cache of marketplace listings, the
//! pull that fills it, and the push that mirrors it onto a storefront.
//!
//! The cache is the system of record for everything the push does. The
//! source side talks to the marketplace through the
//! [`marketplace_api::ListingSource`] trait; the destination side talks to
//! the storefront through [`storefront_api::StorefrontApi`]. Pushes run on
//! a pool of OS worker threads, each with its own cache connection.

#![deny(missing_docs)]

pub mod cache;
pub mod db;
pub mod dest;
pub mod models;
pub mod queue;
pub mod schema;
pub mod source;

pub use cache::ListingCache;
pub use dest::{DestCommand, DestinationSync};
pub use source::{SourceCommand, SourceSync};
