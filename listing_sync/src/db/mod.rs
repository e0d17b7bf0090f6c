//! Database utilities for connections and schema migrations.
//!
//! [`connection::connect_sqlite`] opens a tuned connection (WAL,
//! foreign_keys=ON, 5000ms busy_timeout); [`migrate::run_sqlite`] applies
//! the embedded Diesel migrations.

pub mod connection;
pub mod migrate;
