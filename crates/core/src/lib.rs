//! Domain types and pure logic for the historical figures catalog.
//!
//! Nothing in this crate touches the database, the network, or the
//! filesystem; the storage and import crates build on it.

pub mod coercion;
pub mod error;
pub mod fields;
pub mod types;
pub mod upsert;
