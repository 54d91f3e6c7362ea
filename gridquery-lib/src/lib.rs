//! Table state and query synchronization engine
//!
//! Keeps a data table's page, sort, filter, search and selection state in one
//! place, synchronized with a URL query string and projected into the
//! parameter shape of the backing REST API. The host renders; the engine
//! decides what to fetch and when.

pub mod column;
pub mod error;
pub mod loader;
pub mod options;
pub mod query;
pub mod rest;
pub mod selection;
pub mod store;

mod table;

pub use table::*;
