//! Query synchronization: the URL codec and the outgoing REST parameter
//! builder.
//!
//! Two independent translations share the types in this module:
//!
//! - [`decode`]/[`encode`] map table state to and from the URL query string
//!   (host-facing, human-shareable keys: `page`, `size`, `sort`, `desc`,
//!   plus JSON-encoded per-column filter values);
//! - [`build_filters`]/[`build_page_params`] map the same state to the
//!   operator-suffixed parameter shape of the backing REST API.

mod codec;
mod outgoing;
mod params;

pub use codec::*;
pub use outgoing::*;
pub use params::*;
