//! REST query contract shared with the backing API.
//!
//! The engine never performs HTTP itself; it only produces parameter maps in
//! the shape this module describes. The host owns the client, performs the
//! fetch, and feeds `data`/`total` back into the table.
//!
//! Reserved parameters:
//!
//! | parameter | meaning |
//! |-----------|---------|
//! | `_page`   | 1-based page number |
//! | `_limit`  | page size |
//! | `_sort`   | sort field, JSON null when unsorted |
//! | `_order`  | `asc`/`desc`, JSON null when unsorted |
//!
//! Filter constraints are either an exact field match (`field=value`) or an
//! operator-suffixed key (`field_like`, `field_gte`, `field_lte`, `field_ne`).

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// 1-based page number parameter.
pub const PAGE_PARAM: &str = "_page";
/// Page size parameter.
pub const LIMIT_PARAM: &str = "_limit";
/// Sort field parameter.
pub const SORT_PARAM: &str = "_sort";
/// Sort direction parameter.
pub const ORDER_PARAM: &str = "_order";

/// Sort direction as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Order {
    /// Returns the wire representation (`asc`/`desc`).
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }

    /// Builds an order from a descending flag.
    pub fn from_desc(desc: bool) -> Self {
        if desc { Order::Desc } else { Order::Asc }
    }
}

/// Comparison operator appended to a field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Substring match: `field_like`.
    Like,
    /// Less than or equal: `field_lte`.
    Lte,
    /// Greater than or equal: `field_gte`.
    Gte,
    /// Not equal: `field_ne`.
    Ne,
}

impl Operator {
    /// Returns the key suffix for this operator.
    pub fn suffix(self) -> &'static str {
        match self {
            Operator::Like => "_like",
            Operator::Lte => "_lte",
            Operator::Gte => "_gte",
            Operator::Ne => "_ne",
        }
    }

    /// Appends this operator's suffix to a field key.
    pub fn apply(self, key: &str) -> String {
        format!("{}{}", key, self.suffix())
    }
}

/// One page of rows as returned by the backing API.
///
/// `total` is the number of records matching the query across all pages
/// (the `X-Total-Count` header of json-server style backends).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResponse {
    /// Rows of the requested page.
    pub data: Vec<Value>,
    /// Total matching records across all pages.
    pub total: u64,
}

impl PageResponse {
    /// Creates a page response.
    pub fn new(data: Vec<Value>, total: u64) -> Self {
        Self { data, total }
    }
}
