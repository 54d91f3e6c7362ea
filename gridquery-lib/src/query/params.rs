//! Canonical table parameter types.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::column::FilterType;

/// One live filter constraint: a value plus the type it was entered under.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParam {
    /// The JSON value; scalar, or a 2-element array for `-between` types.
    pub value: Value,
    /// The filter type in effect for this value.
    pub filter_type: FilterType,
}

/// The canonical internal table state, serializable to and from the URL.
///
/// `sort` holds the *column key* as shown in the URL; the wire sort field
/// (a column's `sort_key`) is resolved against the column list only when
/// building outgoing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TableParams {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page, greater than zero.
    pub size: u32,
    /// Sorted column key, if any.
    pub sort: Option<String>,
    /// Sort direction; `None` when unsorted.
    pub desc: Option<bool>,
    /// Active filters keyed by column key.
    pub filters: BTreeMap<String, FilterParam>,
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            sort: None,
            desc: None,
            filters: BTreeMap::new(),
        }
    }
}

/// Outgoing REST parameters: flat string keys to JSON values.
///
/// `_sort`/`_order` are present with JSON null when unsorted (the backend's
/// tri-state contract), so the map is never sparse for the reserved keys.
pub type OutgoingParams = BTreeMap<String, Value>;
