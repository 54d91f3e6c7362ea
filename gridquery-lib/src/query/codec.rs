//! URL query string codec.
//!
//! The URL layout uses the reserved keys `page`, `size`, `sort` and `desc`,
//! plus one `<key>` parameter per active filter (JSON-encoded value) and an
//! optional `<key>_type` parameter when the live filter type differs from
//! the column's declared default.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::column::ColumnDescriptor;
use crate::column::FilterType;
use crate::column::is_empty_value;
use crate::error::DecodeError;

use super::params::FilterParam;
use super::params::TableParams;

/// Reserved URL key for the 1-based page number.
pub const PAGE_KEY: &str = "page";
/// Reserved URL key for the page size.
pub const SIZE_KEY: &str = "size";
/// Reserved URL key for the sorted column.
pub const SORT_KEY: &str = "sort";
/// Reserved URL key for the sort direction.
pub const DESC_KEY: &str = "desc";
/// Suffix of the per-filter type tag parameter.
pub const TYPE_SUFFIX: &str = "_type";

/// Table state recovered from a URL query string.
///
/// Every field is optional; absent parameters stay `None` so the options
/// layer can apply its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlState {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
    /// Wire sort field, resolved to the matched column's `sort_key`
    /// (falling back to the column key). `None` when the URL names no
    /// known column.
    pub sort: Option<String>,
    /// Raw column key of the sorted column as it appears in the URL.
    pub sort_column: Option<String>,
    /// Sort direction; true iff the parameter equals `"true"`.
    pub desc: Option<bool>,
    /// Per-column filter values keyed by column key.
    pub filters: BTreeMap<String, FilterParam>,
}

/// Decodes a URL query string against the column list.
///
/// Only keys matching a filterable column are treated as filter state; the
/// filter type comes from the sibling `<key>_type` parameter when present,
/// else from the column's declared type. Malformed JSON in a filter value
/// is an error, not a silent drop.
pub fn decode(query: &str, columns: &[ColumnDescriptor]) -> Result<UrlState, DecodeError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let lookup = |key: &str| -> Option<&str> {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let mut state = UrlState::default();

    if let Some(raw) = lookup(PAGE_KEY) {
        state.page = Some(parse_number(PAGE_KEY, raw)?);
    }
    if let Some(raw) = lookup(SIZE_KEY) {
        state.size = Some(parse_number(SIZE_KEY, raw)?);
    }
    if let Some(raw) = lookup(SORT_KEY)
        && let Some(column) = columns.iter().find(|c| c.key == raw)
    {
        state.sort = Some(column.sort_field().to_string());
        state.sort_column = Some(column.key.clone());
    }
    if let Some(raw) = lookup(DESC_KEY) {
        state.desc = Some(raw == "true");
    }

    for (key, raw) in &pairs {
        let Some(column) = columns.iter().find(|c| &c.key == key) else {
            continue;
        };
        let Some(declared) = column.filter.as_ref() else {
            continue;
        };

        let filter_type = match lookup(&format!("{}{}", key, TYPE_SUFFIX)) {
            Some(tag) => FilterType::parse(tag)
                .ok_or_else(|| DecodeError::FilterType(tag.to_string()))?,
            None => declared.filter_type,
        };

        let value = serde_json::from_str(raw)
            .map_err(|source| DecodeError::filter_value(key.clone(), source))?;

        state
            .filters
            .insert(key.clone(), FilterParam { value, filter_type });
    }

    Ok(state)
}

fn parse_number(key: &str, raw: &str) -> Result<u32, DecodeError> {
    raw.parse().map_err(|_| DecodeError::number(key, raw))
}

/// Encodes table state into a full replacement query string (no leading
/// `?`, no merge with unrelated parameters).
///
/// Filter values are JSON-encoded; a `<key>_type` tag is only emitted when
/// the live type differs from the column's declared default, keeping the
/// URL free of noise for untouched filters.
pub fn encode(params: &TableParams, columns: &[ColumnDescriptor]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    serializer.append_pair(SIZE_KEY, &params.size.to_string());
    serializer.append_pair(PAGE_KEY, &params.page.to_string());
    if let Some(sort) = &params.sort {
        serializer.append_pair(SORT_KEY, sort);
    }
    if let Some(desc) = params.desc {
        serializer.append_pair(DESC_KEY, if desc { "true" } else { "false" });
    }

    for (key, filter) in &params.filters {
        if is_empty_value(&filter.value) {
            continue;
        }

        // to_string on a Value cannot fail
        let value = serde_json::to_string(&filter.value).unwrap_or_default();
        serializer.append_pair(key, &value);

        let declared = columns
            .iter()
            .find(|c| &c.key == key)
            .and_then(|c| c.filter.as_ref())
            .map(|f| f.filter_type);
        if declared != Some(filter.filter_type) {
            serializer.append_pair(
                &format!("{}{}", key, TYPE_SUFFIX),
                filter.filter_type.as_str(),
            );
        }
    }

    serializer.finish()
}

/// Where the encoded query string lives.
///
/// Hosts back this with their history API (replacing the query without a
/// reload); tests and headless hosts use [`MemoryUrl`]. Writes are
/// destructive: the engine always replaces the full query string.
pub trait UrlStore: Send {
    /// Returns the current query string (with or without a leading `?`).
    fn query(&self) -> String;

    /// Replaces the full query string.
    fn replace_query(&mut self, query: &str);
}

/// An in-memory [`UrlStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryUrl {
    query: String,
}

impl MemoryUrl {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with a query string.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl UrlStore for MemoryUrl {
    fn query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        self.query = query.to_string();
    }
}
