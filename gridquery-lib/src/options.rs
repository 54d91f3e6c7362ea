//! Table options and their resolution against URL-recovered state.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::query::UrlState;

/// Default page-size choices offered by the size selector.
pub const DEFAULT_ROWS: [u32; 3] = [5, 10, 25];

/// Host-supplied table configuration.
///
/// Everything is optional; unset fields fall back to URL-recovered state and
/// then to the built-in defaults, see [`TableOptions::resolve`].
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Initial 1-based page.
    pub page: Option<u32>,
    /// Initial page size.
    pub size: Option<u32>,
    /// Initially sorted column key.
    pub sort: Option<String>,
    /// Initial sort direction.
    pub desc: Option<bool>,
    /// Page-size choices; the first entry is the fallback size.
    pub rows: Option<Vec<u32>>,
    /// Preset filter values keyed by column key. These win over values
    /// recovered from the URL.
    pub filters: Option<BTreeMap<String, Value>>,
    /// Initially selected row ids.
    pub selected: Vec<Value>,
    /// Row ids excluded from selection.
    pub disabled_select_ids: Vec<Value>,
    /// Column keys hidden from display (state is still tracked).
    pub hidden: Vec<String>,
    /// Whether the host should render pagination controls.
    pub controllers: bool,
    /// Whether the host should wrap long cell content.
    pub wrap_cells: bool,
    /// Disables sorting for the whole table regardless of column config.
    pub disable_sort: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            page: None,
            size: None,
            sort: None,
            desc: None,
            rows: None,
            filters: None,
            selected: Vec::new(),
            disabled_select_ids: Vec::new(),
            hidden: Vec::new(),
            controllers: true,
            wrap_cells: false,
            disable_sort: false,
        }
    }
}

impl TableOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the initial page size.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the initially sorted column and direction.
    pub fn sort(mut self, column: impl Into<String>, desc: bool) -> Self {
        self.sort = Some(column.into());
        self.desc = Some(desc);
        self
    }

    /// Sets the page-size choices.
    pub fn rows(mut self, rows: impl Into<Vec<u32>>) -> Self {
        self.rows = Some(rows.into());
        self
    }

    /// Adds a preset filter value.
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Sets the initially selected row ids.
    pub fn selected(mut self, ids: impl Into<Vec<Value>>) -> Self {
        self.selected = ids.into();
        self
    }

    /// Excludes row ids from selection.
    pub fn disable_select(mut self, ids: impl Into<Vec<Value>>) -> Self {
        self.disabled_select_ids = ids.into();
        self
    }

    /// Hides columns from display.
    pub fn hidden(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hidden = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Hides the pagination controls.
    pub fn no_controllers(mut self) -> Self {
        self.controllers = false;
        self
    }

    /// Asks the host to wrap long cell content.
    pub fn wrap_cells(mut self) -> Self {
        self.wrap_cells = true;
        self
    }

    /// Disables sorting for the whole table.
    pub fn no_sort(mut self) -> Self {
        self.disable_sort = true;
        self
    }

    /// Resolves the initial table parameters, field by field.
    ///
    /// Precedence per field: explicit option, then URL-recovered state, then
    /// the built-in default (page 1, size = first rows choice). Deliberately
    /// not a deep merge; each field is decided on its own.
    pub fn resolve(&self, url: &UrlState) -> ResolvedOptions {
        let rows = self.rows.clone().unwrap_or_else(|| DEFAULT_ROWS.to_vec());
        let fallback_size = rows.first().copied().unwrap_or(DEFAULT_ROWS[0]);

        ResolvedOptions {
            page: self.page.or(url.page).unwrap_or(1).max(1),
            size: self.size.or(url.size).unwrap_or(fallback_size).max(1),
            sort: self.sort.clone().or_else(|| url.sort_column.clone()),
            desc: self.desc.or(url.desc),
            rows,
        }
    }
}

/// Initial table parameters after defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    /// 1-based page, at least 1.
    pub page: u32,
    /// Page size, at least 1.
    pub size: u32,
    /// Sorted column key, if any.
    pub sort: Option<String>,
    /// Sort direction.
    pub desc: Option<bool>,
    /// Page-size choices.
    pub rows: Vec<u32>,
}
