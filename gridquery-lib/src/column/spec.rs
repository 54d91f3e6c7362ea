//! Declarative column definitions and their normalized form.

use super::filter::FilterSpec;

/// A declarative column: either a bare label or a full spec.
///
/// # Example
///
/// ```
/// use gridquery_lib::column::{ColumnSpec, Columns, FilterSpec};
///
/// let columns = Columns::new()
///     .column("id", ColumnSpec::new().label("Id").width(5))
///     .column("title", ColumnSpec::new().label("Title").filter(FilterSpec::text()))
///     .column("body", "Body");
/// ```
#[derive(Debug, Clone)]
pub enum Column {
    /// Shorthand: just a header label.
    Label(String),
    /// Full column configuration.
    Spec(ColumnSpec),
}

impl From<&str> for Column {
    fn from(label: &str) -> Self {
        Column::Label(label.to_string())
    }
}

impl From<String> for Column {
    fn from(label: String) -> Self {
        Column::Label(label)
    }
}

impl From<ColumnSpec> for Column {
    fn from(spec: ColumnSpec) -> Self {
        Column::Spec(spec)
    }
}

/// Full configuration for one column.
#[derive(Debug, Clone, Default)]
pub struct ColumnSpec {
    /// Header label.
    pub label: Option<String>,
    /// Whether header clicks may sort by this column. Defaults to `true`.
    pub can_sort: Option<bool>,
    /// Wire sort field when it differs from the column key.
    pub sort_key: Option<String>,
    /// Relative width hint for the host's layout.
    pub width: Option<u16>,
    /// Filter configuration; absent columns are not filterable.
    pub filter: Option<FilterSpec>,
}

impl ColumnSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the header label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Disables sorting for this column.
    pub fn no_sort(mut self) -> Self {
        self.can_sort = Some(false);
        self
    }

    /// Sets the wire sort field.
    pub fn sort_key(mut self, key: impl Into<String>) -> Self {
        self.sort_key = Some(key.into());
        self
    }

    /// Sets the width hint.
    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    /// Attaches a filter.
    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attaches the default text filter (shorthand for `filter: true`).
    pub fn filterable(mut self) -> Self {
        self.filter = Some(FilterSpec::text());
        self
    }
}

/// An ordered declarative column map, keyed by data field.
///
/// Keys must be unique; on a duplicate the first declaration wins and the
/// rest are dropped during normalization.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    pub(crate) entries: Vec<(String, Column)>,
}

impl Columns {
    /// Creates an empty column map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column under the given key.
    pub fn column(mut self, key: impl Into<String>, column: impl Into<Column>) -> Self {
        self.entries.push((key.into(), column.into()));
        self
    }

    /// Returns the number of declared columns.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no columns are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A normalized column, produced once from [`Columns`].
///
/// Immutable after normalization; the live per-column filter state is a
/// separate copy owned by the [`FilterStore`](crate::store::FilterStore).
/// The `filter` here keeps the *declared* configuration, which the URL codec
/// uses to decide when a `<key>_type` parameter is needed.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Data field key; identity of the column.
    pub key: String,
    /// Header label.
    pub label: Option<String>,
    /// Whether the column is sortable.
    pub can_sort: bool,
    /// Wire sort field override.
    pub sort_key: Option<String>,
    /// Relative width hint.
    pub width: Option<u16>,
    /// Declared filter configuration, with `extends` resolved.
    pub filter: Option<FilterSpec>,
}

impl ColumnDescriptor {
    /// The field sent as `_sort` for this column: `sort_key` or the key.
    pub fn sort_field(&self) -> &str {
        self.sort_key.as_deref().unwrap_or(&self.key)
    }

    /// Returns `true` when the column carries a filter.
    pub fn is_filterable(&self) -> bool {
        self.filter.is_some()
    }
}
