//! Filter types for per-column filtering.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::loader::OptionsProvider;

/// How a column value is matched against data.
///
/// The type selects both the editor a host should render and the operator
/// the outgoing parameter builder emits. The `-between` variants take a
/// 2-element array value; everything else takes a scalar.
///
/// # Example
///
/// ```
/// use gridquery_lib::column::FilterType;
///
/// assert_eq!(FilterType::NumberBetween.as_str(), "number-between");
/// assert_eq!(FilterType::parse("text-exact"), Some(FilterType::TextExact));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// Substring match (`_like`). The default.
    Text,
    /// Exact string match.
    TextExact,
    /// Exact numeric match.
    Number,
    /// Numeric range, value is `[low, high]`.
    NumberBetween,
    /// Numeric lower bound (`_gte`).
    NumberGreater,
    /// Numeric upper bound (`_lte`).
    NumberLower,
    /// Exact match against a fixed or loaded option list.
    Select,
    /// Exact date match (ISO `YYYY-MM-DD`).
    Date,
    /// Date range, value is `[from, to]`.
    DateBetween,
}

impl FilterType {
    /// Returns the wire name of this type (`text`, `number-between`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            FilterType::Text => "text",
            FilterType::TextExact => "text-exact",
            FilterType::Number => "number",
            FilterType::NumberBetween => "number-between",
            FilterType::NumberGreater => "number-greater",
            FilterType::NumberLower => "number-lower",
            FilterType::Select => "select",
            FilterType::Date => "date",
            FilterType::DateBetween => "date-between",
        }
    }

    /// Parses a wire name back into a filter type.
    pub fn parse(s: &str) -> Option<FilterType> {
        Some(match s {
            "text" => FilterType::Text,
            "text-exact" => FilterType::TextExact,
            "number" => FilterType::Number,
            "number-between" => FilterType::NumberBetween,
            "number-greater" => FilterType::NumberGreater,
            "number-lower" => FilterType::NumberLower,
            "select" => FilterType::Select,
            "date" => FilterType::Date,
            "date-between" => FilterType::DateBetween,
            _ => return None,
        })
    }

    /// Returns `true` for the `-between` variants, which take a 2-element
    /// array value.
    pub fn is_range(self) -> bool {
        matches!(self, FilterType::NumberBetween | FilterType::DateBetween)
    }

    /// Returns the editor family this type belongs to.
    ///
    /// An editor offers the family types that the column's `extends` list
    /// (plus the current type) allows, see [`FilterSpec::editor_types`].
    pub fn family(self) -> &'static [FilterType] {
        match self {
            FilterType::Text | FilterType::TextExact => &[FilterType::Text, FilterType::TextExact],
            FilterType::Number
            | FilterType::NumberBetween
            | FilterType::NumberGreater
            | FilterType::NumberLower => &[
                FilterType::Number,
                FilterType::NumberGreater,
                FilterType::NumberLower,
                FilterType::NumberBetween,
            ],
            FilterType::Select => &[FilterType::Select],
            FilterType::Date | FilterType::DateBetween => {
                &[FilterType::Date, FilterType::DateBetween]
            }
        }
    }

    /// Checks that a value's shape matches this type.
    ///
    /// Scalars for scalar types, 2-element arrays for `-between` types, and
    /// ISO dates (`YYYY-MM-DD`) for the date types. Null and the empty
    /// string are valid for every type; they mean "no filter".
    pub fn validate(self, value: &Value) -> bool {
        if is_empty_value(value) {
            return true;
        }

        match self {
            FilterType::Text | FilterType::TextExact => value.is_string(),
            FilterType::Number => value.is_number(),
            FilterType::NumberGreater | FilterType::NumberLower => value.is_number(),
            FilterType::NumberBetween => match value.as_array() {
                Some(pair) => pair.len() == 2 && pair.iter().all(Value::is_number),
                None => false,
            },
            // Select options carry arbitrary scalar values
            FilterType::Select => !value.is_array() && !value.is_object(),
            FilterType::Date => is_iso_date(value),
            FilterType::DateBetween => match value.as_array() {
                Some(pair) => pair.len() == 2 && pair.iter().all(is_iso_date),
                None => false,
            },
        }
    }

    /// Coerces a raw editor value for this type.
    ///
    /// Mirrors the editor rules: a `NumberBetween`/`DateBetween` value with a
    /// missing bound collapses to empty, as does anything that fails
    /// [`FilterType::validate`]. Returns `Value::Null` for "no filter".
    pub fn coerce(self, value: Value) -> Value {
        if self.is_range() {
            let complete = value
                .as_array()
                .is_some_and(|pair| pair.len() == 2 && !pair.iter().any(is_empty_value));
            if !complete {
                return Value::Null;
            }
        }

        if self.validate(&value) { value } else { Value::Null }
    }
}

impl Default for FilterType {
    fn default() -> Self {
        FilterType::Text
    }
}

impl std::fmt::Display for FilterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` when a value means "no filter": JSON null or `""`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn is_iso_date(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
}

/// One choice offered by a select filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Display label; falls back to the value when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The value sent as the filter constraint.
    pub value: Value,
}

impl SelectOption {
    /// Creates an option with a label.
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: Some(label.into()),
            value: value.into(),
        }
    }

    /// Creates an option whose label is the value itself.
    pub fn bare(value: impl Into<Value>) -> Self {
        Self {
            label: None,
            value: value.into(),
        }
    }
}

/// Where a select filter's choices come from.
#[derive(Clone)]
pub enum FilterOptions {
    /// A fixed list known up front.
    Static(Vec<SelectOption>),
    /// An async provider queried as the user types, see
    /// [`OptionsLoader`](crate::loader::OptionsLoader).
    Provider(Arc<dyn OptionsProvider>),
}

impl FilterOptions {
    /// Returns the static option list, if this is a static source.
    pub fn as_static(&self) -> Option<&[SelectOption]> {
        match self {
            FilterOptions::Static(options) => Some(options),
            FilterOptions::Provider(_) => None,
        }
    }

    /// Returns the async provider, if this is a provider source.
    pub fn provider(&self) -> Option<Arc<dyn OptionsProvider>> {
        match self {
            FilterOptions::Static(_) => None,
            FilterOptions::Provider(provider) => Some(Arc::clone(provider)),
        }
    }
}

impl std::fmt::Debug for FilterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterOptions::Static(options) => f.debug_tuple("Static").field(options).finish(),
            FilterOptions::Provider(_) => f.debug_tuple("Provider").field(&"..").finish(),
        }
    }
}

impl From<Vec<SelectOption>> for FilterOptions {
    fn from(options: Vec<SelectOption>) -> Self {
        FilterOptions::Static(options)
    }
}

/// Per-column filter configuration and live value.
///
/// Declared on a [`ColumnSpec`](super::ColumnSpec); after normalization a
/// clone of it becomes the live state held by the
/// [`FilterStore`](crate::store::FilterStore).
#[derive(Debug, Clone)]
pub struct FilterSpec {
    /// Current filter type. Starts at the declared type and may be switched
    /// by the user within the `extends` set.
    pub filter_type: FilterType,
    /// Additional types the editor may switch to. After normalization this
    /// always starts with the declared type, deduplicated.
    pub extends: Vec<FilterType>,
    /// Current value; `None` or an empty value means "no filter".
    pub value: Option<Value>,
    /// Choices for [`FilterType::Select`].
    pub options: Option<FilterOptions>,
    /// Outgoing parameter key override; defaults to the column key.
    pub filter_key: Option<String>,
    /// Disabled filters keep their state but emit no outgoing parameters.
    pub enabled: bool,
}

impl FilterSpec {
    /// Creates a filter of the given type.
    pub fn new(filter_type: FilterType) -> Self {
        Self {
            filter_type,
            extends: Vec::new(),
            value: None,
            options: None,
            filter_key: None,
            enabled: true,
        }
    }

    /// Creates the default text filter (shorthand for `filter: true`).
    pub fn text() -> Self {
        Self::new(FilterType::Text)
    }

    /// Adds types the editor may switch to.
    pub fn extend(mut self, types: impl IntoIterator<Item = FilterType>) -> Self {
        self.extends.extend(types);
        self
    }

    /// Sets the select option source.
    pub fn options(mut self, options: impl Into<FilterOptions>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Overrides the outgoing parameter key.
    pub fn filter_key(mut self, key: impl Into<String>) -> Self {
        self.filter_key = Some(key.into());
        self
    }

    /// Marks the filter disabled: state is kept but nothing is emitted.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Returns `true` when the filter currently holds a non-empty value.
    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !is_empty_value(v))
    }

    /// Types the editor should offer: the current type's family restricted
    /// to the `extends` set plus the current type itself.
    pub fn editor_types(&self) -> Vec<FilterType> {
        self.filter_type
            .family()
            .iter()
            .copied()
            .filter(|t| *t == self.filter_type || self.extends.contains(t))
            .collect()
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::text()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for ty in [
            FilterType::Text,
            FilterType::TextExact,
            FilterType::Number,
            FilterType::NumberBetween,
            FilterType::NumberGreater,
            FilterType::NumberLower,
            FilterType::Select,
            FilterType::Date,
            FilterType::DateBetween,
        ] {
            assert_eq!(FilterType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(FilterType::parse("bogus"), None);
    }

    #[test]
    fn test_validate_shapes() {
        assert!(FilterType::Text.validate(&json!("abc")));
        assert!(!FilterType::Text.validate(&json!(3)));
        assert!(FilterType::NumberBetween.validate(&json!([3, 7])));
        assert!(!FilterType::NumberBetween.validate(&json!(3)));
        assert!(!FilterType::NumberBetween.validate(&json!([3])));
        assert!(FilterType::Date.validate(&json!("2024-01-31")));
        assert!(!FilterType::Date.validate(&json!("not a date")));
        assert!(FilterType::DateBetween.validate(&json!(["2024-01-01", "2024-02-01"])));
        // empty means "no filter" and is always valid
        assert!(FilterType::Number.validate(&json!(null)));
        assert!(FilterType::Number.validate(&json!("")));
    }

    #[test]
    fn test_coerce_incomplete_range() {
        assert_eq!(FilterType::NumberBetween.coerce(json!([3])), json!(null));
        assert_eq!(
            FilterType::NumberBetween.coerce(json!([3, null])),
            json!(null)
        );
        assert_eq!(FilterType::NumberBetween.coerce(json!([3, 7])), json!([3, 7]));
        assert_eq!(FilterType::Number.coerce(json!("oops")), json!(null));
    }

    #[test]
    fn test_editor_types_respect_extends() {
        let spec = FilterSpec::new(FilterType::Number)
            .extend([FilterType::NumberBetween, FilterType::NumberGreater]);
        assert_eq!(
            spec.editor_types(),
            vec![
                FilterType::Number,
                FilterType::NumberGreater,
                FilterType::NumberBetween,
            ]
        );

        let bare = FilterSpec::new(FilterType::Text);
        assert_eq!(bare.editor_types(), vec![FilterType::Text]);
    }
}
