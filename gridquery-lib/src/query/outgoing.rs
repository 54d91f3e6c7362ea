//! Outgoing REST parameter builder.

use serde_json::Value;
use serde_json::json;

use crate::column::FilterType;
use crate::column::is_empty_value;
use crate::rest::LIMIT_PARAM;
use crate::rest::ORDER_PARAM;
use crate::rest::Operator;
use crate::rest::Order;
use crate::rest::PAGE_PARAM;
use crate::rest::SORT_PARAM;
use crate::store::FilterEntry;

use super::params::OutgoingParams;

/// Builds the filter constraints for the backing API.
///
/// Each entry with a non-empty value contributes one or two parameters under
/// its effective key (`filter_key` override or the column key), mapped from
/// the filter type to the REST operator contract. Returns `None` when no
/// entry is active, so callers can distinguish "no filters" from an empty
/// object when merging.
pub fn build_filters(entries: &[FilterEntry]) -> Option<OutgoingParams> {
    let mut params: Option<OutgoingParams> = None;

    for entry in entries {
        if !entry.filter.enabled {
            continue;
        }
        let Some(value) = entry.filter.value.as_ref() else {
            continue;
        };
        if is_empty_value(value) {
            continue;
        }

        let key = entry.filter.filter_key.as_deref().unwrap_or(&entry.key);
        if key.is_empty() {
            continue;
        }

        let constraints: Vec<(String, Value)> = match entry.filter.filter_type {
            FilterType::Date | FilterType::Number | FilterType::Select | FilterType::TextExact => {
                vec![(key.to_string(), value.clone())]
            }
            FilterType::NumberGreater => vec![(Operator::Gte.apply(key), value.clone())],
            FilterType::NumberLower => vec![(Operator::Lte.apply(key), value.clone())],
            FilterType::NumberBetween | FilterType::DateBetween => {
                match value.as_array().map(Vec::as_slice) {
                    Some([low, high]) => vec![
                        (Operator::Gte.apply(key), low.clone()),
                        (Operator::Lte.apply(key), high.clone()),
                    ],
                    _ => {
                        log::warn!(
                            "range filter '{}' holds a non-pair value, skipping",
                            entry.key
                        );
                        continue;
                    }
                }
            }
            FilterType::Text => vec![(Operator::Like.apply(key), value.clone())],
        };

        params
            .get_or_insert_with(OutgoingParams::new)
            .extend(constraints);
    }

    params
}

/// Builds the pagination and sort parameters.
///
/// `sort` is the already-resolved wire sort field plus the descending flag.
/// When unsorted, `_sort` and `_order` are emitted as explicit JSON nulls
/// (the backend treats null, asc and desc as a tri-state).
pub fn build_page_params(page: u32, size: u32, sort: Option<(&str, bool)>) -> OutgoingParams {
    let mut params = OutgoingParams::new();
    params.insert(LIMIT_PARAM.to_string(), json!(size));
    params.insert(PAGE_PARAM.to_string(), json!(page));

    match sort {
        Some((field, desc)) => {
            params.insert(SORT_PARAM.to_string(), json!(field));
            params.insert(
                ORDER_PARAM.to_string(),
                json!(Order::from_desc(desc).as_str()),
            );
        }
        None => {
            params.insert(SORT_PARAM.to_string(), Value::Null);
            params.insert(ORDER_PARAM.to_string(), Value::Null);
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::column::FilterSpec;

    use super::*;

    fn entry(key: &str, filter: FilterSpec) -> FilterEntry {
        FilterEntry {
            key: key.to_string(),
            label: None,
            filter,
        }
    }

    fn with_value(key: &str, ty: FilterType, value: Value) -> FilterEntry {
        let mut filter = FilterSpec::new(ty);
        filter.value = Some(value);
        entry(key, filter)
    }

    #[test]
    fn test_no_active_filters_is_none() {
        let entries = vec![
            entry("title", FilterSpec::text()),
            with_value("id", FilterType::Number, json!(null)),
            with_value("body", FilterType::Text, json!("")),
        ];
        assert_eq!(build_filters(&entries), None);
    }

    #[test]
    fn test_text_maps_to_like() {
        let entries = vec![with_value("title", FilterType::Text, json!("abc"))];
        let params = build_filters(&entries).unwrap();
        assert_eq!(params["title_like"], json!("abc"));
        assert!(!params.contains_key("title"));
    }

    #[test]
    fn test_exact_types_map_to_bare_key() {
        let entries = vec![
            with_value("id", FilterType::Number, json!(5)),
            with_value("user", FilterType::Select, json!(3)),
            with_value("name", FilterType::TextExact, json!("x")),
            with_value("at", FilterType::Date, json!("2024-01-31")),
        ];
        let params = build_filters(&entries).unwrap();
        assert_eq!(params["id"], json!(5));
        assert_eq!(params["user"], json!(3));
        assert_eq!(params["name"], json!("x"));
        assert_eq!(params["at"], json!("2024-01-31"));
    }

    #[test]
    fn test_bounds_map_to_gte_lte() {
        let entries = vec![
            with_value("low", FilterType::NumberGreater, json!(3)),
            with_value("high", FilterType::NumberLower, json!(7)),
        ];
        let params = build_filters(&entries).unwrap();
        assert_eq!(params["low_gte"], json!(3));
        assert_eq!(params["high_lte"], json!(7));
    }

    #[test]
    fn test_between_emits_pair_and_omits_bare_key() {
        let entries = vec![with_value("id", FilterType::NumberBetween, json!([3, 7]))];
        let params = build_filters(&entries).unwrap();
        assert_eq!(params["id_gte"], json!(3));
        assert_eq!(params["id_lte"], json!(7));
        assert!(!params.contains_key("id"));
    }

    #[test]
    fn test_malformed_range_value_is_skipped() {
        let entries = vec![with_value("id", FilterType::NumberBetween, json!(3))];
        assert_eq!(build_filters(&entries), None);
    }

    #[test]
    fn test_filter_key_overrides_column_key() {
        let mut filter = FilterSpec::new(FilterType::Text).filter_key("author.name");
        filter.value = Some(json!("kim"));
        let params = build_filters(&[entry("author", filter)]).unwrap();
        assert_eq!(params["author.name_like"], json!("kim"));
    }

    #[test]
    fn test_disabled_filter_is_skipped() {
        let mut filter = FilterSpec::text().disabled();
        filter.value = Some(json!("abc"));
        assert_eq!(build_filters(&[entry("title", filter)]), None);
    }

    #[test]
    fn test_page_params_sorted() {
        let params = build_page_params(2, 25, Some(("userId", true)));
        assert_eq!(params["_limit"], json!(25));
        assert_eq!(params["_page"], json!(2));
        assert_eq!(params["_sort"], json!("userId"));
        assert_eq!(params["_order"], json!("desc"));
    }

    #[test]
    fn test_page_params_unsorted_emits_nulls() {
        let params = build_page_params(1, 5, None);
        assert_eq!(params["_sort"], Value::Null);
        assert_eq!(params["_order"], Value::Null);
    }
}
