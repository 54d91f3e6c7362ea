//! Column normalization and filter seeding.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::query::FilterParam;
use crate::store::FilterEntry;

use super::filter::FilterSpec;
use super::spec::Column;
use super::spec::ColumnDescriptor;
use super::spec::Columns;

/// Flattens a declarative column map into an ordered descriptor list.
///
/// Bare-string entries become label-only columns. For filterable columns the
/// `extends` list is resolved to the declared type followed by the declared
/// extensions, deduplicated. Duplicate keys keep the first declaration.
pub(crate) fn normalize(columns: &Columns) -> Vec<ColumnDescriptor> {
    let mut descriptors: Vec<ColumnDescriptor> = Vec::with_capacity(columns.entries.len());

    for (key, column) in &columns.entries {
        if descriptors.iter().any(|d| &d.key == key) {
            log::warn!("duplicate column key '{}', keeping first declaration", key);
            continue;
        }

        let descriptor = match column {
            Column::Label(label) => ColumnDescriptor {
                key: key.clone(),
                label: Some(label.clone()),
                can_sort: true,
                sort_key: None,
                width: None,
                filter: None,
            },
            Column::Spec(spec) => ColumnDescriptor {
                key: key.clone(),
                label: spec.label.clone(),
                can_sort: spec.can_sort.unwrap_or(true),
                sort_key: spec.sort_key.clone(),
                width: spec.width,
                filter: spec.filter.as_ref().map(resolve_extends),
            },
        };

        descriptors.push(descriptor);
    }

    descriptors
}

fn resolve_extends(declared: &FilterSpec) -> FilterSpec {
    let mut filter = declared.clone();
    let mut extends = vec![filter.filter_type];
    for ty in &declared.extends {
        if !extends.contains(ty) {
            extends.push(*ty);
        }
    }
    filter.extends = extends;
    filter
}

/// Builds the initial live filter list from the normalized columns.
///
/// Values recovered from the URL are merged into each filterable column,
/// including an explicit type tag when the URL carried one. Preset values
/// from the table options merge on top, except where the URL value carries
/// an explicit type tag (a decoded type diverging from the declared one);
/// those outrank presets. Columns without a filter are excluded.
pub(crate) fn seed_filters(
    descriptors: &[ColumnDescriptor],
    url_filters: &BTreeMap<String, FilterParam>,
    presets: Option<&BTreeMap<String, Value>>,
) -> Vec<FilterEntry> {
    descriptors
        .iter()
        .filter_map(|descriptor| {
            let declared = descriptor.filter.as_ref()?;
            let mut filter = declared.clone();

            let url = url_filters.get(&descriptor.key);
            if let Some(url) = url {
                filter.filter_type = url.filter_type;
                filter.value = Some(url.value.clone());
            }

            let url_tagged = url.is_some_and(|u| u.filter_type != declared.filter_type);
            if let Some(value) = presets.and_then(|p| p.get(&descriptor.key))
                && !url_tagged
            {
                filter.filter_type = declared.filter_type;
                filter.value = Some(value.clone());
            }

            Some(FilterEntry {
                key: descriptor.key.clone(),
                label: descriptor.label.clone(),
                filter,
            })
        })
        .collect()
}
