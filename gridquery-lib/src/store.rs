//! Filter context store: the live per-column filter state.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::column::FilterSpec;
use crate::column::FilterType;

/// A live filterable column: the normalized column identity plus its
/// mutable filter state.
#[derive(Debug, Clone)]
pub struct FilterEntry {
    /// Column key; lookup identity within the store.
    pub key: String,
    /// Header label, carried for editor display.
    pub label: Option<String>,
    /// The live filter state.
    pub filter: FilterSpec,
}

/// Listener invoked with the full entry list after a filter mutation.
pub type FilterListener = Box<dyn Fn(&[FilterEntry]) + Send>;

/// Owns the ordered list of filterable columns and their current values.
///
/// The store is seeded exactly once from the normalizer; subsequent seed
/// calls are ignored so URL-recovered values and in-flight user edits are
/// never discarded by a re-normalization.
///
/// Mutations touch only the entry matching the target key; every other
/// entry keeps its content untouched.
#[derive(Default)]
pub struct FilterStore {
    entries: Vec<FilterEntry>,
    listeners: Vec<FilterListener>,
}

impl FilterStore {
    /// Creates an empty, unseeded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the store holds entries.
    pub fn is_seeded(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Seeds the entry list. No-op when already seeded.
    pub(crate) fn seed(&mut self, entries: Vec<FilterEntry>) {
        if self.is_seeded() {
            log::debug!("filter store already seeded, ignoring re-seed");
            return;
        }
        self.entries = entries;
    }

    /// Returns the live entry list.
    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    /// Finds an entry by column key.
    pub fn get(&self, key: &str) -> Option<&FilterEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// Registers a listener notified after `set_filter` and `clear_filters`.
    pub fn on_filter(&mut self, listener: impl Fn(&[FilterEntry]) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Sets a filter's value, optionally switching its operator type.
    ///
    /// No-op for an empty or unknown key. The merge is non-destructive:
    /// `extends`, `options`, `filter_key` and `enabled` are preserved, and
    /// the type only changes when an operator is supplied.
    ///
    /// Returns `true` when an entry was updated.
    pub fn set_filter(&mut self, key: &str, value: Value, operator: Option<FilterType>) -> bool {
        if key.is_empty() {
            return false;
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) else {
            log::debug!("set_filter on unknown key '{}', ignoring", key);
            return false;
        };

        if let Some(operator) = operator {
            entry.filter.filter_type = operator;
        }
        entry.filter.value = Some(value);

        log::trace!("filter '{}' set to {:?}", key, entry.filter.value);
        self.notify();
        true
    }

    /// Removes every entry's value, keeping type, extends and options.
    pub fn clear_filters(&mut self) {
        for entry in &mut self.entries {
            entry.filter.value = None;
        }
        self.notify();
    }

    /// Merges supplied values into matching entries.
    ///
    /// Used to re-seed values when the host's initial filter props change.
    /// Unlike `set_filter` this does not run the listeners; the table
    /// facade decides whether the change warrants a notification.
    pub fn apply_initial(&mut self, values: &BTreeMap<String, Value>) {
        for entry in &mut self.entries {
            if let Some(value) = values.get(&entry.key) {
                entry.filter.value = Some(value.clone());
            }
        }
    }

    /// Entries currently holding a non-empty value, as key/value pairs.
    pub fn active_filters(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .filter(|e| e.filter.has_value())
            .filter_map(|e| Some((e.key.clone(), e.filter.value.clone()?)))
            .collect()
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.entries);
        }
    }
}

impl std::fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterStore")
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    fn store() -> FilterStore {
        let mut store = FilterStore::new();
        store.seed(vec![
            FilterEntry {
                key: "id".to_string(),
                label: Some("Id".to_string()),
                filter: FilterSpec::new(FilterType::Number)
                    .extend([FilterType::Number, FilterType::NumberBetween]),
            },
            FilterEntry {
                key: "title".to_string(),
                label: Some("Title".to_string()),
                filter: FilterSpec::text(),
            },
        ]);
        store
    }

    #[test]
    fn test_set_filter_touches_only_the_target_entry() {
        let mut store = store();
        store.set_filter("title", json!("abc"), None);
        store.set_filter("id", json!([3, 7]), Some(FilterType::NumberBetween));

        let title = store.get("title").unwrap();
        assert_eq!(title.filter.value, Some(json!("abc")));
        assert_eq!(title.filter.filter_type, FilterType::Text);

        let id = store.get("id").unwrap();
        assert_eq!(id.filter.value, Some(json!([3, 7])));
        assert_eq!(id.filter.filter_type, FilterType::NumberBetween);
        // non-destructive merge keeps the extends list
        assert_eq!(
            id.filter.extends,
            vec![FilterType::Number, FilterType::NumberBetween]
        );
    }

    #[test]
    fn test_set_filter_empty_or_unknown_key_is_a_noop() {
        let mut store = store();
        assert!(!store.set_filter("", json!("x"), None));
        assert!(!store.set_filter("nope", json!("x"), None));
        assert!(store.entries().iter().all(|e| e.filter.value.is_none()));
    }

    #[test]
    fn test_clear_filters_keeps_configuration() {
        let mut store = store();
        store.set_filter("id", json!(5), None);
        store.set_filter("title", json!("abc"), None);
        store.clear_filters();

        for entry in store.entries() {
            assert!(entry.filter.value.is_none());
        }
        let id = store.get("id").unwrap();
        assert_eq!(id.filter.filter_type, FilterType::Number);
        assert_eq!(
            id.filter.extends,
            vec![FilterType::Number, FilterType::NumberBetween]
        );
    }

    #[test]
    fn test_seed_once() {
        let mut store = store();
        store.seed(vec![]);
        assert_eq!(store.entries().len(), 2);

        store.set_filter("id", json!(1), None);
        store.seed(vec![FilterEntry {
            key: "other".to_string(),
            label: None,
            filter: FilterSpec::text(),
        }]);
        assert_eq!(store.get("id").unwrap().filter.value, Some(json!(1)));
    }

    #[test]
    fn test_listeners_run_on_mutation_but_not_on_apply_initial() {
        let mut store = store();
        let calls = Arc::new(Mutex::new(0));
        let seen = Arc::clone(&calls);
        store.on_filter(move |_| *seen.lock().unwrap() += 1);

        store.set_filter("id", json!(5), None);
        store.clear_filters();
        assert_eq!(*calls.lock().unwrap(), 2);

        let mut initial = BTreeMap::new();
        initial.insert("title".to_string(), json!("abc"));
        store.apply_initial(&initial);
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(store.get("title").unwrap().filter.value, Some(json!("abc")));
    }

    #[test]
    fn test_active_filters_projection() {
        let mut store = store();
        store.set_filter("id", json!(5), None);
        store.set_filter("title", json!(""), None);

        let active = store.active_filters();
        assert_eq!(active.len(), 1);
        assert_eq!(active["id"], json!(5));
    }
}
