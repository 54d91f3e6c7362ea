//! The table engine: canonical state, change actions and notifications.

use std::collections::BTreeMap;

use serde_json::Value;
use serde_json::json;

use crate::column::ColumnDescriptor;
use crate::column::Columns;
use crate::column::FilterType;
use crate::column::normalize;
use crate::column::seed_filters;
use crate::error::DecodeError;
use crate::options::TableOptions;
use crate::query::FilterParam;
use crate::query::OutgoingParams;
use crate::query::TableParams;
use crate::query::UrlStore;
use crate::query::build_filters;
use crate::query::build_page_params;
use crate::query::decode;
use crate::query::encode;
use crate::selection::HeaderState;
use crate::selection::SelectionTracker;
use crate::store::FilterEntry;
use crate::store::FilterStore;

/// Default key under which the global search text is sent.
pub const DEFAULT_SEARCH_KEY: &str = "q";

/// What caused a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    /// First notification after construction.
    Init,
    /// A sort header was toggled or cleared.
    Sort,
    /// The page changed.
    Page,
    /// The page size changed.
    Size,
    /// The outgoing filter projection changed.
    Filter,
    /// The global search text changed.
    Search,
    /// An explicit reload was requested.
    Refresh,
}

impl TableAction {
    /// Returns the action's name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            TableAction::Init => "init",
            TableAction::Sort => "sort",
            TableAction::Page => "page",
            TableAction::Size => "size",
            TableAction::Filter => "filter",
            TableAction::Search => "search",
            TableAction::Refresh => "refresh",
        }
    }
}

/// Callback invoked with the outgoing parameters after every state change
/// that warrants a fetch.
pub type ChangeListener = Box<dyn FnMut(&OutgoingParams, TableAction) + Send>;

/// An imperative snapshot of the table's canonical state.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    /// 1-based page.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Sorted column key.
    pub sort: Option<String>,
    /// Sort direction.
    pub desc: Option<bool>,
    /// Active filter values keyed by column key.
    pub filters: BTreeMap<String, Value>,
    /// Selected row ids.
    pub selected: Vec<Value>,
}

/// Derived pagination state for rendering controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Current 1-based page.
    pub page: u32,
    /// Last reachable page; 0 when no data is loaded.
    pub page_total: u32,
    /// Total row count reported by the backend.
    pub total: u64,
    /// Number of selected rows across all pages.
    pub selected: usize,
    /// Whether first/previous are available.
    pub has_prev: bool,
    /// Whether next/last are available.
    pub has_next: bool,
}

impl PageInfo {
    /// Renders the "N items (M selected)" summary line.
    pub fn summary(&self) -> String {
        if self.selected > 0 {
            format!("{} items ({} selected)", self.total, self.selected)
        } else {
            format!("{} items", self.total)
        }
    }
}

/// Builds a [`TableState`] from columns, options and an optional URL store.
pub struct TableBuilder {
    columns: Columns,
    options: TableOptions,
    id_field: String,
    search_key: String,
    url: Option<Box<dyn UrlStore>>,
    listener: Option<ChangeListener>,
}

impl TableBuilder {
    /// Creates a builder for the given columns.
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            options: TableOptions::default(),
            id_field: crate::selection::DEFAULT_ROW_ID.to_string(),
            search_key: DEFAULT_SEARCH_KEY.to_string(),
            url: None,
            listener: None,
        }
    }

    /// Sets the table options.
    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the row identifier field used by selection.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Sets the outgoing key for the global search text.
    pub fn search_key(mut self, key: impl Into<String>) -> Self {
        self.search_key = key.into();
        self
    }

    /// Attaches a URL store; state is recovered from it on build and every
    /// notification writes the replacement query string back.
    pub fn url_store(mut self, url: impl UrlStore + 'static) -> Self {
        self.url = Some(Box::new(url));
        self
    }

    /// Sets the change callback; the host fetches data in response and feeds
    /// it back through [`TableState::set_data`].
    pub fn on_change(
        mut self,
        listener: impl FnMut(&OutgoingParams, TableAction) + Send + 'static,
    ) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Normalizes the columns, recovers URL state and seeds the engine.
    ///
    /// Fails when the URL query string holds malformed state.
    pub fn build(self) -> Result<TableState, DecodeError> {
        let columns = normalize(&self.columns);

        let query = self.url.as_ref().map(|u| u.query()).unwrap_or_default();
        let url_state = decode(&query, &columns)?;
        let resolved = self.options.resolve(&url_state);

        let mut store = FilterStore::new();
        store.seed(seed_filters(
            &columns,
            &url_state.filters,
            self.options.filters.as_ref(),
        ));

        let mut selection = SelectionTracker::new(self.id_field);
        selection.set_selected(self.options.selected.clone());
        selection.set_disabled(self.options.disabled_select_ids.clone());

        Ok(TableState {
            columns,
            store,
            selection,
            page: resolved.page,
            size: resolved.size,
            sort: resolved.sort,
            desc: resolved.desc,
            rows_choices: resolved.rows,
            search_key: self.search_key,
            search: None,
            data: Vec::new(),
            total: 0,
            hidden: self.options.hidden,
            controllers: self.options.controllers,
            wrap_cells: self.options.wrap_cells,
            disable_sort: self.options.disable_sort,
            url: self.url,
            listener: self.listener,
            last_filters: None,
            initialized: false,
        })
    }
}

/// The table engine.
///
/// Owns the canonical page/size/sort state, the filter store and the
/// selection tracker. Mutators run synchronously: they update state, persist
/// the URL and invoke the change callback exactly once, tagged with the
/// [`TableAction`] that caused it. Filter mutations are the exception; they
/// only notify when the outgoing filter projection actually changed.
pub struct TableState {
    columns: Vec<ColumnDescriptor>,
    store: FilterStore,
    selection: SelectionTracker,
    page: u32,
    size: u32,
    sort: Option<String>,
    desc: Option<bool>,
    rows_choices: Vec<u32>,
    search_key: String,
    search: Option<String>,
    data: Vec<Value>,
    total: u64,
    hidden: Vec<String>,
    controllers: bool,
    wrap_cells: bool,
    disable_sort: bool,
    url: Option<Box<dyn UrlStore>>,
    listener: Option<ChangeListener>,
    last_filters: Option<OutgoingParams>,
    initialized: bool,
}

impl TableState {
    /// Fires the initial notification. At most once per instance; later
    /// calls are no-ops.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.emit(TableAction::Init);
    }

    /// Toggles sorting on a column: unsorted to ascending to descending and
    /// back to unsorted. No-op when sorting is disabled for the table or the
    /// column.
    pub fn toggle_sort(&mut self, key: &str) {
        if self.disable_sort {
            return;
        }
        let Some(column) = self.columns.iter().find(|c| c.key == key) else {
            return;
        };
        if !column.can_sort {
            return;
        }

        if self.sort.as_deref() != Some(key) {
            self.sort = Some(key.to_string());
            self.desc = Some(false);
        } else if self.desc == Some(false) {
            self.desc = Some(true);
        } else {
            self.sort = None;
            self.desc = None;
        }
        self.emit(TableAction::Sort);
    }

    /// Removes the sort.
    pub fn clear_sort(&mut self) {
        if self.sort.is_none() {
            return;
        }
        self.sort = None;
        self.desc = None;
        self.emit(TableAction::Sort);
    }

    /// Moves to a page, clamped to at least 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
        self.emit(TableAction::Page);
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, size: u32) {
        self.size = size.max(1);
        self.page = 1;
        self.emit(TableAction::Size);
    }

    /// Sets a filter value, optionally switching its operator type.
    ///
    /// The value is coerced for the effective type first (incomplete ranges
    /// collapse to empty). Notifies with [`TableAction::Filter`] only when
    /// the outgoing filter projection changed.
    pub fn set_filter(&mut self, key: &str, value: Value, operator: Option<FilterType>) {
        let Some(current) = self.store.get(key).map(|e| e.filter.filter_type) else {
            log::debug!("set_filter on unknown key '{}', ignoring", key);
            return;
        };
        let effective = operator.unwrap_or(current);
        self.store.set_filter(key, effective.coerce(value), operator);
        self.emit_filter_if_changed();
    }

    /// Clears every filter value.
    pub fn clear_filters(&mut self) {
        self.store.clear_filters();
        self.emit_filter_if_changed();
    }

    /// Re-applies host-supplied preset filter values.
    pub fn apply_initial_filters(&mut self, values: &BTreeMap<String, Value>) {
        self.store.apply_initial(values);
        self.emit_filter_if_changed();
    }

    /// Sets the global search text; empty text clears it. Notifies only
    /// when the text changed.
    pub fn set_global_search(&mut self, text: impl Into<String>) {
        let text = text.into();
        let next = if text.is_empty() { None } else { Some(text) };
        if next == self.search {
            return;
        }
        self.search = next;
        self.emit(TableAction::Search);
    }

    /// Requests a reload with the current parameters.
    pub fn refresh(&mut self) {
        self.emit(TableAction::Refresh);
    }

    /// Feeds a fetched page back into the table.
    ///
    /// Clamps the current page into the new page range. Does not notify;
    /// the data is the response to a notification, not a cause for one.
    pub fn set_data(&mut self, data: Vec<Value>, total: u64) {
        self.data = data;
        self.total = total;
        let page_total = self.page_total();
        if page_total >= 1 && self.page > page_total {
            log::debug!("page {} beyond new page total {}, clamping", self.page, page_total);
            self.page = page_total;
        }
    }

    /// Toggles a row's selection by id.
    pub fn toggle_select(&mut self, id: Value) -> bool {
        self.selection.toggle(id)
    }

    /// Applies the header checkbox to the current page.
    pub fn select_all(&mut self, checked: bool) {
        let rows = std::mem::take(&mut self.data);
        self.selection.set_all(&rows, checked);
        self.data = rows;
    }

    /// Reconciles the cross-page selection against a host-side per-page
    /// selection primitive.
    pub fn reconcile_page_selection(&mut self, page_selected: &[Value]) {
        let rows = std::mem::take(&mut self.data);
        self.selection.reconcile(&rows, page_selected);
        self.data = rows;
    }

    /// Returns the header checkbox summary for the current page.
    pub fn header_state(&self) -> HeaderState {
        self.selection.header_state(&self.data)
    }

    /// Returns the selection tracker.
    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Returns the live filter entries for rendering editors.
    pub fn filter_entries(&self) -> &[FilterEntry] {
        self.store.entries()
    }

    /// Registers a listener on filter store mutations.
    pub fn on_filter(&mut self, listener: impl Fn(&[FilterEntry]) + Send + 'static) {
        self.store.on_filter(listener);
    }

    /// Returns the normalized columns.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Returns the columns not hidden by the options.
    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !self.hidden.contains(&c.key))
            .collect()
    }

    /// Returns the current page's rows.
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Returns the page-size choices.
    pub fn rows_choices(&self) -> &[u32] {
        &self.rows_choices
    }

    /// Whether the host should render pagination controls.
    pub fn controllers(&self) -> bool {
        self.controllers
    }

    /// Whether the host should wrap long cell content.
    pub fn wrap_cells(&self) -> bool {
        self.wrap_cells
    }

    /// Returns the current outgoing parameters without notifying.
    pub fn params(&self) -> OutgoingParams {
        self.outgoing()
    }

    /// Returns an imperative snapshot of the canonical state.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
            desc: self.desc,
            filters: self.store.active_filters(),
            selected: self.selection.selected().to_vec(),
        }
    }

    /// Returns the derived pagination state.
    pub fn page_info(&self) -> PageInfo {
        let page_total = self.page_total();
        PageInfo {
            page: self.page,
            page_total,
            total: self.total,
            selected: self.selection.len(),
            has_prev: self.page > 1,
            has_next: self.page < page_total,
        }
    }

    fn page_total(&self) -> u32 {
        (self.total / u64::from(self.size)) as u32
    }

    fn emit_filter_if_changed(&mut self) {
        let filters = build_filters(self.store.entries());
        if filters == self.last_filters {
            log::trace!("filter projection unchanged, skipping notification");
            return;
        }
        self.emit(TableAction::Filter);
    }

    /// Persists the URL and runs the change callback.
    fn emit(&mut self, action: TableAction) {
        let filters = build_filters(self.store.entries());
        let params = self.outgoing();

        if self.url.is_some() {
            let encoded = encode(&self.url_params(), &self.columns);
            if let Some(url) = &mut self.url {
                url.replace_query(&encoded);
            }
        }

        log::debug!("table change: action={} params={:?}", action.as_str(), params);
        if let Some(mut listener) = self.listener.take() {
            listener(&params, action);
            self.listener = Some(listener);
        }

        self.last_filters = filters;
    }

    fn outgoing(&self) -> OutgoingParams {
        let sort = self.sort.as_deref().map(|key| {
            let field = self
                .columns
                .iter()
                .find(|c| c.key == key)
                .map(|c| c.sort_field())
                .unwrap_or(key);
            (field, self.desc.unwrap_or(false))
        });

        let mut params = build_page_params(self.page, self.size, sort);
        if let Some(filters) = build_filters(self.store.entries()) {
            params.extend(filters);
        }
        if let Some(text) = &self.search {
            params.insert(self.search_key.clone(), json!(text));
        }
        params
    }

    fn url_params(&self) -> TableParams {
        let filters = self
            .store
            .entries()
            .iter()
            .filter(|e| e.filter.has_value())
            .filter_map(|e| {
                let value = e.filter.value.clone()?;
                Some((
                    e.key.clone(),
                    FilterParam {
                        value,
                        filter_type: e.filter.filter_type,
                    },
                ))
            })
            .collect();

        TableParams {
            page: self.page,
            size: self.size,
            sort: self.sort.clone(),
            desc: self.desc,
            filters,
        }
    }
}

impl std::fmt::Debug for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableState")
            .field("page", &self.page)
            .field("size", &self.size)
            .field("sort", &self.sort)
            .field("desc", &self.desc)
            .field("total", &self.total)
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use crate::column::ColumnSpec;
    use crate::column::FilterSpec;
    use crate::query::MemoryUrl;

    use super::*;

    type Emitted = Arc<Mutex<Vec<(OutgoingParams, TableAction)>>>;

    fn columns() -> Columns {
        Columns::new()
            .column(
                "id",
                ColumnSpec::new().label("Id").filter(
                    FilterSpec::new(FilterType::Number).extend([FilterType::NumberBetween]),
                ),
            )
            .column("title", ColumnSpec::new().label("Title").filterable())
            .column("user", ColumnSpec::new().label("User").sort_key("userId"))
            .column("body", ColumnSpec::new().label("Body").no_sort())
    }

    fn table(emitted: &Emitted) -> TableState {
        let sink = Arc::clone(emitted);
        TableBuilder::new(columns())
            .on_change(move |params, action| {
                sink.lock().unwrap().push((params.clone(), action));
            })
            .build()
            .unwrap()
    }

    fn actions(emitted: &Emitted) -> Vec<TableAction> {
        emitted.lock().unwrap().iter().map(|(_, a)| *a).collect()
    }

    #[test]
    fn test_init_notifies_once() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);

        table.init();
        table.init();

        let log = emitted.lock().unwrap();
        assert_eq!(log.len(), 1);
        let (params, action) = &log[0];
        assert_eq!(*action, TableAction::Init);
        assert_eq!(params["_page"], json!(1));
        assert_eq!(params["_limit"], json!(5));
        assert_eq!(params["_sort"], Value::Null);
        assert_eq!(params["_order"], Value::Null);
    }

    #[test]
    fn test_sort_cycle() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.toggle_sort("user");
        table.toggle_sort("user");
        table.toggle_sort("user");

        let log = emitted.lock().unwrap();
        assert_eq!(log.len(), 4);
        // sort_key resolves to the wire field
        assert_eq!(log[1].0["_sort"], json!("userId"));
        assert_eq!(log[1].0["_order"], json!("asc"));
        assert_eq!(log[2].0["_order"], json!("desc"));
        assert_eq!(log[3].0["_sort"], Value::Null);
    }

    #[test]
    fn test_unsortable_column_is_a_noop() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.toggle_sort("body");
        table.toggle_sort("nope");
        assert_eq!(actions(&emitted), vec![TableAction::Init]);
    }

    #[test]
    fn test_disable_sort_blocks_all_columns() {
        let emitted: Emitted = Arc::default();
        let sink = Arc::clone(&emitted);
        let mut table = TableBuilder::new(columns())
            .options(TableOptions::new().no_sort())
            .on_change(move |params, action| {
                sink.lock().unwrap().push((params.clone(), action));
            })
            .build()
            .unwrap();
        table.init();

        table.toggle_sort("title");
        assert_eq!(actions(&emitted), vec![TableAction::Init]);
    }

    #[test]
    fn test_page_and_size_gestures() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.set_page(3);
        table.set_page_size(25);

        let log = emitted.lock().unwrap();
        assert_eq!(log[1].1, TableAction::Page);
        assert_eq!(log[1].0["_page"], json!(3));
        // size change returns to the first page
        assert_eq!(log[2].1, TableAction::Size);
        assert_eq!(log[2].0["_page"], json!(1));
        assert_eq!(log[2].0["_limit"], json!(25));
    }

    #[test]
    fn test_filter_notifies_only_on_projection_change() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.set_filter("title", json!("abc"), None);
        table.set_filter("title", json!("abc"), None);

        assert_eq!(actions(&emitted), vec![TableAction::Init, TableAction::Filter]);
        let log = emitted.lock().unwrap();
        assert_eq!(log[1].0["title_like"], json!("abc"));
    }

    #[test]
    fn test_clear_without_active_filters_is_silent() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.clear_filters();
        assert_eq!(actions(&emitted), vec![TableAction::Init]);

        table.set_filter("title", json!("abc"), None);
        table.clear_filters();
        assert_eq!(
            actions(&emitted),
            vec![TableAction::Init, TableAction::Filter, TableAction::Filter]
        );
    }

    #[test]
    fn test_incomplete_range_filter_stays_silent() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        // one bound missing coerces to empty, projection unchanged
        table.set_filter("id", json!([3, null]), Some(FilterType::NumberBetween));
        assert_eq!(actions(&emitted), vec![TableAction::Init]);

        table.set_filter("id", json!([3, 7]), Some(FilterType::NumberBetween));
        let log = emitted.lock().unwrap();
        assert_eq!(log[1].0["id_gte"], json!(3));
        assert_eq!(log[1].0["id_lte"], json!(7));
    }

    #[test]
    fn test_search_dedupes_and_clears() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();

        table.set_global_search("rust");
        table.set_global_search("rust");
        table.set_global_search("");

        let log = emitted.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[1].1, TableAction::Search);
        assert_eq!(log[1].0["q"], json!("rust"));
        assert!(!log[2].0.contains_key("q"));
    }

    #[test]
    fn test_refresh_always_notifies() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();
        table.refresh();
        assert_eq!(actions(&emitted), vec![TableAction::Init, TableAction::Refresh]);
    }

    #[test]
    fn test_set_data_clamps_page_without_notifying() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.init();
        table.set_page(9);

        table.set_data(vec![json!({"id": 1})], 10);
        // 10 items at size 5 leaves 2 pages
        assert_eq!(table.snapshot().page, 2);
        assert_eq!(actions(&emitted), vec![TableAction::Init, TableAction::Page]);
    }

    #[test]
    fn test_url_seeding_and_persistence() {
        let emitted: Emitted = Arc::default();
        let sink = Arc::clone(&emitted);
        let url = SharedUrl::default();
        *url.0.lock().unwrap() =
            "page=2&size=10&sort=user&desc=true&title=%22abc%22".to_string();

        let mut table = TableBuilder::new(columns())
            .url_store(url.clone())
            .on_change(move |params, action| {
                sink.lock().unwrap().push((params.clone(), action));
            })
            .build()
            .unwrap();
        table.init();

        {
            let log = emitted.lock().unwrap();
            let (params, _) = &log[0];
            assert_eq!(params["_page"], json!(2));
            assert_eq!(params["_limit"], json!(10));
            assert_eq!(params["_sort"], json!("userId"));
            assert_eq!(params["_order"], json!("desc"));
            assert_eq!(params["title_like"], json!("abc"));
        }

        table.set_page(5);
        let query = url.0.lock().unwrap().clone();
        assert!(query.contains("page=5"));
        assert!(query.contains("sort=user"));
        assert!(query.contains("title=%22abc%22"));
    }

    #[test]
    fn test_preset_filters_win_over_url() {
        let mut table = TableBuilder::new(columns())
            .url_store(MemoryUrl::with_query("title=%22from-url%22"))
            .options(TableOptions::new().filter("title", "preset"))
            .build()
            .unwrap();
        table.init();

        assert_eq!(table.params()["title_like"], json!("preset"));
    }

    #[test]
    fn test_malformed_url_fails_the_build() {
        let result = TableBuilder::new(columns())
            .url_store(MemoryUrl::with_query("title=not-json"))
            .build();
        assert!(matches!(result, Err(DecodeError::FilterValue { .. })));
    }

    #[test]
    fn test_page_info_summary() {
        let emitted: Emitted = Arc::default();
        let mut table = table(&emitted);
        table.set_data(vec![json!({"id": 1}), json!({"id": 2})], 100);
        table.toggle_select(json!(1));

        let info = table.page_info();
        assert_eq!(info.page_total, 20);
        assert!(!info.has_prev);
        assert!(info.has_next);
        assert_eq!(info.summary(), "100 items (1 selected)");
    }

    #[derive(Clone, Default)]
    struct SharedUrl(Arc<Mutex<String>>);

    impl UrlStore for SharedUrl {
        fn query(&self) -> String {
            self.0.lock().unwrap().clone()
        }

        fn replace_query(&mut self, query: &str) {
            *self.0.lock().unwrap() = query.to_string();
        }
    }
}
