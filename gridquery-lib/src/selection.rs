//! Row selection that survives page changes and data reloads.

use serde_json::Value;

/// Default row identifier field.
pub const DEFAULT_ROW_ID: &str = "id";

/// Header checkbox summary for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderState {
    /// Rows on the page that may be toggled (not disabled).
    pub selectable: usize,
    /// Rows on the page currently selected (disabled ones included).
    pub selected: usize,
    /// Checked when every selectable row is selected.
    pub checked: bool,
    /// Some but not all page rows are selected.
    pub indeterminate: bool,
    /// No row on the page can be toggled.
    pub disabled: bool,
}

/// Tracks selected row identifiers across page boundaries.
///
/// The table only ever holds the current page's rows, so selection is keyed
/// by a configurable identifier field instead of row position. Rows whose
/// id is in the disabled list are skipped by select-all and cannot be
/// toggled, but stay selected if they were selected before being disabled;
/// selection and disablement intersect only when a new select-all is issued.
#[derive(Debug, Clone)]
pub struct SelectionTracker {
    id_field: String,
    selected: Vec<Value>,
    disabled: Vec<Value>,
}

impl SelectionTracker {
    /// Creates a tracker keyed by the given identifier field.
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            selected: Vec::new(),
            disabled: Vec::new(),
        }
    }

    /// Sets the ids excluded from select-all and toggling.
    pub fn set_disabled(&mut self, ids: Vec<Value>) {
        self.disabled = ids;
    }

    /// Replaces the selected set (initial selection from table options).
    pub fn set_selected(&mut self, ids: Vec<Value>) {
        self.selected = ids;
        self.selected.dedup();
    }

    /// Returns the identifier field name.
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Returns the selected ids in selection order.
    pub fn selected(&self) -> &[Value] {
        &self.selected
    }

    /// Returns the number of selected rows.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Returns `true` when nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Checks whether an id is selected.
    pub fn is_selected(&self, id: &Value) -> bool {
        self.selected.contains(id)
    }

    /// Checks whether an id is disabled.
    pub fn is_disabled(&self, id: &Value) -> bool {
        self.disabled.contains(id)
    }

    /// Extracts a row's identifier, falling back to its page position.
    pub fn row_id(&self, row: &Value, index: usize) -> Value {
        match row.get(&self.id_field) {
            Some(id) => id.clone(),
            None => Value::from(index),
        }
    }

    /// Toggles a single row. Disabled ids are a no-op.
    ///
    /// Returns the new selected state of the id.
    pub fn toggle(&mut self, id: Value) -> bool {
        if self.is_disabled(&id) {
            return self.is_selected(&id);
        }
        if let Some(pos) = self.selected.iter().position(|s| *s == id) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(id);
            true
        }
    }

    /// Applies the header checkbox to a page: selects every non-disabled
    /// row when `checked`, deselects them otherwise. Disabled rows keep
    /// whatever state they had.
    pub fn set_all(&mut self, page_rows: &[Value], checked: bool) {
        for (index, row) in page_rows.iter().enumerate() {
            let id = self.row_id(row, index);
            if self.is_disabled(&id) {
                continue;
            }
            match (checked, self.is_selected(&id)) {
                (true, false) => self.selected.push(id),
                (false, true) => {
                    self.selected.retain(|s| *s != id);
                }
                _ => {}
            }
        }
    }

    /// Reconciles the cross-page set against an external per-page primitive.
    ///
    /// New set = (previous minus every id present on the current page) plus
    /// the page's currently-selected ids. Selections made on other pages
    /// are untouched; this is how a selection on page N survives visiting
    /// page N+1 and coming back.
    pub fn reconcile(&mut self, page_rows: &[Value], page_selected: &[Value]) {
        let page_ids: Vec<Value> = page_rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.row_id(row, index))
            .collect();

        self.selected.retain(|id| !page_ids.contains(id));
        for id in page_selected {
            if !self.selected.contains(id) {
                self.selected.push(id.clone());
            }
        }
    }

    /// Ids of the page's rows that are currently selected, in row order.
    pub fn page_selected(&self, page_rows: &[Value]) -> Vec<Value> {
        page_rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.row_id(row, index))
            .filter(|id| self.is_selected(id))
            .collect()
    }

    /// Computes the header checkbox summary for a page.
    pub fn header_state(&self, page_rows: &[Value]) -> HeaderState {
        let mut selectable = 0;
        let mut selected = 0;

        for (index, row) in page_rows.iter().enumerate() {
            let id = self.row_id(row, index);
            if !self.is_disabled(&id) {
                selectable += 1;
            }
            if self.is_selected(&id) {
                selected += 1;
            }
        }

        HeaderState {
            selectable,
            selected,
            checked: selectable > 0 && selected >= selectable,
            indeterminate: selected > 0 && selected < page_rows.len(),
            disabled: selectable == 0,
        }
    }

    /// Clears the selection, disabled ids included.
    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ROW_ID)
    }
}
