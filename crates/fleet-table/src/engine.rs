//! Searched, sorted, paginated projection of a record list.
//!
//! Every query recomputes filter, then sort, then paginate over the current
//! records, so the same state always yields the same page.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use fleet_layout::{ColumnLayoutState, ColumnLayoutStore, KeyValueStore, MoveDirection};
use fleet_model::{AllowAll, CapabilityOracle, CellValue, ColumnDescriptor, ColumnSet, Record};

use crate::actions::RowActionSlots;
use crate::error::{Result, TableError};
use crate::export::ExportTable;
use crate::pagination::Pagination;
use crate::search::{SearchScope, normalize_term, record_matches, record_matches_columns};
use crate::sort::{SortDirection, SortState, compare_values, stable_sort_by};

/// Caller-supplied predicate ANDed with the search term.
pub type RecordFilter<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnHeader {
    /// Column key; the argument `set_sort` expects.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Whether the column declared itself sortable.
    pub sortable: bool,
    /// Direction when this column is the active sort key.
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// Id of the record behind this row.
    pub id: String,
    /// One cell per header, in header order.
    pub cells: Vec<CellValue>,
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    /// Visible columns in layout order.
    pub headers: Vec<ColumnHeader>,
    /// Rows of the current page only.
    pub rows: Vec<TableRow>,
    /// 1-based page shown, clamped into `1..=max(total_pages, 1)`.
    pub page: usize,
    /// `ceil(filtered_count / items_per_page)`; 0 when nothing matches.
    pub total_pages: usize,
    pub items_per_page: usize,
    /// Records passing the search term and custom filter.
    pub filtered_count: usize,
    /// Records held by the engine before filtering.
    pub total_count: usize,
}

pub struct TableViewEngine<R> {
    columns: ColumnSet<R>,
    layout: ColumnLayoutStore,
    records: Vec<R>,
    search_term: String,
    search_scope: SearchScope,
    custom_filter: Option<RecordFilter<R>>,
    sort: Option<SortState>,
    pagination: Pagination,
    resource_type: String,
    capabilities: Arc<dyn CapabilityOracle>,
}

impl<R: Record> TableViewEngine<R> {
    /// Open the column layout persisted under `storage_key` and start with
    /// no records, no search and no sort.
    pub fn new(
        columns: ColumnSet<R>,
        store: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        let layout = ColumnLayoutStore::open(store, storage_key, columns.as_slice());
        Self {
            columns,
            layout,
            records: Vec::new(),
            search_term: String::new(),
            search_scope: SearchScope::default(),
            custom_filter: None,
            sort: None,
            pagination: Pagination::default(),
            resource_type: String::new(),
            capabilities: Arc::new(AllowAll),
        }
    }

    #[must_use]
    pub fn with_records(mut self, records: Vec<R>) -> Self {
        self.records = records;
        self
    }

    #[must_use]
    pub fn with_items_per_page(mut self, items_per_page: usize) -> Self {
        self.pagination = Pagination::new(items_per_page);
        self
    }

    #[must_use]
    pub fn with_capabilities(
        mut self,
        resource_type: impl Into<String>,
        oracle: Arc<dyn CapabilityOracle>,
    ) -> Self {
        self.resource_type = resource_type.into();
        self.capabilities = oracle;
        self
    }

    #[must_use]
    pub fn with_search_scope(mut self, scope: SearchScope) -> Self {
        self.search_scope = scope;
        self
    }

    #[must_use]
    pub fn with_default_sort(mut self, key: &str, direction: SortDirection) -> Self {
        if self.columns.contains(key) {
            self.sort = Some(SortState {
                key: key.to_string(),
                direction,
            });
        }
        self
    }

    pub fn columns(&self) -> &ColumnSet<R> {
        &self.columns
    }

    pub fn layout(&self) -> &ColumnLayoutState {
        self.layout.state()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn set_records(&mut self, records: Vec<R>) {
        self.records = records;
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.pagination.reset();
    }

    pub fn set_search_scope(&mut self, scope: SearchScope) {
        self.search_scope = scope;
        self.pagination.reset();
    }

    pub fn set_custom_filter(&mut self, filter: Option<RecordFilter<R>>) {
        self.custom_filter = filter;
        self.pagination.reset();
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Activate `key` ascending, or flip its direction when already active.
    /// Returns `false` for keys outside the column set.
    pub fn set_sort(&mut self, key: &str) -> bool {
        if !self.columns.contains(key) {
            return false;
        }
        self.sort = match self.sort.take() {
            Some(state) if state.key == key => Some(SortState {
                direction: state.direction.flipped(),
                ..state
            }),
            _ => Some(SortState::ascending(key)),
        };
        tracing::debug!(key, sort = ?self.sort, "sort changed");
        true
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn set_page(&mut self, page: usize) {
        self.pagination.set_page(page);
    }

    pub fn set_items_per_page(&mut self, items_per_page: usize) {
        self.pagination.set_items_per_page(items_per_page);
    }

    pub fn items_per_page(&self) -> usize {
        self.pagination.items_per_page()
    }

    pub fn toggle_column(&mut self, key: &str) -> bool {
        let changed = self.layout.toggle(key);
        self.ensure_sort_visible();
        changed
    }

    pub fn move_column(&mut self, key: &str, direction: MoveDirection) -> bool {
        let changed = self.layout.move_column(key, direction);
        self.ensure_sort_visible();
        changed
    }

    pub fn reset_layout(&mut self) {
        self.layout.reset(self.columns.as_slice());
        self.ensure_sort_visible();
    }

    /// Visible columns in layout order.
    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor<R>> {
        self.layout
            .visible_keys()
            .into_iter()
            .filter_map(|key| self.columns.get(key))
            .collect()
    }

    pub fn filtered_records(&self) -> Vec<&R> {
        let needle = normalize_term(&self.search_term);
        let visible = match (self.search_scope, needle.is_some()) {
            (SearchScope::VisibleColumns, true) => self.visible_columns(),
            _ => Vec::new(),
        };
        self.records
            .iter()
            .filter(|record| match &needle {
                None => true,
                Some(needle) => match self.search_scope {
                    SearchScope::AllFields => record_matches(*record, needle),
                    SearchScope::VisibleColumns => {
                        record_matches_columns(*record, &visible, needle)
                    }
                },
            })
            .filter(|record| self.custom_filter.as_ref().is_none_or(|filter| filter(*record)))
            .collect()
    }

    /// Filtered records in sort order; unsorted when no sort is active.
    pub fn sorted_records(&self) -> Vec<&R> {
        let filtered = self.filtered_records();
        match &self.sort {
            Some(sort) => stable_sort_by(filtered, &mut |a: &&R, b: &&R| {
                compare_values(&a.value(&sort.key), &b.value(&sort.key), sort.direction)
            }),
            None => filtered,
        }
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_records().len()
    }

    pub fn total_pages(&self) -> usize {
        self.pagination.total_pages(self.filtered_count())
    }

    /// Requested page clamped to the available pages.
    pub fn current_page(&self) -> usize {
        self.pagination.current_page(self.filtered_count())
    }

    pub fn page_records(&self) -> Vec<&R> {
        let mut sorted = self.sorted_records();
        let range = self.pagination.range(sorted.len());
        sorted.truncate(range.end);
        sorted.drain(..range.start);
        sorted
    }

    pub fn view(&self) -> TableView {
        let columns = self.visible_columns();
        let headers = columns
            .iter()
            .map(|column| ColumnHeader {
                key: column.key.clone(),
                label: column.label.clone(),
                sortable: column.sortable,
                sort: self
                    .sort
                    .as_ref()
                    .filter(|sort| sort.key == column.key)
                    .map(|sort| sort.direction),
            })
            .collect();

        let sorted = self.sorted_records();
        let filtered_count = sorted.len();
        let range = self.pagination.range(filtered_count);
        let rows = sorted[range]
            .iter()
            .map(|record| TableRow {
                id: record.id().to_string(),
                cells: columns.iter().map(|column| column.cell(*record)).collect(),
            })
            .collect();

        TableView {
            headers,
            rows,
            page: self.pagination.current_page(filtered_count),
            total_pages: self.pagination.total_pages(filtered_count),
            items_per_page: self.pagination.items_per_page(),
            filtered_count,
            total_count: self.records.len(),
        }
    }

    /// Every filtered record in sort order, restricted to visible columns.
    pub fn project_for_export(&self) -> Result<ExportTable> {
        let sorted = self.sorted_records();
        if sorted.is_empty() {
            tracing::warn!(storage_key = self.layout.prefix(), "export skipped: no rows");
            return Err(TableError::NothingToExport);
        }
        let columns = self.visible_columns();
        let mut table = ExportTable::new(columns.iter().map(|column| column.label.clone()).collect());
        for record in sorted {
            table.push_row(columns.iter().map(|column| column.cell(record)).collect());
        }
        Ok(table)
    }

    pub fn row_actions(&self) -> RowActionSlots {
        RowActionSlots::resolve(self.capabilities.as_ref(), &self.resource_type)
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn capabilities(&self) -> &dyn CapabilityOracle {
        self.capabilities.as_ref()
    }

    fn ensure_sort_visible(&mut self) {
        let Some(sort) = &self.sort else {
            return;
        };
        if self.layout.is_visible(&sort.key) {
            return;
        }
        let previous = sort.key.clone();
        let direction = sort.direction;
        let fallback = self
            .layout
            .visible_keys()
            .first()
            .map(|key| (*key).to_string());
        self.sort = fallback.map(|key| SortState { key, direction });
        tracing::debug!(from = %previous, to = ?self.sort, "sort column hidden; fell back");
    }
}

impl<R> fmt::Debug for TableViewEngine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableViewEngine")
            .field("layout", &self.layout)
            .field("records", &self.records.len())
            .field("search_term", &self.search_term)
            .field("search_scope", &self.search_scope)
            .field("sort", &self.sort)
            .field("pagination", &self.pagination)
            .field("resource_type", &self.resource_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use fleet_layout::MemoryStore;
    use fleet_model::{DataRecord, RecordId};

    use super::*;

    fn record(id: &str, name: &str, age: Option<f64>) -> DataRecord {
        DataRecord::new(RecordId::new(id).unwrap())
            .with_field("name", name)
            .with_field("age", age)
    }

    fn engine(records: Vec<DataRecord>) -> TableViewEngine<DataRecord> {
        let columns = ColumnSet::new(vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::new("age", "Age"),
        ])
        .unwrap();
        TableViewEngine::new(columns, Arc::new(MemoryStore::new()), "people").with_records(records)
    }

    fn ids(records: &[&DataRecord]) -> Vec<String> {
        records.iter().map(|record| record.id().to_string()).collect()
    }

    #[test]
    fn set_sort_flips_active_key() {
        let mut table = engine(vec![
            record("1", "Beta", None),
            record("2", "Alpha", Some(30.0)),
        ]);
        assert!(table.set_sort("age"));
        assert_eq!(ids(&table.sorted_records()), vec!["1", "2"]);
        assert!(table.set_sort("age"));
        assert_eq!(ids(&table.sorted_records()), vec!["2", "1"]);
        assert!(table.set_sort("name"));
        assert_eq!(table.sort().map(|s| s.direction), Some(SortDirection::Ascending));
        assert!(!table.set_sort("unknown"));
    }

    #[test]
    fn search_resets_page_and_ands_custom_filter() {
        let records = (1..=25)
            .map(|n| record(&n.to_string(), &format!("Driver {n}"), Some(f64::from(n))))
            .collect();
        let mut table = engine(records);
        table.set_page(3);
        assert_eq!(table.current_page(), 3);

        table.set_search_term("DRIVER 1");
        assert_eq!(table.current_page(), 1);
        // "Driver 1" and "Driver 10".."Driver 19"
        assert_eq!(table.filtered_count(), 11);

        table.set_custom_filter(Some(Arc::new(|r: &DataRecord| {
            r.value("age").as_f64().is_some_and(|age| age >= 15.0)
        })));
        assert_eq!(table.filtered_count(), 5);
    }

    #[test]
    fn hiding_sorted_column_falls_back_to_first_visible() {
        let mut table = engine(vec![record("1", "A", Some(1.0))]);
        table.set_sort("age");
        table.set_sort("age");
        assert!(table.toggle_column("age"));
        assert_eq!(
            table.sort(),
            Some(&SortState {
                key: "name".to_string(),
                direction: SortDirection::Descending,
            })
        );
        assert!(table.toggle_column("name"));
        assert_eq!(table.sort(), None);
    }

    #[test]
    fn export_requires_rows() {
        let table = engine(Vec::new());
        assert!(matches!(
            table.project_for_export(),
            Err(TableError::NothingToExport)
        ));
    }
}
