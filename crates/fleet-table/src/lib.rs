//! Generic table view engine.
//!
//! [`TableViewEngine`] turns a list of [`fleet_model::Record`]s into a
//! searched, sorted, paginated grid whose column layout is persisted through
//! [`fleet_layout::ColumnLayoutStore`].

pub mod actions;
pub mod engine;
pub mod error;
pub mod export;
pub mod pagination;
pub mod search;
pub mod sort;

pub use actions::{RowAction, RowActionSlots, perform_row_action};
pub use engine::{ColumnHeader, RecordFilter, TableRow, TableView, TableViewEngine};
pub use error::{Result, TableError};
pub use export::ExportTable;
pub use pagination::{DEFAULT_ITEMS_PER_PAGE, Pagination};
pub use search::SearchScope;
pub use sort::{SortDirection, SortState, compare_values};
