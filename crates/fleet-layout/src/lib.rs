//! Column layout for generic tables.
//!
//! [`ColumnLayoutState`] is the pure reconcile/toggle/move/reset logic;
//! [`ColumnLayoutStore`] binds it to a [`KeyValueStore`] under a per-table
//! prefix and persists after each mutation.

pub mod error;
pub mod layout_store;
pub mod state;
pub mod store;

pub use error::LayoutError;
pub use layout_store::{ColumnLayoutStore, order_key, visibility_key};
pub use state::{ColumnLayoutState, MoveDirection, ReconcileReport};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
