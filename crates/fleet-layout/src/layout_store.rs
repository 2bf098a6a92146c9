use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fleet_model::DeclaredColumn;

use crate::state::{ColumnLayoutState, MoveDirection};
use crate::store::KeyValueStore;

const VISIBILITY_SUFFIX: &str = "_columnsVisibility";
const ORDER_SUFFIX: &str = "_columnsOrder";

/// Column layout of one table instance, persisted under a caller-chosen prefix.
///
/// Every successful mutation writes both the visibility map and the order
/// list back to the store. Two tables with different prefixes never share
/// entries.
pub struct ColumnLayoutStore {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    state: ColumnLayoutState,
}

impl ColumnLayoutStore {
    /// Load persisted state for `prefix`, reconcile it with `declared`, and
    /// persist the reconciled result.
    pub fn open<C: DeclaredColumn>(
        store: Arc<dyn KeyValueStore>,
        prefix: impl Into<String>,
        declared: &[C],
    ) -> Self {
        let prefix = prefix.into();
        let persisted = load_persisted(store.as_ref(), &prefix);
        let (state, report) =
            ColumnLayoutState::reconcile_with_report(declared, persisted.as_ref());
        if !report.stale_keys.is_empty() {
            tracing::debug!(
                prefix = %prefix,
                stale = ?report.stale_keys,
                "dropped stale column keys from persisted layout"
            );
        }
        let layout = Self {
            store,
            prefix,
            state,
        };
        layout.persist();
        layout
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn state(&self) -> &ColumnLayoutState {
        &self.state
    }

    pub fn visible_keys(&self) -> Vec<&str> {
        self.state.visible_keys()
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.state.is_visible(key)
    }

    pub fn toggle(&mut self, key: &str) -> bool {
        let changed = self.state.toggle(key);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn move_column(&mut self, key: &str, direction: MoveDirection) -> bool {
        let changed = self.state.move_column(key, direction);
        if changed {
            self.persist();
        }
        changed
    }

    pub fn reset<C: DeclaredColumn>(&mut self, declared: &[C]) {
        self.state = ColumnLayoutState::reset(declared);
        self.persist();
    }

    /// Re-run reconciliation after the declared column set changed.
    pub fn redeclare<C: DeclaredColumn>(&mut self, declared: &[C]) {
        let state = ColumnLayoutState::reconcile(declared, Some(&self.state));
        if state != self.state {
            self.state = state;
            self.persist();
        }
    }

    fn persist(&self) {
        let visibility = serde_json::to_value(&self.state.visibility);
        let order = serde_json::to_value(&self.state.order);
        match (visibility, order) {
            (Ok(visibility), Ok(order)) => {
                self.store.set(&visibility_key(&self.prefix), visibility);
                self.store.set(&order_key(&self.prefix), order);
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(prefix = %self.prefix, "failed to encode column layout: {e}");
            }
        }
    }
}

impl fmt::Debug for ColumnLayoutStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnLayoutStore")
            .field("prefix", &self.prefix)
            .field("state", &self.state)
            .finish()
    }
}

pub fn visibility_key(prefix: &str) -> String {
    format!("{prefix}{VISIBILITY_SUFFIX}")
}

pub fn order_key(prefix: &str) -> String {
    format!("{prefix}{ORDER_SUFFIX}")
}

/// Either half may be missing or malformed; the other is still honoured.
fn load_persisted(store: &dyn KeyValueStore, prefix: &str) -> Option<ColumnLayoutState> {
    let visibility = store
        .get(&visibility_key(prefix))
        .and_then(|value| decode::<BTreeMap<String, bool>>(prefix, "visibility", value));
    let order = store
        .get(&order_key(prefix))
        .and_then(|value| decode::<Vec<String>>(prefix, "order", value));
    if visibility.is_none() && order.is_none() {
        return None;
    }
    Some(ColumnLayoutState {
        visibility: visibility.unwrap_or_default(),
        order: order.unwrap_or_default(),
    })
}

fn decode<V: serde::de::DeserializeOwned>(
    prefix: &str,
    part: &str,
    value: serde_json::Value,
) -> Option<V> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!(prefix = %prefix, part, "ignoring malformed persisted layout: {e}");
            None
        }
    }
}
