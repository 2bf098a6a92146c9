//! Pure column-layout state and its reconciliation against declared columns.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use fleet_model::DeclaredColumn;

/// Direction for [`ColumnLayoutState::move_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Visibility and order of one table instance's columns.
///
/// After reconciliation `order` is a permutation of the declared keys and
/// `visibility` has exactly one entry per declared key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayoutState {
    pub visibility: BTreeMap<String, bool>,
    pub order: Vec<String>,
}

/// Keys found in persisted state that are no longer declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub stale_keys: BTreeSet<String>,
}

impl ColumnLayoutState {
    /// Defaults only: each column's `default_visible`, declaration order.
    pub fn reset<C: DeclaredColumn>(declared: &[C]) -> Self {
        Self {
            visibility: declared
                .iter()
                .map(|column| (column.key().to_string(), column.default_visible()))
                .collect(),
            order: declared.iter().map(|column| column.key().to_string()).collect(),
        }
    }

    pub fn reconcile<C: DeclaredColumn>(declared: &[C], persisted: Option<&Self>) -> Self {
        Self::reconcile_with_report(declared, persisted).0
    }

    /// Overlay persisted visibility/order onto the declared defaults.
    ///
    /// Persisted visibility wins for keys that still exist. Persisted order is
    /// kept for surviving keys, then declared keys it lacks are appended in
    /// declaration order.
    pub fn reconcile_with_report<C: DeclaredColumn>(
        declared: &[C],
        persisted: Option<&Self>,
    ) -> (Self, ReconcileReport) {
        let mut state = Self::reset(declared);
        let mut report = ReconcileReport::default();
        let Some(persisted) = persisted else {
            return (state, report);
        };

        for (key, visible) in &persisted.visibility {
            match state.visibility.get_mut(key) {
                Some(slot) => *slot = *visible,
                None => {
                    report.stale_keys.insert(key.clone());
                }
            }
        }

        let mut placed = BTreeSet::new();
        let mut order = Vec::with_capacity(state.order.len());
        for key in &persisted.order {
            if !state.visibility.contains_key(key) {
                report.stale_keys.insert(key.clone());
                continue;
            }
            if placed.insert(key.as_str()) {
                order.push(key.clone());
            }
        }
        for key in &state.order {
            if !placed.contains(key.as_str()) {
                order.push(key.clone());
            }
        }
        state.order = order;
        (state, report)
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visibility.get(key).copied().unwrap_or(false)
    }

    /// Visible keys in display order.
    pub fn visible_keys(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter(|key| self.is_visible(key))
            .map(String::as_str)
            .collect()
    }

    /// Flip visibility of `key`. Returns false (no-op) for unknown keys.
    pub fn toggle(&mut self, key: &str) -> bool {
        match self.visibility.get_mut(key) {
            Some(visible) => {
                *visible = !*visible;
                true
            }
            None => false,
        }
    }

    /// Shift `key` one slot. Returns false when unknown or already at the edge.
    pub fn move_column(&mut self, key: &str, direction: MoveDirection) -> bool {
        let Some(index) = self.order.iter().position(|k| k == key) else {
            return false;
        };
        let target = match direction {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.order.len() => index + 1,
            _ => return false,
        };
        let moved = self.order.remove(index);
        self.order.insert(target, moved);
        true
    }
}

#[cfg(test)]
mod tests {
    use fleet_model::ColumnSpec;

    use super::*;

    fn spec(key: &str, default_visible: bool) -> ColumnSpec {
        ColumnSpec {
            key: key.to_string(),
            label: key.to_uppercase(),
            sortable: true,
            default_visible,
        }
    }

    #[test]
    fn stale_keys_dropped_and_new_keys_appended() {
        let declared = vec![spec("a", true), spec("b", false)];
        let persisted = ColumnLayoutState {
            visibility: BTreeMap::from([
                ("a".to_string(), true),
                ("old_removed".to_string(), false),
            ]),
            order: vec!["a".to_string(), "old_removed".to_string()],
        };
        let (state, report) = ColumnLayoutState::reconcile_with_report(&declared, Some(&persisted));
        assert_eq!(state.order, vec!["a", "b"]);
        assert_eq!(
            state.visibility,
            BTreeMap::from([("a".to_string(), true), ("b".to_string(), false)])
        );
        assert_eq!(
            report.stale_keys,
            BTreeSet::from(["old_removed".to_string()])
        );
    }

    #[test]
    fn persisted_visibility_wins() {
        let declared = vec![spec("a", true), spec("b", true)];
        let persisted = ColumnLayoutState {
            visibility: BTreeMap::from([("b".to_string(), false)]),
            order: vec!["b".to_string(), "a".to_string()],
        };
        let state = ColumnLayoutState::reconcile(&declared, Some(&persisted));
        assert_eq!(state.order, vec!["b", "a"]);
        assert_eq!(state.visible_keys(), vec!["a"]);
    }

    #[test]
    fn duplicate_persisted_order_entries_collapse() {
        let declared = vec![spec("a", true), spec("b", true)];
        let persisted = ColumnLayoutState {
            visibility: BTreeMap::new(),
            order: vec!["b".to_string(), "b".to_string()],
        };
        let state = ColumnLayoutState::reconcile(&declared, Some(&persisted));
        assert_eq!(state.order, vec!["b", "a"]);
    }

    #[test]
    fn move_is_clamped_at_edges() {
        let mut state = ColumnLayoutState::reset(&[spec("a", true), spec("b", true), spec("c", true)]);
        assert!(!state.move_column("a", MoveDirection::Up));
        assert!(!state.move_column("c", MoveDirection::Down));
        assert!(!state.move_column("zzz", MoveDirection::Down));
        assert_eq!(state.order, vec!["a", "b", "c"]);

        assert!(state.move_column("c", MoveDirection::Up));
        assert_eq!(state.order, vec!["a", "c", "b"]);
        assert!(state.move_column("a", MoveDirection::Down));
        assert_eq!(state.order, vec!["c", "a", "b"]);
    }

    #[test]
    fn toggle_unknown_key_is_noop() {
        let mut state = ColumnLayoutState::reset(&[spec("a", true)]);
        assert!(!state.toggle("b"));
        assert!(state.toggle("a"));
        assert!(!state.is_visible("a"));
        assert!(state.visible_keys().is_empty());
    }
}
