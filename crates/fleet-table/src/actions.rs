use fleet_model::{Action, CapabilityOracle, Mutations, SubmitResponse};

use crate::error::{Result, TableError};

/// Which row affordances a table should render for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowActionSlots {
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl RowActionSlots {
    pub fn resolve(oracle: &dyn CapabilityOracle, resource_type: &str) -> Self {
        Self {
            can_add: oracle.can_perform(resource_type, Action::Add),
            can_edit: oracle.can_perform(resource_type, Action::Edit),
            can_delete: oracle.can_perform(resource_type, Action::Delete),
        }
    }

    pub fn any(&self) -> bool {
        self.can_add || self.can_edit || self.can_delete
    }
}

#[derive(Debug)]
pub enum RowAction<'a, T> {
    Add(&'a T),
    Edit(&'a T),
    Delete(&'a str),
}

impl<T> RowAction<'_, T> {
    pub fn action(&self) -> Action {
        match self {
            Self::Add(_) => Action::Add,
            Self::Edit(_) => Action::Edit,
            Self::Delete(_) => Action::Delete,
        }
    }
}

/// Check the oracle, then hand the row to the matching mutation callback.
pub async fn perform_row_action<T, M>(
    oracle: &dyn CapabilityOracle,
    resource_type: &str,
    mutations: &M,
    row_action: RowAction<'_, T>,
) -> Result<SubmitResponse>
where
    T: Send + Sync,
    M: Mutations<T> + ?Sized,
{
    let action = row_action.action();
    if !oracle.can_perform(resource_type, action) {
        tracing::debug!(resource = resource_type, %action, "row action denied");
        return Err(TableError::Forbidden {
            resource: resource_type.to_string(),
            action,
        });
    }
    let response = match row_action {
        RowAction::Add(record) => mutations.add(record).await?,
        RowAction::Edit(record) => mutations.update(record).await?,
        RowAction::Delete(id) => mutations.remove(id).await?,
    };
    Ok(response)
}
