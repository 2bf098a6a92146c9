//! Capability oracle consulted before rendering row affordances.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Add,
    Edit,
    Delete,
}

impl Action {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-supplied permission check. The core only hides affordances with it.
pub trait CapabilityOracle: Send + Sync {
    fn can_perform(&self, resource_type: &str, action: Action) -> bool;
}

impl<F> CapabilityOracle for F
where
    F: Fn(&str, Action) -> bool + Send + Sync,
{
    fn can_perform(&self, resource_type: &str, action: Action) -> bool {
        self(resource_type, action)
    }
}

/// Grants everything; used when a host has no permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CapabilityOracle for AllowAll {
    fn can_perform(&self, _resource_type: &str, _action: Action) -> bool {
        true
    }
}
