//! Resource lifecycle status

use serde::{Deserialize, Serialize};

/// Where a resource sits in its reconciliation lifecycle
///
/// `Absent → Creating → Present → Updating → Present → Deleting → Absent`,
/// with `Failed` as the terminal state after a definitive remote error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    /// No remote resource exists for this identity
    Absent,
    /// A create has been issued and not yet confirmed
    Creating,
    /// The remote resource exists and matches its last materialized state
    Present,
    /// An update has been issued and not yet confirmed
    Updating,
    /// A delete has been issued and not yet confirmed
    Deleting,
    /// A remote call failed with a definitive, non-retryable error
    Failed,
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceStatus::Absent => write!(f, "absent"),
            ResourceStatus::Creating => write!(f, "creating"),
            ResourceStatus::Present => write!(f, "present"),
            ResourceStatus::Updating => write!(f, "updating"),
            ResourceStatus::Deleting => write!(f, "deleting"),
            ResourceStatus::Failed => write!(f, "failed"),
        }
    }
}

impl ResourceStatus {
    /// Whether the state is one a reconciliation can be started from
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Absent | Self::Present | Self::Failed)
    }
}
