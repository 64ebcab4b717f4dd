//! Reconciliation plan types
//!
//! A [`Plan`] is the ephemeral output of diffing a desired configuration
//! against current remote state: which verb to apply and, for nested
//! collections, which elements change. Plans are computed, rendered or
//! executed, and discarded; they are never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verb a reconciliation will apply to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Identity-keyed change summary for one nested collection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CollectionChange {
    /// Collection field name, e.g. `ip_restriction`
    pub collection: &'static str,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

impl CollectionChange {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

/// A planned operation against one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub action_type: ActionType,

    /// Resource type, e.g. `app_service` or `function_app`
    pub resource_type: &'static str,

    pub resource_name: String,
    pub resource_group: String,

    /// Human-readable description of the operation
    pub description: String,

    /// Per-collection deltas carried by an update
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_changes: Vec<CollectionChange>,

    /// Scalar fields that differ between desired and current state
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<&'static str>,
}

impl Action {
    pub fn no_op(
        resource_type: &'static str,
        resource_name: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        let resource_name = resource_name.into();
        Self {
            action_type: ActionType::NoOp,
            resource_type,
            description: format!("{resource_type} {resource_name} is up to date"),
            resource_name,
            resource_group: resource_group.into(),
            collection_changes: Vec::new(),
            changed_fields: Vec::new(),
        }
    }

    pub fn create(
        resource_type: &'static str,
        resource_name: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        let resource_name = resource_name.into();
        Self {
            action_type: ActionType::Create,
            resource_type,
            description: format!("create {resource_type} {resource_name}"),
            resource_name,
            resource_group: resource_group.into(),
            collection_changes: Vec::new(),
            changed_fields: Vec::new(),
        }
    }

    pub fn update(
        resource_type: &'static str,
        resource_name: impl Into<String>,
        resource_group: impl Into<String>,
        changed_fields: Vec<&'static str>,
        collection_changes: Vec<CollectionChange>,
    ) -> Self {
        let resource_name = resource_name.into();
        Self {
            action_type: ActionType::Update,
            resource_type,
            description: format!("update {resource_type} {resource_name} in place"),
            resource_name,
            resource_group: resource_group.into(),
            collection_changes,
            changed_fields,
        }
    }

    pub fn delete(
        resource_type: &'static str,
        resource_name: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        let resource_name = resource_name.into();
        Self {
            action_type: ActionType::Delete,
            resource_type,
            description: format!("delete {resource_type} {resource_name}"),
            resource_name,
            resource_group: resource_group.into(),
            collection_changes: Vec::new(),
            changed_fields: Vec::new(),
        }
    }
}

/// The set of operations one reconciliation pass would apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Counts of planned operations by verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}
