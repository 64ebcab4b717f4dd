//! siteflow reconciliation machinery
//!
//! Provider-independent pieces of the reconciliation engine: the plan and
//! action types a reconciliation computes, the resource lifecycle status
//! model, the error taxonomy, and the `Reconcile` trait each resource type
//! implements.

pub mod action;
pub mod error;
pub mod reconciler;
pub mod status;

// Re-exports
pub use action::{Action, ActionType, CollectionChange, Plan, PlanSummary};
pub use error::{ClientError, ReconcileError, Result};
pub use reconciler::Reconcile;
pub use status::ResourceStatus;
