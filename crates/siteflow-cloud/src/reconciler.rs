//! Reconciler abstraction
//!
//! Every resource type implements this trait over its own configuration,
//! identity and observed-state types. One reconciliation handles one resource
//! instance; remote calls within it are sequential, and nothing is cached
//! across invocations. Each entry point fetches remote state fresh.

use crate::action::Plan;
use crate::error::Result;
use async_trait::async_trait;

/// Create/Read/Update/Delete/Import contract shared by all resource types
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Desired configuration for this resource type
    type Config: Send + Sync;
    /// Durable identity handle
    type Id: Send + Sync;
    /// Materialized post-read state
    type Observed: Send + Sync;

    /// Compute the operations that would move remote state to `config`
    /// without applying anything
    async fn plan(&self, config: &Self::Config) -> Result<Plan>;

    /// Create the resource, guarding against adopting a pre-existing one
    ///
    /// Fails with `RequiresImport` when a live remote resource already
    /// carries this identity. On success the observed state comes from a
    /// confirmation read, not from the mutation response.
    async fn create(&self, config: &Self::Config) -> Result<Self::Observed>;

    /// Fetch and materialize current remote state
    ///
    /// Returns `Ok(None)` when the resource no longer exists; the caller
    /// clears its record instead of treating this as a failure.
    async fn read(&self, id: &Self::Id) -> Result<Option<Self::Observed>>;

    /// Move the existing remote resource to `config`
    ///
    /// Follows the fetch-merge-submit discipline: the current envelope is
    /// fetched and desired fields merged into it, so whole-object PUTs never
    /// revert fields this configuration does not mention.
    async fn update(&self, id: &Self::Id, config: &Self::Config) -> Result<Self::Observed>;

    /// Delete the resource; deleting an already-absent resource succeeds
    async fn delete(&self, id: &Self::Id) -> Result<()>;

    /// Resolve an externally supplied identity string and read the resource
    ///
    /// The identifier alone must be enough to drive the read; an id that
    /// parses but resolves to nothing is an `ImportNotFound` error.
    async fn import(&self, raw_id: &str) -> Result<Self::Observed>;
}
