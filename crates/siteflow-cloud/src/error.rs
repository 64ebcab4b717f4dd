//! Reconciliation error taxonomy
//!
//! Every error that can surface from a reconciliation names the resource
//! type, name and resource group involved, so a failure inside a batch of
//! concurrent reconciliations is attributable to one resource.

use siteflow_core::CoreError;
use thiserror::Error;

/// Error returned by a remote management API client
///
/// Transient transport failures are retried below this layer; what arrives
/// here is terminal for the current reconciliation and is surfaced to the
/// orchestrator, which owns any retry policy.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("management API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

/// Errors surfaced by a resource reconciliation
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A resource with this identity already exists remotely; creating it
    /// would silently adopt it, so the caller must import instead
    #[error(
        "{resource_type} {name:?} (resource group {resource_group:?}) already exists \
         and must be imported: {id}"
    )]
    RequiresImport {
        resource_type: &'static str,
        name: String,
        resource_group: String,
        id: String,
    },

    /// The parent a child resource attaches to does not exist
    #[error(
        "parent {parent_type} {parent_name:?} of {resource_type} {name:?} \
         (resource group {resource_group:?}) was not found"
    )]
    ParentNotFound {
        parent_type: &'static str,
        parent_name: String,
        resource_type: &'static str,
        name: String,
        resource_group: String,
    },

    /// The confirmation read after a create or update found nothing
    ///
    /// Not-found is normally success-with-cleared-state; immediately after a
    /// successful write it is a genuine failure.
    #[error(
        "{resource_type} {name:?} (resource group {resource_group:?}) was not found \
         after a successful write"
    )]
    MissingAfterWrite {
        resource_type: &'static str,
        name: String,
        resource_group: String,
    },

    /// An update was asked for but the resource no longer exists
    #[error(
        "{resource_type} {name:?} (resource group {resource_group:?}) no longer exists \
         and must be recreated, not updated"
    )]
    UpdateTargetMissing {
        resource_type: &'static str,
        name: String,
        resource_group: String,
    },

    /// The post-delete confirmation still found the resource
    #[error(
        "{resource_type} {name:?} (resource group {resource_group:?}) still exists \
         after its delete completed"
    )]
    StillExistsAfterDelete {
        resource_type: &'static str,
        name: String,
        resource_group: String,
    },

    /// An import id resolved to nothing remotely
    #[error("{resource_type} {id} does not exist and cannot be imported")]
    ImportNotFound {
        resource_type: &'static str,
        id: String,
    },

    /// The remote API rejected a call
    #[error("{resource_type} {name:?} (resource group {resource_group:?}): {source}")]
    Api {
        resource_type: &'static str,
        name: String,
        resource_group: String,
        #[source]
        source: ClientError,
    },

    /// Local validation failed before any remote call
    #[error(transparent)]
    Validation(#[from] CoreError),
}

impl ReconcileError {
    /// Wrap a client error with the resource coordinates it concerns
    pub fn api(
        resource_type: &'static str,
        name: impl Into<String>,
        resource_group: impl Into<String>,
        source: ClientError,
    ) -> Self {
        Self::Api {
            resource_type,
            name: name.into(),
            resource_group: resource_group.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_resource() {
        let err = ReconcileError::RequiresImport {
            resource_type: "app_service",
            name: "acctest-app".to_string(),
            resource_group: "acctest-rg".to_string(),
            id: "/subscriptions/sub1/resourceGroups/acctest-rg/providers/Microsoft.Web/sites/acctest-app".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("app_service"));
        assert!(message.contains("acctest-app"));
        assert!(message.contains("acctest-rg"));
        assert!(message.contains("must be imported"));
    }

    #[test]
    fn api_errors_chain_the_client_error() {
        let err = ReconcileError::api(
            "function_app",
            "acctest-func",
            "acctest-rg",
            ClientError::api(500, "internal error"),
        );
        assert!(err.to_string().contains("acctest-func"));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("500"));
    }
}
