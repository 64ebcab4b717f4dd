//! Validation and identity errors

use thiserror::Error;

/// Errors raised before any remote call is made
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid resource id {id:?}: {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error(
        "ip_restriction {index}: exactly one of `ip_address`, `service_tag` or \
         `virtual_network_subnet_id` must be set"
    )]
    RestrictionTargetAmbiguous { index: usize },

    #[error("duplicate {collection} element {key}")]
    DuplicateElement { collection: &'static str, key: String },

    #[error("invalid value {value:?} for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("missing required field {field} for {resource_type} {name:?}")]
    MissingField {
        resource_type: &'static str,
        field: &'static str,
        name: String,
    },
}

impl CoreError {
    pub(crate) fn invalid_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
