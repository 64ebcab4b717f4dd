//! Desired-state configuration model
//!
//! One module per resource type plus the shared nested-block types. All of
//! this deserializes from the orchestrator's structured configuration tree
//! and is validated locally before any remote call is issued.

pub mod app_service;
pub mod auth;
pub mod collections;
pub mod environment;
pub mod function_app;
pub mod site_config;
pub mod slot;
pub mod swift;

pub use app_service::{AppServiceConfig, ManagedIdentity, ManagedIdentityType};
pub use auth::{
    AadSettings, AuthProvider, AuthSettings, FacebookSettings, GoogleSettings, MicrosoftSettings,
    TwitterSettings, UnauthenticatedClientAction,
};
pub use collections::{
    BlockList, CollectionDelta, CollectionElement, ConnectionString, ConnectionStringType,
    IpRestriction, NormalizedRestriction, RestrictionAction, RestrictionKey, RestrictionTarget,
    StorageAccountMount, StorageType, DEFAULT_RESTRICTION_PRIORITY, diff_elements,
    normalize_ip_restrictions, validate_cidr, validate_connection_strings,
    validate_storage_accounts,
};
pub use environment::{EnvironmentConfig, LoadBalancingMode, PricingTier};
pub use function_app::{FunctionAppConfig, FunctionOsType};
pub use site_config::{CorsSettings, FtpsState, ScmType, SiteConfig, TlsVersion};
pub use slot::SlotConfig;
pub use swift::SwiftConnectionConfig;

use crate::error::{CoreError, Result};

pub(crate) fn default_true() -> bool {
    true
}

/// Reject an empty required field with an error naming the resource
pub(crate) fn require_field(
    resource_type: &'static str,
    field: &'static str,
    value: &str,
    name: &str,
) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::MissingField {
            resource_type,
            field,
            name: name.to_string(),
        });
    }
    Ok(())
}
