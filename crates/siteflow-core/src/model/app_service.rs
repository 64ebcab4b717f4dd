//! App Service desired configuration

use super::auth::AuthSettings;
use super::collections::{
    BlockList, ConnectionString, StorageAccountMount, validate_connection_strings,
    validate_storage_accounts,
};
use super::site_config::SiteConfig;
use super::require_field;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Managed identity kind attached to a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManagedIdentityType {
    SystemAssigned,
    UserAssigned,
    #[serde(rename = "SystemAssigned, UserAssigned")]
    SystemAssignedUserAssigned,
}

/// The `identity` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedIdentity {
    #[serde(rename = "type")]
    pub identity_type: ManagedIdentityType,
    #[serde(default)]
    pub identity_ids: Vec<String>,
}

/// Desired configuration of an App Service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppServiceConfig {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub app_service_plan_id: String,

    #[serde(default = "super::default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub https_only: bool,

    #[serde(default)]
    pub client_affinity_enabled: bool,

    #[serde(default)]
    pub client_cert_enabled: bool,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub app_settings: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BlockList::is_unset")]
    pub connection_strings: BlockList<ConnectionString>,

    #[serde(default, skip_serializing_if = "BlockList::is_unset")]
    pub storage_accounts: BlockList<StorageAccountMount>,

    #[serde(default)]
    pub site_config: SiteConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_settings: Option<AuthSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedIdentity>,
}

impl AppServiceConfig {
    const RESOURCE_TYPE: &'static str = "app_service";

    /// Validate the whole configuration tree locally
    pub fn validate(&self) -> Result<()> {
        require_field(Self::RESOURCE_TYPE, "name", &self.name, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "resource_group", &self.resource_group, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "location", &self.location, &self.name)?;
        require_field(
            Self::RESOURCE_TYPE,
            "app_service_plan_id",
            &self.app_service_plan_id,
            &self.name,
        )?;
        self.site_config.validate()?;
        if let Some(declared) = self.connection_strings.as_set() {
            validate_connection_strings(declared)?;
        }
        if let Some(declared) = self.storage_accounts.as_set() {
            validate_storage_accounts(declared)?;
        }
        Ok(())
    }
}
