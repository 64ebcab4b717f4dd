//! Deployment slot desired configuration
//!
//! A slot mirrors its parent's block set but is reconciled independently; no
//! field inheritance happens here. Anything the platform copies from the
//! parent is the platform's business.

use super::auth::AuthSettings;
use super::collections::{BlockList, ConnectionString, validate_connection_strings};
use super::app_service::ManagedIdentity;
use super::site_config::SiteConfig;
use super::require_field;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired configuration of a deployment slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotConfig {
    pub name: String,
    pub resource_group: String,

    /// Name of the App Service or Function App this slot belongs to
    pub app_service_name: String,

    pub location: String,
    pub app_service_plan_id: String,

    #[serde(default = "super::default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub https_only: bool,

    #[serde(default)]
    pub client_affinity_enabled: bool,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub app_settings: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BlockList::is_unset")]
    pub connection_strings: BlockList<ConnectionString>,

    #[serde(default)]
    pub site_config: SiteConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_settings: Option<AuthSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedIdentity>,
}

impl SlotConfig {
    const RESOURCE_TYPE: &'static str = "app_service_slot";

    pub fn validate(&self) -> Result<()> {
        require_field(Self::RESOURCE_TYPE, "name", &self.name, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "resource_group", &self.resource_group, &self.name)?;
        require_field(
            Self::RESOURCE_TYPE,
            "app_service_name",
            &self.app_service_name,
            &self.name,
        )?;
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
        Ok(())
    }
}
