//! Function App desired configuration

use super::auth::AuthSettings;
use super::collections::{BlockList, ConnectionString, validate_connection_strings};
use super::app_service::ManagedIdentity;
use super::site_config::SiteConfig;
use super::require_field;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Worker operating system for a Function App
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionOsType {
    #[default]
    Windows,
    Linux,
}

/// Desired configuration of a Function App
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionAppConfig {
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub app_service_plan_id: String,

    /// Backing storage account for the functions runtime
    pub storage_account_name: String,
    pub storage_account_access_key: String,

    #[serde(default)]
    pub os_type: FunctionOsType,

    #[serde(default = "default_runtime_version")]
    pub runtime_version: String,

    #[serde(default = "super::default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub https_only: bool,

    #[serde(default)]
    pub client_affinity_enabled: bool,

    /// GB-seconds per day on a consumption plan; zero means unlimited
    #[serde(default)]
    pub daily_memory_time_quota: u32,

    #[serde(default = "super::default_true")]
    pub enable_builtin_logging: bool,

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

fn default_runtime_version() -> String {
    "~1".to_string()
}

impl FunctionAppConfig {
    const RESOURCE_TYPE: &'static str = "function_app";

    /// The `kind` discriminator the platform expects for this app
    pub fn kind(&self) -> &'static str {
        match self.os_type {
            FunctionOsType::Windows => "functionapp",
            FunctionOsType::Linux => "functionapp,linux",
        }
    }

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
        require_field(
            Self::RESOURCE_TYPE,
            "storage_account_name",
            &self.storage_account_name,
            &self.name,
        )?;
        require_field(
            Self::RESOURCE_TYPE,
            "storage_account_access_key",
            &self.storage_account_access_key,
            &self.name,
        )?;
        self.site_config.validate()?;
        if let Some(declared) = self.connection_strings.as_set() {
            validate_connection_strings(declared)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tracks_os_type() {
        let mut config = FunctionAppConfig::default();
        assert_eq!(config.kind(), "functionapp");
        config.os_type = FunctionOsType::Linux;
        assert_eq!(config.kind(), "functionapp,linux");
    }

    #[test]
    fn runtime_version_defaults_to_tilde_one() {
        let config: FunctionAppConfig = serde_json::from_value(serde_json::json!({
            "name": "acctest-func",
            "resource_group": "acctest-rg",
            "location": "westeurope",
            "app_service_plan_id": "plan1",
            "storage_account_name": "acctestsa",
            "storage_account_access_key": "key==",
        }))
        .unwrap();
        assert_eq!(config.runtime_version, "~1");
        assert!(config.enable_builtin_logging);
    }

    #[test]
    fn storage_account_is_required() {
        let config = FunctionAppConfig {
            name: "acctest-func".to_string(),
            resource_group: "acctest-rg".to_string(),
            location: "westeurope".to_string(),
            app_service_plan_id: "plan1".to_string(),
            storage_account_name: String::new(),
            storage_account_access_key: "key==".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
