//! App Service Environment desired configuration

use super::collections::validate_cidr;
use super::require_field;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Isolated pricing tier of an environment's worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PricingTier {
    #[default]
    I1,
    I2,
    I3,
}

impl PricingTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I1 => "I1",
            Self::I2 => "I2",
            Self::I3 => "I3",
        }
    }
}

/// Which endpoints an internal environment load-balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadBalancingMode {
    #[default]
    None,
    Web,
    Publishing,
    #[serde(rename = "Web, Publishing")]
    WebPublishing,
}

/// Desired configuration of an App Service Environment
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub name: String,
    pub resource_group: String,
    pub location: String,

    /// Subnet the environment is injected into
    pub subnet_id: String,

    #[serde(default)]
    pub pricing_tier: PricingTier,

    /// Front-end instances per this many workers, 5 to 15
    #[serde(default = "default_front_end_scale_factor")]
    pub front_end_scale_factor: u32,

    #[serde(default)]
    pub internal_load_balancing_mode: LoadBalancingMode,

    /// CIDR ranges allowed to reach the environment's management endpoints
    #[serde(default)]
    pub allowed_user_ip_cidrs: Vec<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

fn default_front_end_scale_factor() -> u32 {
    15
}

impl EnvironmentConfig {
    const RESOURCE_TYPE: &'static str = "app_service_environment";

    pub fn validate(&self) -> Result<()> {
        require_field(Self::RESOURCE_TYPE, "name", &self.name, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "resource_group", &self.resource_group, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "location", &self.location, &self.name)?;
        require_field(Self::RESOURCE_TYPE, "subnet_id", &self.subnet_id, &self.name)?;
        if !(5..=15).contains(&self.front_end_scale_factor) {
            return Err(CoreError::InvalidField {
                field: "app_service_environment.front_end_scale_factor",
                value: self.front_end_scale_factor.to_string(),
                reason: "must be between 5 and 15".to_string(),
            });
        }
        for cidr in &self.allowed_user_ip_cidrs {
            validate_cidr(cidr)?;
        }
        Ok(())
    }
}
