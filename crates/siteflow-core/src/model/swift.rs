//! Swift virtual-network connection desired configuration

use super::require_field;
use crate::error::Result;
use crate::identity::SiteId;
use serde::{Deserialize, Serialize};

/// Desired configuration of a Swift virtual-network connection
///
/// The connection is a singleton attachment: a site (or one of its slots) is
/// connected to at most one subnet, and writing the connection again is an
/// idempotent replace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwiftConnectionConfig {
    /// ARM id of the App Service or Function App to attach
    pub app_service_id: String,

    /// Slot to attach instead of the production site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_name: Option<String>,

    /// Subnet the site's outbound traffic is routed through
    pub subnet_id: String,
}

impl SwiftConnectionConfig {
    const RESOURCE_TYPE: &'static str = "app_service_virtual_network_swift_connection";

    /// Parse the parent site id out of the configured ARM id
    pub fn site_id(&self) -> Result<SiteId> {
        self.app_service_id.parse()
    }

    pub fn validate(&self) -> Result<()> {
        require_field(
            Self::RESOURCE_TYPE,
            "app_service_id",
            &self.app_service_id,
            &self.app_service_id,
        )?;
        require_field(Self::RESOURCE_TYPE, "subnet_id", &self.subnet_id, &self.app_service_id)?;
        self.site_id()?;
        Ok(())
    }
}
