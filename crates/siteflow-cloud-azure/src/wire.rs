//! Management API wire representations
//!
//! Serde mirrors of the envelopes the Azure management API exchanges. Field
//! names follow the remote JSON schema; everything the server may omit is
//! optional. These types stay at the client boundary; reconcilers convert
//! them to and from the configuration model through `convert`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A site envelope: an App Service, Function App or deployment slot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub location: String,

    /// Discriminator such as `app`, `functionapp` or `functionapp,linux`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<ManagedServiceIdentity>,

    #[serde(default)]
    pub properties: SiteProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_farm_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_only: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_affinity_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_memory_time_quota: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_config: Option<SiteConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_host_name: Option<String>,

    /// Comma-separated list, as the server reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_ip_addresses: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_outbound_ip_addresses: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time_utc: Option<DateTime<Utc>>,
}

/// The `siteConfig` sub-object of a site envelope
///
/// The server overwrites this object wholesale on every PUT, which is why
/// updates must merge current values in before submitting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_on: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_settings: Option<Vec<NameValuePair>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_strings: Option<Vec<ConnStringInfo>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_storage_accounts: Option<BTreeMap<String, AzureStorageInfoValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftps_state: Option<String>,

    #[serde(rename = "http20Enabled", default, skip_serializing_if = "Option::is_none")]
    pub http20_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_security_restrictions: Option<Vec<IpSecurityRestriction>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_fx_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_warmed_instance_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_type: Option<String>,

    #[serde(rename = "use32BitWorkerProcess", default, skip_serializing_if = "Option::is_none")]
    pub use_32_bit_worker_process: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_sockets_enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnStringInfo {
    pub name: String,
    pub connection_string: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureStorageInfoValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub account_name: String,
    pub share_name: String,
    pub access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsInfo {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_credentials: Option<bool>,
}

/// One element of `ipSecurityRestrictions`
///
/// A service-tag rule reuses `ipAddress` for the tag value and marks itself
/// with `tag: "ServiceTag"`; the platform's implicit allow-all rule appears
/// as `ipAddress: "Any"`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpSecurityRestriction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnet_subnet_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedServiceIdentity {
    #[serde(rename = "type")]
    pub identity_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_ids: Option<Vec<String>>,
}

/// Flat auth-settings sub-resource, written through its own update call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAuthSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_external_redirect_urls: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_store_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_refresh_extension_hours: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unauthenticated_client_action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_login_params: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_audiences: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_app_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_app_secret: Option<String>,

    #[serde(rename = "facebookOAuthScopes", default, skip_serializing_if = "Option::is_none")]
    pub facebook_oauth_scopes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_client_secret: Option<String>,

    #[serde(rename = "googleOAuthScopes", default, skip_serializing_if = "Option::is_none")]
    pub google_oauth_scopes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_account_client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft_account_client_secret: Option<String>,

    #[serde(
        rename = "microsoftAccountOAuthScopes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub microsoft_account_oauth_scopes: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_consumer_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter_consumer_secret: Option<String>,
}

/// Publishing credentials for a site or slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteCredential {
    pub publishing_user_name: String,
    pub publishing_password: String,
}

/// Host-level function keys
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key: Option<String>,

    #[serde(default)]
    pub function_keys: BTreeMap<String, String>,
}

/// An App Service plan envelope, read for tier checks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppServicePlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<SkuDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkuDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Tier such as `Dynamic`, `ElasticPremium` or `Standard`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// An App Service Environment envelope
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostingEnvironment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub location: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub properties: HostingEnvironmentProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostingEnvironmentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network: Option<VirtualNetworkProfile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_load_balancing_mode: Option<String>,

    /// Worker size, e.g. `Standard_D1_V2` for the I1 tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_end_scale_factor: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_whitelisted_ip_ranges: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProfile {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

/// The singleton `config/virtualNetwork` sub-resource of a site or slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwiftVirtualNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub properties: SwiftVirtualNetworkProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwiftVirtualNetworkProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swift_supported: Option<bool>,
}
