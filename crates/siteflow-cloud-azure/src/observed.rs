//! Materialized post-read state
//!
//! What a successful read hands back to the orchestrator: the durable id,
//! the computed/server-owned attributes (hostnames, outbound addresses,
//! credentials) and the normalized nested collections in their
//! identity-stable form. This is the shape subsequent diffs run against.

use crate::convert;
use crate::wire;
use serde::Serialize;
use siteflow_cloud::ResourceStatus;
use siteflow_core::model::{
    AuthSettings, ConnectionString, SiteConfig, StorageAccountMount,
};
use std::collections::BTreeMap;

/// Publishing credentials exposed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteCredentials {
    pub username: String,
    pub password: String,
}

/// Managed identity as the server reports it, principal ids included
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedIdentity {
    pub identity_type: String,
    pub principal_id: Option<String>,
    pub tenant_id: Option<String>,
    pub identity_ids: Vec<String>,
}

/// Observed state of an App Service, Function App or slot envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedSite {
    /// The durable identity handle
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub kind: Option<String>,
    pub app_service_plan_id: Option<String>,
    pub enabled: bool,
    pub https_only: bool,
    pub client_affinity_enabled: bool,
    pub client_cert_enabled: bool,
    pub tags: BTreeMap<String, String>,
    pub app_settings: BTreeMap<String, String>,
    pub connection_strings: Vec<ConnectionString>,
    pub storage_accounts: Vec<StorageAccountMount>,
    pub site_config: SiteConfig,
    pub auth_settings: Option<AuthSettings>,
    pub identity: Option<ObservedIdentity>,
    pub default_hostname: Option<String>,
    pub outbound_ip_addresses: Vec<String>,
    pub possible_outbound_ip_addresses: Vec<String>,
    pub site_credentials: Option<SiteCredentials>,
    pub status: ResourceStatus,
}

impl ObservedSite {
    /// Assemble the observed record from the envelope and the auxiliary
    /// list-call results
    pub(crate) fn assemble(
        site: &wire::Site,
        resource_group: &str,
        app_settings: BTreeMap<String, String>,
        connection_strings: &[wire::ConnStringInfo],
        auth_settings: Option<&wire::SiteAuthSettings>,
        credentials: Option<wire::SiteCredential>,
    ) -> Self {
        let properties = &site.properties;
        let site_config = properties
            .site_config
            .as_ref()
            .map(convert::flatten_site_config)
            .unwrap_or_default();
        let storage_accounts = properties
            .site_config
            .as_ref()
            .and_then(|config| config.azure_storage_accounts.as_ref())
            .map(convert::flatten_storage_accounts)
            .unwrap_or_default();

        Self {
            id: site.id.clone().unwrap_or_default(),
            name: site.name.clone().unwrap_or_default(),
            resource_group: resource_group.to_string(),
            location: site.location.clone(),
            kind: site.kind.clone(),
            app_service_plan_id: properties.server_farm_id.clone(),
            enabled: properties.enabled.unwrap_or(true),
            https_only: properties.https_only.unwrap_or_default(),
            client_affinity_enabled: properties.client_affinity_enabled.unwrap_or_default(),
            client_cert_enabled: properties.client_cert_enabled.unwrap_or_default(),
            tags: site.tags.clone(),
            app_settings,
            connection_strings: convert::flatten_connection_strings(connection_strings),
            storage_accounts,
            site_config,
            auth_settings: auth_settings.and_then(convert::flatten_auth_settings),
            identity: site.identity.as_ref().map(|identity| ObservedIdentity {
                identity_type: identity.identity_type.clone(),
                principal_id: identity.principal_id.clone(),
                tenant_id: identity.tenant_id.clone(),
                identity_ids: identity.identity_ids.clone().unwrap_or_default(),
            }),
            default_hostname: properties.default_host_name.clone(),
            outbound_ip_addresses: convert::split_ip_list(
                properties.outbound_ip_addresses.as_deref(),
            ),
            possible_outbound_ip_addresses: convert::split_ip_list(
                properties.possible_outbound_ip_addresses.as_deref(),
            ),
            site_credentials: credentials.map(|credential| SiteCredentials {
                username: credential.publishing_user_name,
                password: credential.publishing_password,
            }),
            status: ResourceStatus::Present,
        }
    }
}

/// Observed state of a Function App: the site envelope plus function keys
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedFunctionApp {
    pub site: ObservedSite,
    pub master_key: Option<String>,
    pub function_keys: BTreeMap<String, String>,
}

/// Observed state of a deployment slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedSlot {
    pub site: ObservedSite,
    pub slot_name: String,
    pub app_service_name: String,
}

/// Observed state of an App Service Environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedEnvironment {
    pub id: String,
    pub name: String,
    pub resource_group: String,
    pub location: String,
    pub subnet_id: Option<String>,
    pub pricing_tier: Option<siteflow_core::model::PricingTier>,
    pub front_end_scale_factor: Option<u32>,
    pub internal_load_balancing_mode: Option<siteflow_core::model::LoadBalancingMode>,
    pub allowed_user_ip_cidrs: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub status: ResourceStatus,
}

impl ObservedEnvironment {
    pub(crate) fn assemble(environment: &wire::HostingEnvironment, resource_group: &str) -> Self {
        let properties = &environment.properties;
        Self {
            id: environment.id.clone().unwrap_or_default(),
            name: environment.name.clone().unwrap_or_default(),
            resource_group: resource_group.to_string(),
            location: environment.location.clone(),
            subnet_id: properties
                .virtual_network
                .as_ref()
                .map(|profile| profile.id.clone()),
            pricing_tier: properties
                .multi_size
                .as_deref()
                .and_then(convert::worker_size_to_pricing_tier),
            front_end_scale_factor: properties.front_end_scale_factor,
            internal_load_balancing_mode: properties
                .internal_load_balancing_mode
                .as_deref()
                .and_then(convert::load_balancing_mode_from_wire),
            allowed_user_ip_cidrs: properties
                .user_whitelisted_ip_ranges
                .clone()
                .unwrap_or_default(),
            tags: environment.tags.clone(),
            status: match properties.provisioning_state.as_deref() {
                Some("InProgress") | Some("Provisioning") => ResourceStatus::Creating,
                Some("Deleting") => ResourceStatus::Deleting,
                Some("Failed") => ResourceStatus::Failed,
                _ => ResourceStatus::Present,
            },
        }
    }
}

/// Observed state of a Swift virtual-network connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedSwiftConnection {
    pub id: String,
    pub subnet_id: String,
}
