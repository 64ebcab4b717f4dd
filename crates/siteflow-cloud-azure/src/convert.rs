//! Expand/flatten between the configuration model and wire envelopes
//!
//! Expansion validates and normalizes on the way out; flattening produces the
//! identity-stable observed shape on the way in. The absent-vs-empty contract
//! for nested collections is applied here: an `Unset` block either inherits
//! the value from the fetched current envelope or is omitted from the PUT
//! entirely (the server preserves omitted sub-collections), while a `Set`
//! block, empty included, is always submitted verbatim.

use crate::wire;
use siteflow_core::error::Result;
use siteflow_core::model::{
    self, AuthProvider, AuthSettings, BlockList, ConnectionString, CorsSettings, FtpsState,
    IpRestriction, LoadBalancingMode, ManagedIdentity, ManagedIdentityType, PricingTier,
    RestrictionAction, RestrictionTarget, ScmType, StorageAccountMount, TlsVersion,
    UnauthenticatedClientAction, normalize_ip_restrictions,
};
use std::collections::BTreeMap;

const SERVICE_TAG: &str = "ServiceTag";

/// Everything that goes into a site envelope besides what is merged from the
/// current remote state
pub(crate) struct SiteEnvelopeParts<'a> {
    pub kind: Option<&'a str>,
    pub location: &'a str,
    pub server_farm_id: &'a str,
    pub enabled: bool,
    pub https_only: bool,
    pub client_affinity_enabled: bool,
    pub client_cert_enabled: Option<bool>,
    pub daily_memory_time_quota: Option<u32>,
    pub tags: &'a BTreeMap<String, String>,
    /// Already-merged application settings (reserved runtime keys included)
    pub app_settings: BTreeMap<String, String>,
    pub connection_strings: &'a BlockList<ConnectionString>,
    pub storage_accounts: Option<&'a BlockList<StorageAccountMount>>,
    pub site_config: &'a model::SiteConfig,
    pub identity: Option<&'a ManagedIdentity>,
}

/// Build the full envelope for a PUT, merging unmentioned fields from the
/// current remote envelope so the whole-object write reverts nothing
pub(crate) fn build_site_envelope(
    parts: SiteEnvelopeParts<'_>,
    current: Option<&wire::Site>,
) -> Result<wire::Site> {
    let current_config = current.and_then(|site| site.properties.site_config.as_ref());
    let mut site_config = expand_site_config(parts.site_config, current_config)?;

    site_config.app_settings = Some(expand_app_settings(&parts.app_settings));
    site_config.connection_strings = match parts.connection_strings.as_set() {
        Some(declared) => Some(expand_connection_strings(declared)),
        // the server preserves an omitted sub-collection
        None => None,
    };
    if let Some(storage_accounts) = parts.storage_accounts {
        site_config.azure_storage_accounts = match storage_accounts.as_set() {
            Some(declared) => Some(expand_storage_accounts(declared)),
            None => current_config.and_then(|c| c.azure_storage_accounts.clone()),
        };
    }

    Ok(wire::Site {
        id: None,
        name: None,
        location: parts.location.to_string(),
        kind: parts.kind.map(str::to_string),
        tags: parts.tags.clone(),
        identity: parts.identity.map(expand_identity),
        properties: wire::SiteProperties {
            server_farm_id: Some(parts.server_farm_id.to_string()),
            enabled: Some(parts.enabled),
            https_only: Some(parts.https_only),
            client_affinity_enabled: Some(parts.client_affinity_enabled),
            client_cert_enabled: parts.client_cert_enabled,
            daily_memory_time_quota: parts.daily_memory_time_quota,
            site_config: Some(site_config),
            ..Default::default()
        },
    })
}

/// Expand the `site_config` block, merging computed fields from the current
/// remote value when the configuration leaves them unset
pub(crate) fn expand_site_config(
    config: &model::SiteConfig,
    current: Option<&wire::SiteConfig>,
) -> Result<wire::SiteConfig> {
    let ip_security_restrictions = match config.ip_restrictions.as_set() {
        Some(declared) => Some(expand_ip_restrictions(declared)?),
        None => current.and_then(|c| c.ip_security_restrictions.clone()),
    };

    Ok(wire::SiteConfig {
        always_on: Some(config.always_on),
        http20_enabled: Some(config.http2_enabled),
        web_sockets_enabled: Some(config.websockets_enabled),
        use_32_bit_worker_process: Some(config.use_32_bit_worker_process),
        ftps_state: config
            .ftps_state
            .map(ftps_state_to_wire)
            .map(str::to_string)
            .or_else(|| current.and_then(|c| c.ftps_state.clone())),
        min_tls_version: config
            .min_tls_version
            .map(|v| v.as_str().to_string())
            .or_else(|| current.and_then(|c| c.min_tls_version.clone())),
        scm_type: config
            .scm_type
            .map(scm_type_to_wire)
            .map(str::to_string)
            .or_else(|| current.and_then(|c| c.scm_type.clone())),
        linux_fx_version: config
            .linux_fx_version
            .clone()
            .or_else(|| current.and_then(|c| c.linux_fx_version.clone())),
        pre_warmed_instance_count: config
            .pre_warmed_instance_count
            .or_else(|| current.and_then(|c| c.pre_warmed_instance_count)),
        cors: config
            .cors
            .as_ref()
            .map(expand_cors)
            .or_else(|| current.and_then(|c| c.cors.clone())),
        ip_security_restrictions,
        app_settings: None,
        connection_strings: None,
        azure_storage_accounts: None,
    })
}

/// Flatten a remote `siteConfig` into the observed block shape
///
/// Collections come back as explicit sets: the observed state records what is
/// actually there, not what the configuration happened to mention.
pub(crate) fn flatten_site_config(config: &wire::SiteConfig) -> model::SiteConfig {
    model::SiteConfig {
        always_on: config.always_on.unwrap_or_default(),
        http2_enabled: config.http20_enabled.unwrap_or_default(),
        websockets_enabled: config.web_sockets_enabled.unwrap_or_default(),
        use_32_bit_worker_process: config.use_32_bit_worker_process.unwrap_or_default(),
        ftps_state: config.ftps_state.as_deref().and_then(ftps_state_from_wire),
        min_tls_version: config
            .min_tls_version
            .as_deref()
            .and_then(tls_version_from_wire),
        scm_type: config.scm_type.as_deref().and_then(scm_type_from_wire),
        linux_fx_version: config.linux_fx_version.clone(),
        pre_warmed_instance_count: config.pre_warmed_instance_count,
        ip_restrictions: BlockList::Set(flatten_ip_restrictions(
            config.ip_security_restrictions.as_deref().unwrap_or(&[]),
        )),
        cors: config.cors.as_ref().map(flatten_cors),
    }
}

/// Expand a declared ip_restriction collection into wire rules
///
/// Normalization validates targets, default-fills priorities in declaration
/// order and rejects duplicate identities before anything is emitted.
pub(crate) fn expand_ip_restrictions(
    declared: &[IpRestriction],
) -> Result<Vec<wire::IpSecurityRestriction>> {
    let normalized = normalize_ip_restrictions(declared)?;
    Ok(normalized
        .into_iter()
        .map(|restriction| {
            let mut rule = wire::IpSecurityRestriction {
                priority: Some(restriction.priority),
                action: Some(restriction.action.to_string()),
                name: restriction.name,
                ..Default::default()
            };
            match restriction.target {
                RestrictionTarget::Cidr(address) => rule.ip_address = Some(address),
                RestrictionTarget::ServiceTag(tag) => {
                    rule.ip_address = Some(tag);
                    rule.tag = Some(SERVICE_TAG.to_string());
                }
                RestrictionTarget::Subnet(id) => rule.vnet_subnet_resource_id = Some(id),
            }
            rule
        })
        .collect())
}

/// Flatten remote rules into declared-block shape
///
/// The implicit `"Any"` allow-all rule is the platform default, not
/// configuration, and is dropped.
pub(crate) fn flatten_ip_restrictions(
    remote: &[wire::IpSecurityRestriction],
) -> Vec<IpRestriction> {
    remote
        .iter()
        .filter(|rule| rule.ip_address.as_deref() != Some("Any"))
        .map(|rule| {
            let service_tagged = rule.tag.as_deref() == Some(SERVICE_TAG);
            IpRestriction {
                ip_address: if service_tagged {
                    None
                } else {
                    rule.ip_address.clone()
                },
                service_tag: if service_tagged {
                    rule.ip_address.clone()
                } else {
                    None
                },
                virtual_network_subnet_id: rule.vnet_subnet_resource_id.clone(),
                name: rule.name.clone(),
                priority: rule.priority,
                action: rule
                    .action
                    .as_deref()
                    .and_then(restriction_action_from_wire)
                    .unwrap_or_default(),
            }
        })
        .collect()
}

pub(crate) fn expand_connection_strings(
    declared: &[ConnectionString],
) -> Vec<wire::ConnStringInfo> {
    declared
        .iter()
        .map(|connection| wire::ConnStringInfo {
            name: connection.name.clone(),
            connection_string: connection.value.clone(),
            kind: connection.kind.to_string(),
        })
        .collect()
}

pub(crate) fn flatten_connection_strings(
    remote: &[wire::ConnStringInfo],
) -> Vec<ConnectionString> {
    remote
        .iter()
        .filter_map(|info| match info.kind.parse() {
            Ok(kind) => Some(ConnectionString {
                name: info.name.clone(),
                kind,
                value: info.connection_string.clone(),
            }),
            Err(_) => {
                tracing::warn!(
                    name = %info.name,
                    kind = %info.kind,
                    "skipping connection string with unknown type"
                );
                None
            }
        })
        .collect()
}

pub(crate) fn expand_storage_accounts(
    declared: &[StorageAccountMount],
) -> BTreeMap<String, wire::AzureStorageInfoValue> {
    declared
        .iter()
        .map(|mount| {
            (
                mount.name.clone(),
                wire::AzureStorageInfoValue {
                    kind: mount.kind.to_string(),
                    account_name: mount.account_name.clone(),
                    share_name: mount.share_name.clone(),
                    access_key: mount.access_key.clone(),
                    mount_path: mount.mount_path.clone(),
                },
            )
        })
        .collect()
}

pub(crate) fn flatten_storage_accounts(
    remote: &BTreeMap<String, wire::AzureStorageInfoValue>,
) -> Vec<StorageAccountMount> {
    remote
        .iter()
        .filter_map(|(name, value)| {
            let kind = match value.kind.as_str() {
                "AzureBlob" => model::StorageType::AzureBlob,
                "AzureFiles" => model::StorageType::AzureFiles,
                other => {
                    tracing::warn!(name = %name, kind = %other, "skipping storage mount with unknown type");
                    return None;
                }
            };
            Some(StorageAccountMount {
                name: name.clone(),
                kind,
                account_name: value.account_name.clone(),
                share_name: value.share_name.clone(),
                access_key: value.access_key.clone(),
                mount_path: value.mount_path.clone(),
            })
        })
        .collect()
}

pub(crate) fn expand_app_settings(settings: &BTreeMap<String, String>) -> Vec<wire::NameValuePair> {
    settings
        .iter()
        .map(|(name, value)| wire::NameValuePair {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

pub(crate) fn expand_cors(cors: &CorsSettings) -> wire::CorsInfo {
    wire::CorsInfo {
        allowed_origins: cors.allowed_origins.clone(),
        support_credentials: Some(cors.support_credentials),
    }
}

pub(crate) fn flatten_cors(cors: &wire::CorsInfo) -> CorsSettings {
    CorsSettings {
        allowed_origins: cors.allowed_origins.clone(),
        support_credentials: cors.support_credentials.unwrap_or_default(),
    }
}

pub(crate) fn expand_identity(identity: &ManagedIdentity) -> wire::ManagedServiceIdentity {
    wire::ManagedServiceIdentity {
        identity_type: identity_type_to_wire(identity.identity_type).to_string(),
        principal_id: None,
        tenant_id: None,
        identity_ids: if identity.identity_ids.is_empty() {
            None
        } else {
            Some(identity.identity_ids.clone())
        },
    }
}

pub(crate) fn expand_auth_settings(settings: &AuthSettings) -> wire::SiteAuthSettings {
    let mut wire_settings = wire::SiteAuthSettings {
        enabled: Some(settings.enabled),
        default_provider: settings
            .default_provider
            .map(auth_provider_to_wire)
            .map(str::to_string),
        issuer: settings.issuer.clone(),
        runtime_version: settings.runtime_version.clone(),
        allowed_external_redirect_urls: if settings.allowed_external_redirect_urls.is_empty() {
            None
        } else {
            Some(settings.allowed_external_redirect_urls.clone())
        },
        token_store_enabled: Some(settings.token_store_enabled),
        token_refresh_extension_hours: Some(f64::from(settings.token_refresh_extension_hours)),
        unauthenticated_client_action: settings.unauthenticated_client_action.map(|action| {
            match action {
                UnauthenticatedClientAction::RedirectToLoginPage => "RedirectToLoginPage",
                UnauthenticatedClientAction::AllowAnonymous => "AllowAnonymous",
            }
            .to_string()
        }),
        additional_login_params: if settings.additional_login_params.is_empty() {
            None
        } else {
            Some(settings.additional_login_params.clone())
        },
        ..Default::default()
    };

    if let Some(aad) = &settings.active_directory {
        wire_settings.client_id = Some(aad.client_id.clone());
        wire_settings.client_secret = aad.client_secret.clone();
        wire_settings.allowed_audiences = Some(aad.allowed_audiences.clone());
    }
    if let Some(facebook) = &settings.facebook {
        wire_settings.facebook_app_id = Some(facebook.app_id.clone());
        wire_settings.facebook_app_secret = Some(facebook.app_secret.clone());
        wire_settings.facebook_oauth_scopes = Some(facebook.oauth_scopes.clone());
    }
    if let Some(google) = &settings.google {
        wire_settings.google_client_id = Some(google.client_id.clone());
        wire_settings.google_client_secret = Some(google.client_secret.clone());
        wire_settings.google_oauth_scopes = Some(google.oauth_scopes.clone());
    }
    if let Some(microsoft) = &settings.microsoft {
        wire_settings.microsoft_account_client_id = Some(microsoft.client_id.clone());
        wire_settings.microsoft_account_client_secret = Some(microsoft.client_secret.clone());
        wire_settings.microsoft_account_oauth_scopes = Some(microsoft.oauth_scopes.clone());
    }
    if let Some(twitter) = &settings.twitter {
        wire_settings.twitter_consumer_key = Some(twitter.consumer_key.clone());
        wire_settings.twitter_consumer_secret = Some(twitter.consumer_secret.clone());
    }

    wire_settings
}

/// Flatten the auth sub-resource; `None` when auth was never configured
pub(crate) fn flatten_auth_settings(settings: &wire::SiteAuthSettings) -> Option<AuthSettings> {
    let enabled = settings.enabled?;

    let active_directory = settings.client_id.as_ref().map(|client_id| model::AadSettings {
        client_id: client_id.clone(),
        client_secret: settings.client_secret.clone(),
        allowed_audiences: settings.allowed_audiences.clone().unwrap_or_default(),
    });
    let facebook = match (&settings.facebook_app_id, &settings.facebook_app_secret) {
        (Some(app_id), Some(app_secret)) => Some(model::FacebookSettings {
            app_id: app_id.clone(),
            app_secret: app_secret.clone(),
            oauth_scopes: settings.facebook_oauth_scopes.clone().unwrap_or_default(),
        }),
        _ => None,
    };
    let google = match (&settings.google_client_id, &settings.google_client_secret) {
        (Some(client_id), Some(client_secret)) => Some(model::GoogleSettings {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            oauth_scopes: settings.google_oauth_scopes.clone().unwrap_or_default(),
        }),
        _ => None,
    };
    let microsoft = match (
        &settings.microsoft_account_client_id,
        &settings.microsoft_account_client_secret,
    ) {
        (Some(client_id), Some(client_secret)) => Some(model::MicrosoftSettings {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            oauth_scopes: settings
                .microsoft_account_oauth_scopes
                .clone()
                .unwrap_or_default(),
        }),
        _ => None,
    };
    let twitter = match (
        &settings.twitter_consumer_key,
        &settings.twitter_consumer_secret,
    ) {
        (Some(consumer_key), Some(consumer_secret)) => Some(model::TwitterSettings {
            consumer_key: consumer_key.clone(),
            consumer_secret: consumer_secret.clone(),
        }),
        _ => None,
    };

    Some(AuthSettings {
        enabled,
        default_provider: settings
            .default_provider
            .as_deref()
            .and_then(auth_provider_from_wire),
        issuer: settings.issuer.clone(),
        runtime_version: settings.runtime_version.clone(),
        allowed_external_redirect_urls: settings
            .allowed_external_redirect_urls
            .clone()
            .unwrap_or_default(),
        token_store_enabled: settings.token_store_enabled.unwrap_or_default(),
        token_refresh_extension_hours: settings
            .token_refresh_extension_hours
            .map(|hours| hours as u32)
            .unwrap_or(72),
        unauthenticated_client_action: settings.unauthenticated_client_action.as_deref().and_then(
            |action| match action {
                "RedirectToLoginPage" => Some(UnauthenticatedClientAction::RedirectToLoginPage),
                "AllowAnonymous" => Some(UnauthenticatedClientAction::AllowAnonymous),
                _ => None,
            },
        ),
        additional_login_params: settings.additional_login_params.clone().unwrap_or_default(),
        active_directory,
        facebook,
        google,
        microsoft,
        twitter,
    })
}

/// Expand an environment configuration into its envelope
pub(crate) fn expand_environment(
    config: &model::EnvironmentConfig,
) -> wire::HostingEnvironment {
    wire::HostingEnvironment {
        id: None,
        name: Some(config.name.clone()),
        location: config.location.clone(),
        tags: config.tags.clone(),
        properties: wire::HostingEnvironmentProperties {
            virtual_network: Some(wire::VirtualNetworkProfile {
                id: config.subnet_id.clone(),
                subnet: None,
            }),
            internal_load_balancing_mode: Some(
                load_balancing_mode_to_wire(config.internal_load_balancing_mode).to_string(),
            ),
            multi_size: Some(pricing_tier_to_worker_size(config.pricing_tier).to_string()),
            front_end_scale_factor: Some(config.front_end_scale_factor),
            user_whitelisted_ip_ranges: Some(config.allowed_user_ip_cidrs.clone()),
            provisioning_state: None,
            status: None,
        },
    }
}

pub(crate) fn split_ip_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .filter(|address| !address.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

// string maps between model enums and wire values

pub(crate) fn ftps_state_to_wire(state: FtpsState) -> &'static str {
    match state {
        FtpsState::AllAllowed => "AllAllowed",
        FtpsState::FtpsOnly => "FtpsOnly",
        FtpsState::Disabled => "Disabled",
    }
}

pub(crate) fn ftps_state_from_wire(raw: &str) -> Option<FtpsState> {
    match raw {
        "AllAllowed" => Some(FtpsState::AllAllowed),
        "FtpsOnly" => Some(FtpsState::FtpsOnly),
        "Disabled" => Some(FtpsState::Disabled),
        _ => None,
    }
}

pub(crate) fn tls_version_from_wire(raw: &str) -> Option<TlsVersion> {
    match raw {
        "1.0" => Some(TlsVersion::OneZero),
        "1.1" => Some(TlsVersion::OneOne),
        "1.2" => Some(TlsVersion::OneTwo),
        _ => None,
    }
}

pub(crate) fn scm_type_to_wire(scm: ScmType) -> &'static str {
    match scm {
        ScmType::None => "None",
        ScmType::BitbucketGit => "BitbucketGit",
        ScmType::BitbucketHg => "BitbucketHg",
        ScmType::CodePlexGit => "CodePlexGit",
        ScmType::CodePlexHg => "CodePlexHg",
        ScmType::Dropbox => "Dropbox",
        ScmType::ExternalGit => "ExternalGit",
        ScmType::ExternalHg => "ExternalHg",
        ScmType::GitHub => "GitHub",
        ScmType::LocalGit => "LocalGit",
        ScmType::OneDrive => "OneDrive",
        ScmType::Tfs => "Tfs",
        ScmType::Vso => "VSO",
        ScmType::VstsRm => "VSTSRM",
    }
}

pub(crate) fn scm_type_from_wire(raw: &str) -> Option<ScmType> {
    match raw {
        "None" => Some(ScmType::None),
        "BitbucketGit" => Some(ScmType::BitbucketGit),
        "BitbucketHg" => Some(ScmType::BitbucketHg),
        "CodePlexGit" => Some(ScmType::CodePlexGit),
        "CodePlexHg" => Some(ScmType::CodePlexHg),
        "Dropbox" => Some(ScmType::Dropbox),
        "ExternalGit" => Some(ScmType::ExternalGit),
        "ExternalHg" => Some(ScmType::ExternalHg),
        "GitHub" => Some(ScmType::GitHub),
        "LocalGit" => Some(ScmType::LocalGit),
        "OneDrive" => Some(ScmType::OneDrive),
        "Tfs" => Some(ScmType::Tfs),
        "VSO" => Some(ScmType::Vso),
        "VSTSRM" => Some(ScmType::VstsRm),
        _ => None,
    }
}

pub(crate) fn restriction_action_from_wire(raw: &str) -> Option<RestrictionAction> {
    match raw {
        "Allow" => Some(RestrictionAction::Allow),
        "Deny" => Some(RestrictionAction::Deny),
        _ => None,
    }
}

pub(crate) fn identity_type_to_wire(identity_type: ManagedIdentityType) -> &'static str {
    match identity_type {
        ManagedIdentityType::SystemAssigned => "SystemAssigned",
        ManagedIdentityType::UserAssigned => "UserAssigned",
        ManagedIdentityType::SystemAssignedUserAssigned => "SystemAssigned, UserAssigned",
    }
}

pub(crate) fn auth_provider_to_wire(provider: AuthProvider) -> &'static str {
    match provider {
        AuthProvider::AzureActiveDirectory => "AzureActiveDirectory",
        AuthProvider::Facebook => "Facebook",
        AuthProvider::Github => "Github",
        AuthProvider::Google => "Google",
        AuthProvider::MicrosoftAccount => "MicrosoftAccount",
        AuthProvider::Twitter => "Twitter",
    }
}

pub(crate) fn auth_provider_from_wire(raw: &str) -> Option<AuthProvider> {
    match raw {
        "AzureActiveDirectory" => Some(AuthProvider::AzureActiveDirectory),
        "Facebook" => Some(AuthProvider::Facebook),
        "Github" => Some(AuthProvider::Github),
        "Google" => Some(AuthProvider::Google),
        "MicrosoftAccount" => Some(AuthProvider::MicrosoftAccount),
        "Twitter" => Some(AuthProvider::Twitter),
        _ => None,
    }
}

pub(crate) fn load_balancing_mode_to_wire(mode: LoadBalancingMode) -> &'static str {
    match mode {
        LoadBalancingMode::None => "None",
        LoadBalancingMode::Web => "Web",
        LoadBalancingMode::Publishing => "Publishing",
        LoadBalancingMode::WebPublishing => "Web, Publishing",
    }
}

pub(crate) fn load_balancing_mode_from_wire(raw: &str) -> Option<LoadBalancingMode> {
    match raw {
        "None" => Some(LoadBalancingMode::None),
        "Web" => Some(LoadBalancingMode::Web),
        "Publishing" => Some(LoadBalancingMode::Publishing),
        "Web, Publishing" => Some(LoadBalancingMode::WebPublishing),
        _ => None,
    }
}

/// Worker size backing each isolated tier
pub(crate) fn pricing_tier_to_worker_size(tier: PricingTier) -> &'static str {
    match tier {
        PricingTier::I1 => "Standard_D1_V2",
        PricingTier::I2 => "Standard_D2_V2",
        PricingTier::I3 => "Standard_D3_V2",
    }
}

pub(crate) fn worker_size_to_pricing_tier(raw: &str) -> Option<PricingTier> {
    match raw {
        "Standard_D1_V2" => Some(PricingTier::I1),
        "Standard_D2_V2" => Some(PricingTier::I2),
        "Standard_D3_V2" => Some(PricingTier::I3),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restriction(address: &str) -> IpRestriction {
        IpRestriction {
            ip_address: Some(address.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn expand_assigns_default_priorities() {
        let rules = expand_ip_restrictions(&[
            restriction("10.10.10.10/32"),
            restriction("20.20.20.0/24"),
        ])
        .unwrap();
        assert_eq!(rules[0].priority, Some(65000));
        assert_eq!(rules[1].priority, Some(65001));
        assert_eq!(rules[0].action.as_deref(), Some("Allow"));
    }

    #[test]
    fn service_tags_ride_the_address_field() {
        let rules = expand_ip_restrictions(&[IpRestriction {
            service_tag: Some("AzureFrontDoor.Backend".to_string()),
            ..Default::default()
        }])
        .unwrap();
        assert_eq!(rules[0].ip_address.as_deref(), Some("AzureFrontDoor.Backend"));
        assert_eq!(rules[0].tag.as_deref(), Some("ServiceTag"));

        let flattened = flatten_ip_restrictions(&rules);
        assert_eq!(flattened[0].service_tag.as_deref(), Some("AzureFrontDoor.Backend"));
        assert!(flattened[0].ip_address.is_none());
    }

    #[test]
    fn flatten_drops_the_implicit_allow_all() {
        let remote = vec![
            wire::IpSecurityRestriction {
                ip_address: Some("Any".to_string()),
                action: Some("Allow".to_string()),
                name: Some("Allow all".to_string()),
                ..Default::default()
            },
            wire::IpSecurityRestriction {
                ip_address: Some("10.0.0.0/8".to_string()),
                priority: Some(100),
                action: Some("Allow".to_string()),
                ..Default::default()
            },
        ];
        let flattened = flatten_ip_restrictions(&remote);
        assert_eq!(flattened.len(), 1);
        assert_eq!(flattened[0].ip_address.as_deref(), Some("10.0.0.0/8"));
    }

    #[test]
    fn unset_collections_merge_from_current() {
        let current = wire::SiteConfig {
            ip_security_restrictions: Some(vec![wire::IpSecurityRestriction {
                ip_address: Some("Any".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let expanded = expand_site_config(&model::SiteConfig::default(), Some(&current)).unwrap();
        assert_eq!(
            expanded.ip_security_restrictions,
            current.ip_security_restrictions
        );
    }

    #[test]
    fn explicit_empty_collection_clears() {
        let config = model::SiteConfig {
            ip_restrictions: BlockList::Set(Vec::new()),
            ..Default::default()
        };
        let current = wire::SiteConfig {
            ip_security_restrictions: Some(vec![wire::IpSecurityRestriction::default()]),
            ..Default::default()
        };
        let expanded = expand_site_config(&config, Some(&current)).unwrap();
        assert_eq!(expanded.ip_security_restrictions, Some(Vec::new()));
    }

    #[test]
    fn auth_settings_round_trip() {
        let settings = AuthSettings {
            enabled: true,
            issuer: Some("https://sts.windows.net/tenant/".to_string()),
            active_directory: Some(model::AadSettings {
                client_id: "client-1".to_string(),
                client_secret: Some("secret".to_string()),
                allowed_audiences: vec!["aud1".to_string()],
            }),
            ..Default::default()
        };
        let flattened = flatten_auth_settings(&expand_auth_settings(&settings)).unwrap();
        assert_eq!(flattened.enabled, settings.enabled);
        assert_eq!(flattened.issuer, settings.issuer);
        assert_eq!(flattened.active_directory, settings.active_directory);
        assert_eq!(flattened.token_refresh_extension_hours, 72);
    }

    #[test]
    fn unconfigured_auth_flattens_to_none() {
        assert!(flatten_auth_settings(&wire::SiteAuthSettings::default()).is_none());
    }

    #[test]
    fn outbound_ip_lists_split() {
        assert_eq!(
            split_ip_list(Some("52.1.1.1,52.1.1.2")),
            vec!["52.1.1.1".to_string(), "52.1.1.2".to_string()]
        );
        assert!(split_ip_list(None).is_empty());
        assert!(split_ip_list(Some("")).is_empty());
    }

    #[test]
    fn worker_sizes_map_both_ways() {
        for tier in [PricingTier::I1, PricingTier::I2, PricingTier::I3] {
            assert_eq!(
                worker_size_to_pricing_tier(pricing_tier_to_worker_size(tier)),
                Some(tier)
            );
        }
        assert!(worker_size_to_pricing_tier("Standard_D4_V2").is_none());
    }
}
