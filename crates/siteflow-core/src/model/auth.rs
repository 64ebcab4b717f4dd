//! Authentication / authorization settings block
//!
//! Auth settings live on a separate sub-resource of the site and are written
//! through their own update call rather than the main envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity provider used when `default_provider` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthProvider {
    AzureActiveDirectory,
    Facebook,
    Github,
    Google,
    MicrosoftAccount,
    Twitter,
}

/// What happens to requests that carry no authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnauthenticatedClientAction {
    RedirectToLoginPage,
    AllowAnonymous,
}

/// Azure Active Directory provider settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AadSettings {
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub allowed_audiences: Vec<String>,
}

/// Facebook provider settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FacebookSettings {
    pub app_id: String,
    pub app_secret: String,
    #[serde(default)]
    pub oauth_scopes: Vec<String>,
}

/// Google provider settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub oauth_scopes: Vec<String>,
}

/// Microsoft account provider settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MicrosoftSettings {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub oauth_scopes: Vec<String>,
}

/// Twitter provider settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TwitterSettings {
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// The `auth_settings` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSettings {
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<AuthProvider>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,

    #[serde(default)]
    pub allowed_external_redirect_urls: Vec<String>,

    #[serde(default)]
    pub token_store_enabled: bool,

    /// Hours after session-token expiry during which a refresh is still
    /// accepted
    #[serde(default = "default_token_refresh_extension_hours")]
    pub token_refresh_extension_hours: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unauthenticated_client_action: Option<UnauthenticatedClientAction>,

    #[serde(default)]
    pub additional_login_params: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory: Option<AadSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<FacebookSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microsoft: Option<MicrosoftSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<TwitterSettings>,
}

fn default_token_refresh_extension_hours() -> u32 {
    72
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            default_provider: None,
            issuer: None,
            runtime_version: None,
            allowed_external_redirect_urls: Vec::new(),
            token_store_enabled: false,
            token_refresh_extension_hours: default_token_refresh_extension_hours(),
            unauthenticated_client_action: None,
            additional_login_params: BTreeMap::new(),
            active_directory: None,
            facebook: None,
            google: None,
            microsoft: None,
            twitter: None,
        }
    }
}
