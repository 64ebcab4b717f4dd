//! Shared site configuration block
//!
//! Both hosting resources and their deployment slots carry the same
//! `site_config` block; it is declared once here and embedded by the
//! per-resource configuration types.

use super::collections::{BlockList, IpRestriction, normalize_ip_restrictions};
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// FTP/FTPS publishing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FtpsState {
    AllAllowed,
    FtpsOnly,
    Disabled,
}

/// Minimum inbound TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.0")]
    OneZero,
    #[serde(rename = "1.1")]
    OneOne,
    #[serde(rename = "1.2")]
    OneTwo,
}

impl TlsVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneZero => "1.0",
            Self::OneOne => "1.1",
            Self::OneTwo => "1.2",
        }
    }
}

/// Source-control integration kind for the SCM site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScmType {
    None,
    BitbucketGit,
    BitbucketHg,
    CodePlexGit,
    CodePlexHg,
    Dropbox,
    ExternalGit,
    ExternalHg,
    GitHub,
    LocalGit,
    OneDrive,
    Tfs,
    Vso,
    VstsRm,
}

/// CORS settings block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub support_credentials: bool,
}

/// The `site_config` nested block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub always_on: bool,

    #[serde(default)]
    pub http2_enabled: bool,

    #[serde(default)]
    pub websockets_enabled: bool,

    #[serde(default)]
    pub use_32_bit_worker_process: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftps_state: Option<FtpsState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_tls_version: Option<TlsVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_type: Option<ScmType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_fx_version: Option<String>,

    /// Instances kept warm for a Function App on a premium plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_warmed_instance_count: Option<u32>,

    #[serde(default, skip_serializing_if = "BlockList::is_unset")]
    pub ip_restrictions: BlockList<IpRestriction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsSettings>,
}

impl SiteConfig {
    /// Validate the block locally, including any declared ip_restriction
    /// collection, without touching the remote API
    pub fn validate(&self) -> Result<()> {
        if let Some(count) = self.pre_warmed_instance_count {
            if count > 10 {
                return Err(CoreError::InvalidField {
                    field: "site_config.pre_warmed_instance_count",
                    value: count.to_string(),
                    reason: "must be between 0 and 10".to_string(),
                });
            }
        }
        if let Some(declared) = self.ip_restrictions.as_set() {
            normalize_ip_restrictions(declared)?;
        }
        Ok(())
    }
}
