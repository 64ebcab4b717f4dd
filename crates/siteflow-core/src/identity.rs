//! Durable resource identities
//!
//! Every managed resource is addressed by an ARM-style id string. The typed
//! ids here are the only handle that survives across reconciliation passes;
//! parsing and formatting must round-trip so that an import driven purely by
//! the id string can reconstruct the full composite identity.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const WEB_NAMESPACE: &str = "Microsoft.Web";

/// Identity of an App Service or Function App
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteId {
    pub subscription_id: String,
    pub resource_group: String,
    pub site_name: String,
}

impl SiteId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        site_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            site_name: site_name.into(),
        }
    }

    /// Identity of a deployment slot under this site
    pub fn slot(&self, slot_name: impl Into<String>) -> SlotId {
        SlotId {
            site: self.clone(),
            slot_name: slot_name.into(),
        }
    }

    /// Identity of the site's virtual-network connection
    pub fn swift_connection(&self) -> SwiftConnectionId {
        SwiftConnectionId {
            site: self.clone(),
            slot_name: None,
        }
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/sites/{}",
            self.subscription_id, self.resource_group, WEB_NAMESPACE, self.site_name
        )
    }
}

impl FromStr for SiteId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = IdParser::new(s)?;
        let id = parser.site_prefix()?;
        parser.finish()?;
        Ok(id)
    }
}

/// Identity of a deployment slot, composite of the parent site and a local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub site: SiteId,
    pub slot_name: String,
}

impl SlotId {
    pub fn new(site: SiteId, slot_name: impl Into<String>) -> Self {
        Self {
            site,
            slot_name: slot_name.into(),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/slots/{}", self.site, self.slot_name)
    }
}

impl FromStr for SlotId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = IdParser::new(s)?;
        let site = parser.site_prefix()?;
        let slot_name = parser.take_pair("slots")?;
        parser.finish()?;
        Ok(Self { site, slot_name })
    }
}

/// Identity of an App Service plan
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppServicePlanId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl fmt::Display for AppServicePlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/serverfarms/{}",
            self.subscription_id, self.resource_group, WEB_NAMESPACE, self.name
        )
    }
}

impl FromStr for AppServicePlanId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = IdParser::new(s)?;
        let (subscription_id, resource_group) = parser.scope_prefix()?;
        parser.expect_provider()?;
        let name = parser.take_pair("serverfarms")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

/// Identity of an App Service Environment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostingEnvironmentId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl HostingEnvironmentId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for HostingEnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/hostingEnvironments/{}",
            self.subscription_id, self.resource_group, WEB_NAMESPACE, self.name
        )
    }
}

impl FromStr for HostingEnvironmentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = IdParser::new(s)?;
        let (subscription_id, resource_group) = parser.scope_prefix()?;
        parser.expect_provider()?;
        let name = parser.take_pair("hostingEnvironments")?;
        parser.finish()?;
        Ok(Self {
            subscription_id,
            resource_group,
            name,
        })
    }
}

/// Identity of a Swift virtual-network connection
///
/// The connection is a singleton child of a site or a slot, so its id ends in
/// the fixed `config/virtualNetwork` segment pair rather than a free name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwiftConnectionId {
    pub site: SiteId,
    pub slot_name: Option<String>,
}

impl SwiftConnectionId {
    pub fn for_site(site: SiteId) -> Self {
        Self {
            site,
            slot_name: None,
        }
    }

    pub fn for_slot(site: SiteId, slot_name: impl Into<String>) -> Self {
        Self {
            site,
            slot_name: Some(slot_name.into()),
        }
    }
}

impl fmt::Display for SwiftConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot_name {
            Some(slot) => write!(f, "{}/slots/{}/config/virtualNetwork", self.site, slot),
            None => write!(f, "{}/config/virtualNetwork", self.site),
        }
    }
}

impl FromStr for SwiftConnectionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = IdParser::new(s)?;
        let site = parser.site_prefix()?;
        let slot_name = parser.take_pair_if("slots")?;
        let config = parser.take_pair("config")?;
        if !config.eq_ignore_ascii_case("virtualNetwork") {
            return Err(CoreError::invalid_id(
                s,
                format!("expected `config/virtualNetwork`, found `config/{config}`"),
            ));
        }
        parser.finish()?;
        Ok(Self { site, slot_name })
    }
}

/// Segment walker over an ARM id string
///
/// Fixed segment keys are matched case-insensitively; values keep the casing
/// the caller supplied, which is what makes parse/format round-trip.
struct IdParser<'a> {
    raw: &'a str,
    segments: std::iter::Peekable<std::vec::IntoIter<&'a str>>,
}

impl<'a> IdParser<'a> {
    fn new(raw: &'a str) -> Result<Self> {
        let trimmed = raw
            .strip_prefix('/')
            .ok_or_else(|| CoreError::invalid_id(raw, "id must start with `/`"))?;
        if trimmed.is_empty() {
            return Err(CoreError::invalid_id(raw, "id has no segments"));
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CoreError::invalid_id(raw, "id contains an empty segment"));
        }
        Ok(Self {
            raw,
            segments: segments.into_iter().peekable(),
        })
    }

    /// Consume `key/{value}`, erroring when the key is missing
    fn take_pair(&mut self, key: &str) -> Result<String> {
        let found = self
            .segments
            .next()
            .ok_or_else(|| CoreError::invalid_id(self.raw, format!("missing `{key}` segment")))?;
        if !found.eq_ignore_ascii_case(key) {
            return Err(CoreError::invalid_id(
                self.raw,
                format!("expected `{key}` segment, found `{found}`"),
            ));
        }
        let value = self.segments.next().ok_or_else(|| {
            CoreError::invalid_id(self.raw, format!("missing value after `{key}`"))
        })?;
        Ok(value.to_string())
    }

    /// Consume `key/{value}` when the next segment matches, otherwise leave
    /// the cursor untouched
    fn take_pair_if(&mut self, key: &str) -> Result<Option<String>> {
        match self.segments.peek() {
            Some(found) if found.eq_ignore_ascii_case(key) => self.take_pair(key).map(Some),
            _ => Ok(None),
        }
    }

    /// Consume `/subscriptions/{id}/resourceGroups/{name}`
    fn scope_prefix(&mut self) -> Result<(String, String)> {
        let subscription_id = self.take_pair("subscriptions")?;
        let resource_group = self.take_pair("resourceGroups")?;
        Ok((subscription_id, resource_group))
    }

    /// Consume `/providers/Microsoft.Web`
    fn expect_provider(&mut self) -> Result<()> {
        let namespace = self.take_pair("providers")?;
        if !namespace.eq_ignore_ascii_case(WEB_NAMESPACE) {
            return Err(CoreError::invalid_id(
                self.raw,
                format!("expected provider namespace `{WEB_NAMESPACE}`, found `{namespace}`"),
            ));
        }
        Ok(())
    }

    /// Consume everything up to and including `sites/{name}`
    fn site_prefix(&mut self) -> Result<SiteId> {
        let (subscription_id, resource_group) = self.scope_prefix()?;
        self.expect_provider()?;
        let site_name = self.take_pair("sites")?;
        Ok(SiteId {
            subscription_id,
            resource_group,
            site_name,
        })
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(extra) = self.segments.next() {
            return Err(CoreError::invalid_id(
                self.raw,
                format!("unexpected trailing segment `{extra}`"),
            ));
        }
        Ok(())
    }
}
