//! Management API capability traits
//!
//! Each resource family gets an interface carrying exactly the verbs its
//! reconcilers need; implementations wrap the HTTP transport (or, in tests,
//! an in-memory fake). A reconciler receives its client by reference; there
//! is no process-wide client bundle to downcast from.
//!
//! Conventions: `get_*` returns `Ok(None)` for a remote not-found and
//! `delete_*` returns whether the resource existed, so callers can implement
//! not-found-is-success semantics without string-matching errors. Transient
//! failures are retried inside implementations; whatever error reaches the
//! caller is definitive.

use crate::wire;
use async_trait::async_trait;
use siteflow_cloud::ClientError;
use std::collections::BTreeMap;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Verbs over sites and their slots
///
/// Slot-scoped variants of the auxiliary calls take `Some(slot)`; `None`
/// addresses the production site.
#[async_trait]
pub trait SitesApi: Send + Sync {
    async fn get_site(&self, resource_group: &str, name: &str) -> ClientResult<Option<wire::Site>>;

    async fn create_or_update_site(
        &self,
        resource_group: &str,
        name: &str,
        envelope: &wire::Site,
    ) -> ClientResult<wire::Site>;

    /// Returns whether the site existed
    async fn delete_site(&self, resource_group: &str, name: &str) -> ClientResult<bool>;

    async fn get_slot(
        &self,
        resource_group: &str,
        site: &str,
        slot: &str,
    ) -> ClientResult<Option<wire::Site>>;

    async fn create_or_update_slot(
        &self,
        resource_group: &str,
        site: &str,
        slot: &str,
        envelope: &wire::Site,
    ) -> ClientResult<wire::Site>;

    /// Returns whether the slot existed
    async fn delete_slot(&self, resource_group: &str, site: &str, slot: &str)
    -> ClientResult<bool>;

    /// Application settings are secrets and never ride on a GET; this is the
    /// dedicated list call
    async fn list_app_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<BTreeMap<String, String>>;

    async fn list_connection_strings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<Vec<wire::ConnStringInfo>>;

    async fn get_auth_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<wire::SiteAuthSettings>;

    async fn update_auth_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
        settings: &wire::SiteAuthSettings,
    ) -> ClientResult<()>;

    async fn list_site_credentials(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<wire::SiteCredential>;

    async fn list_function_keys(
        &self,
        resource_group: &str,
        site: &str,
    ) -> ClientResult<wire::HostKeys>;

    async fn get_app_service_plan(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<Option<wire::AppServicePlan>>;
}

/// Verbs over App Service Environments
#[async_trait]
pub trait EnvironmentsApi: Send + Sync {
    async fn get_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<Option<wire::HostingEnvironment>>;

    async fn create_or_update_environment(
        &self,
        resource_group: &str,
        name: &str,
        envelope: &wire::HostingEnvironment,
    ) -> ClientResult<wire::HostingEnvironment>;

    /// Returns whether the environment existed
    async fn delete_environment(&self, resource_group: &str, name: &str) -> ClientResult<bool>;
}

/// Verbs over the singleton Swift virtual-network connection
#[async_trait]
pub trait VnetApi: Send + Sync {
    async fn get_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<Option<wire::SwiftVirtualNetwork>>;

    /// Create and update are the same idempotent PUT
    async fn put_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
        connection: &wire::SwiftVirtualNetwork,
    ) -> ClientResult<wire::SwiftVirtualNetwork>;

    /// Returns whether a connection existed; detaching from a site that was
    /// already cascade-deleted reports `false` rather than an error
    async fn delete_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<bool>;
}
