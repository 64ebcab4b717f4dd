//! App Service reconciler

use crate::client::SitesApi;
use crate::convert::{self, SiteEnvelopeParts};
use crate::diff;
use crate::observed::ObservedSite;
use crate::wire;
use async_trait::async_trait;
use siteflow_cloud::{Action, ClientError, Plan, Reconcile, ReconcileError, Result};
use siteflow_core::SiteId;
use siteflow_core::model::AppServiceConfig;

const RESOURCE_TYPE: &str = "app_service";

/// Reconciles an App Service against the management API
pub struct AppServiceReconciler<'a, C: SitesApi> {
    client: &'a C,
}

impl<'a, C: SitesApi> AppServiceReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn api_err(&self, name: &str, resource_group: &str, source: ClientError) -> ReconcileError {
        ReconcileError::api(RESOURCE_TYPE, name, resource_group, source)
    }

    fn envelope(
        &self,
        config: &AppServiceConfig,
        current: Option<&wire::Site>,
    ) -> Result<wire::Site> {
        let envelope = convert::build_site_envelope(
            SiteEnvelopeParts {
                kind: Some("app"),
                location: &config.location,
                server_farm_id: &config.app_service_plan_id,
                enabled: config.enabled,
                https_only: config.https_only,
                client_affinity_enabled: config.client_affinity_enabled,
                client_cert_enabled: Some(config.client_cert_enabled),
                daily_memory_time_quota: None,
                tags: &config.tags,
                app_settings: config.app_settings.clone(),
                connection_strings: &config.connection_strings,
                storage_accounts: Some(&config.storage_accounts),
                site_config: &config.site_config,
                identity: config.identity.as_ref(),
            },
            current,
        )?;
        Ok(envelope)
    }

    /// Gather the envelope plus the secret-bearing list calls into the
    /// materialized observed state
    async fn observe(
        &self,
        resource_group: &str,
        name: &str,
        site: wire::Site,
    ) -> Result<ObservedSite> {
        let app_settings = self
            .client
            .list_app_settings(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        let connection_strings = self
            .client
            .list_connection_strings(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        let auth_settings = self
            .client
            .get_auth_settings(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        let credentials = self
            .client
            .list_site_credentials(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        Ok(ObservedSite::assemble(
            &site,
            resource_group,
            app_settings,
            &connection_strings,
            Some(&auth_settings),
            Some(credentials),
        ))
    }

    async fn push_auth_settings(&self, config: &AppServiceConfig) -> Result<()> {
        if let Some(auth_settings) = &config.auth_settings {
            self.client
                .update_auth_settings(
                    &config.resource_group,
                    &config.name,
                    None,
                    &convert::expand_auth_settings(auth_settings),
                )
                .await
                .map_err(|e| self.api_err(&config.name, &config.resource_group, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: SitesApi> Reconcile for AppServiceReconciler<'_, C> {
    type Config = AppServiceConfig;
    type Id = SiteId;
    type Observed = ObservedSite;

    async fn plan(&self, config: &AppServiceConfig) -> Result<Plan> {
        config.validate()?;
        let resource_group = &config.resource_group;
        let name = &config.name;

        let current = self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        let Some(site) = current else {
            return Ok(Plan::new(vec![Action::create(
                RESOURCE_TYPE,
                name,
                resource_group,
            )]));
        };

        let properties = &site.properties;
        let mut changed = Vec::new();
        if properties.enabled.unwrap_or(true) != config.enabled {
            changed.push("enabled");
        }
        if properties.https_only.unwrap_or_default() != config.https_only {
            changed.push("https_only");
        }
        if properties.client_affinity_enabled.unwrap_or_default() != config.client_affinity_enabled
        {
            changed.push("client_affinity_enabled");
        }
        if properties.client_cert_enabled.unwrap_or_default() != config.client_cert_enabled {
            changed.push("client_cert_enabled");
        }
        if properties.server_farm_id.as_deref() != Some(config.app_service_plan_id.as_str()) {
            changed.push("app_service_plan_id");
        }
        if site.tags != config.tags {
            changed.push("tags");
        }

        let (mut config_changed, mut collections) =
            diff::diff_site_config(&config.site_config, properties.site_config.as_ref())?;
        changed.append(&mut config_changed);

        let remote_settings = self
            .client
            .list_app_settings(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        if remote_settings != config.app_settings {
            changed.push("app_settings");
        }

        let remote_connections = self
            .client
            .list_connection_strings(resource_group, name, None)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        if let Some(change) =
            diff::diff_connection_strings(&config.connection_strings, &remote_connections)
        {
            if !change.is_noop() {
                collections.push(change);
            }
        }
        if let Some(change) = diff::diff_storage_accounts(
            &config.storage_accounts,
            properties
                .site_config
                .as_ref()
                .and_then(|c| c.azure_storage_accounts.as_ref()),
        ) {
            if !change.is_noop() {
                collections.push(change);
            }
        }

        let action = if changed.is_empty() && collections.is_empty() {
            Action::no_op(RESOURCE_TYPE, name, resource_group)
        } else {
            Action::update(RESOURCE_TYPE, name, resource_group, changed, collections)
        };
        Ok(Plan::new(vec![action]))
    }

    async fn create(&self, config: &AppServiceConfig) -> Result<ObservedSite> {
        config.validate()?;
        let resource_group = &config.resource_group;
        let name = &config.name;

        // create and update share one remote verb, so a blind write would
        // silently adopt whatever already lives at this identity
        let existing = self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        if let Some(existing) = existing {
            return Err(ReconcileError::RequiresImport {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
                id: existing.id.unwrap_or_default(),
            });
        }

        let envelope = self.envelope(config, None)?;
        tracing::info!(name = %name, resource_group = %resource_group, "creating app service");
        self.client
            .create_or_update_site(resource_group, name, &envelope)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        self.push_auth_settings(config).await?;

        let read = self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;
        self.observe(resource_group, name, read).await
    }

    async fn read(&self, id: &SiteId) -> Result<Option<ObservedSite>> {
        let resource_group = &id.resource_group;
        let name = &id.site_name;

        match self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
        {
            None => {
                tracing::debug!(name = %name, "app service not found; clearing state");
                Ok(None)
            }
            Some(site) => Ok(Some(self.observe(resource_group, name, site).await?)),
        }
    }

    async fn update(&self, id: &SiteId, config: &AppServiceConfig) -> Result<ObservedSite> {
        config.validate()?;
        let resource_group = &id.resource_group;
        let name = &id.site_name;

        // fetch-merge-submit: the PUT replaces whole sub-objects, so the
        // current envelope supplies every field this config leaves unset
        let current = self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::UpdateTargetMissing {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;

        let envelope = self.envelope(config, Some(&current))?;
        tracing::info!(name = %name, resource_group = %resource_group, "updating app service");
        self.client
            .create_or_update_site(resource_group, name, &envelope)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        self.push_auth_settings(config).await?;

        let read = self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;
        self.observe(resource_group, name, read).await
    }

    async fn delete(&self, id: &SiteId) -> Result<()> {
        let resource_group = &id.resource_group;
        let name = &id.site_name;

        let found = self
            .client
            .delete_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        if !found {
            tracing::debug!(name = %name, "app service was already absent");
        }

        // confirm absence rather than trusting the delete response
        if self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .is_some()
        {
            return Err(ReconcileError::StillExistsAfterDelete {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            });
        }
        Ok(())
    }

    async fn import(&self, raw_id: &str) -> Result<ObservedSite> {
        let id: SiteId = raw_id.parse()?;
        match self.read(&id).await? {
            Some(observed) => Ok(observed),
            None => Err(ReconcileError::ImportNotFound {
                resource_type: RESOURCE_TYPE,
                id: raw_id.to_string(),
            }),
        }
    }
}
