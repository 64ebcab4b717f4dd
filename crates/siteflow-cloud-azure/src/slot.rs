//! Deployment slot reconciler
//!
//! A slot's identity is composite: the parent site plus a local name. The
//! parent is resolved before any slot-endpoint call is attempted, so a
//! missing parent surfaces as a dependency error rather than a confusing
//! remote not-found from deep inside the slot API.

use crate::client::SitesApi;
use crate::convert::{self, SiteEnvelopeParts};
use crate::diff;
use crate::observed::{ObservedSite, ObservedSlot};
use crate::wire;
use async_trait::async_trait;
use siteflow_cloud::{Action, ClientError, Plan, Reconcile, ReconcileError, Result};
use siteflow_core::SlotId;
use siteflow_core::model::SlotConfig;

const RESOURCE_TYPE: &str = "app_service_slot";

/// Reconciles a deployment slot under an App Service or Function App
pub struct SlotReconciler<'a, C: SitesApi> {
    client: &'a C,
}

impl<'a, C: SitesApi> SlotReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn api_err(&self, name: &str, resource_group: &str, source: ClientError) -> ReconcileError {
        ReconcileError::api(RESOURCE_TYPE, name, resource_group, source)
    }

    /// Fail fast when the parent site does not exist; no slot-endpoint call
    /// is made past this point without a live parent
    async fn ensure_parent(&self, config: &SlotConfig) -> Result<()> {
        let parent = self
            .client
            .get_site(&config.resource_group, &config.app_service_name)
            .await
            .map_err(|e| self.api_err(&config.name, &config.resource_group, e))?;
        if parent.is_none() {
            return Err(ReconcileError::ParentNotFound {
                parent_type: "app_service",
                parent_name: config.app_service_name.clone(),
                resource_type: RESOURCE_TYPE,
                name: config.name.clone(),
                resource_group: config.resource_group.clone(),
            });
        }
        Ok(())
    }

    fn envelope(&self, config: &SlotConfig, current: Option<&wire::Site>) -> Result<wire::Site> {
        let envelope = convert::build_site_envelope(
            SiteEnvelopeParts {
                kind: Some("app"),
                location: &config.location,
                server_farm_id: &config.app_service_plan_id,
                enabled: config.enabled,
                https_only: config.https_only,
                client_affinity_enabled: config.client_affinity_enabled,
                client_cert_enabled: None,
                daily_memory_time_quota: None,
                tags: &config.tags,
                app_settings: config.app_settings.clone(),
                connection_strings: &config.connection_strings,
                storage_accounts: None,
                site_config: &config.site_config,
                identity: config.identity.as_ref(),
            },
            current,
        )?;
        Ok(envelope)
    }

    async fn observe(
        &self,
        resource_group: &str,
        site_name: &str,
        slot_name: &str,
        site: wire::Site,
    ) -> Result<ObservedSlot> {
        let app_settings = self
            .client
            .list_app_settings(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        let connection_strings = self
            .client
            .list_connection_strings(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        let auth_settings = self
            .client
            .get_auth_settings(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        let credentials = self
            .client
            .list_site_credentials(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;

        Ok(ObservedSlot {
            site: ObservedSite::assemble(
                &site,
                resource_group,
                app_settings,
                &connection_strings,
                Some(&auth_settings),
                Some(credentials),
            ),
            slot_name: slot_name.to_string(),
            app_service_name: site_name.to_string(),
        })
    }

    async fn push_auth_settings(&self, config: &SlotConfig) -> Result<()> {
        if let Some(auth_settings) = &config.auth_settings {
            self.client
                .update_auth_settings(
                    &config.resource_group,
                    &config.app_service_name,
                    Some(&config.name),
                    &convert::expand_auth_settings(auth_settings),
                )
                .await
                .map_err(|e| self.api_err(&config.name, &config.resource_group, e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl<C: SitesApi> Reconcile for SlotReconciler<'_, C> {
    type Config = SlotConfig;
    type Id = SlotId;
    type Observed = ObservedSlot;

    async fn plan(&self, config: &SlotConfig) -> Result<Plan> {
        config.validate()?;
        self.ensure_parent(config).await?;
        let resource_group = &config.resource_group;
        let site_name = &config.app_service_name;
        let slot_name = &config.name;

        let current = self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;

        let Some(site) = current else {
            return Ok(Plan::new(vec![Action::create(
                RESOURCE_TYPE,
                slot_name,
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
            .list_app_settings(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        if remote_settings != config.app_settings {
            changed.push("app_settings");
        }

        let remote_connections = self
            .client
            .list_connection_strings(resource_group, site_name, Some(slot_name))
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        if let Some(change) =
            diff::diff_connection_strings(&config.connection_strings, &remote_connections)
        {
            if !change.is_noop() {
                collections.push(change);
            }
        }

        let action = if changed.is_empty() && collections.is_empty() {
            Action::no_op(RESOURCE_TYPE, slot_name, resource_group)
        } else {
            Action::update(RESOURCE_TYPE, slot_name, resource_group, changed, collections)
        };
        Ok(Plan::new(vec![action]))
    }

    async fn create(&self, config: &SlotConfig) -> Result<ObservedSlot> {
        config.validate()?;
        self.ensure_parent(config).await?;
        let resource_group = &config.resource_group;
        let site_name = &config.app_service_name;
        let slot_name = &config.name;

        let existing = self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        if let Some(existing) = existing {
            return Err(ReconcileError::RequiresImport {
                resource_type: RESOURCE_TYPE,
                name: slot_name.clone(),
                resource_group: resource_group.clone(),
                id: existing.id.unwrap_or_default(),
            });
        }

        let envelope = self.envelope(config, None)?;
        tracing::info!(
            slot = %slot_name,
            site = %site_name,
            resource_group = %resource_group,
            "creating deployment slot"
        );
        self.client
            .create_or_update_slot(resource_group, site_name, slot_name, &envelope)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;

        self.push_auth_settings(config).await?;

        let read = self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: slot_name.clone(),
                resource_group: resource_group.clone(),
            })?;
        self.observe(resource_group, site_name, slot_name, read)
            .await
    }

    async fn read(&self, id: &SlotId) -> Result<Option<ObservedSlot>> {
        let resource_group = &id.site.resource_group;
        let site_name = &id.site.site_name;
        let slot_name = &id.slot_name;

        match self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?
        {
            None => {
                tracing::debug!(slot = %slot_name, "slot not found; clearing state");
                Ok(None)
            }
            Some(site) => Ok(Some(
                self.observe(resource_group, site_name, slot_name, site)
                    .await?,
            )),
        }
    }

    async fn update(&self, id: &SlotId, config: &SlotConfig) -> Result<ObservedSlot> {
        config.validate()?;
        self.ensure_parent(config).await?;
        let resource_group = &id.site.resource_group;
        let site_name = &id.site.site_name;
        let slot_name = &id.slot_name;

        let current = self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?
            .ok_or_else(|| ReconcileError::UpdateTargetMissing {
                resource_type: RESOURCE_TYPE,
                name: slot_name.clone(),
                resource_group: resource_group.clone(),
            })?;

        let envelope = self.envelope(config, Some(&current))?;
        tracing::info!(
            slot = %slot_name,
            site = %site_name,
            resource_group = %resource_group,
            "updating deployment slot"
        );
        self.client
            .create_or_update_slot(resource_group, site_name, slot_name, &envelope)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;

        self.push_auth_settings(config).await?;

        let read = self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: slot_name.clone(),
                resource_group: resource_group.clone(),
            })?;
        self.observe(resource_group, site_name, slot_name, read)
            .await
    }

    async fn delete(&self, id: &SlotId) -> Result<()> {
        let resource_group = &id.site.resource_group;
        let site_name = &id.site.site_name;
        let slot_name = &id.slot_name;

        let found = self
            .client
            .delete_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?;
        if !found {
            tracing::debug!(slot = %slot_name, "slot was already absent");
        }

        if self
            .client
            .get_slot(resource_group, site_name, slot_name)
            .await
            .map_err(|e| self.api_err(slot_name, resource_group, e))?
            .is_some()
        {
            return Err(ReconcileError::StillExistsAfterDelete {
                resource_type: RESOURCE_TYPE,
                name: slot_name.clone(),
                resource_group: resource_group.clone(),
            });
        }
        Ok(())
    }

    async fn import(&self, raw_id: &str) -> Result<ObservedSlot> {
        let id: SlotId = raw_id.parse()?;
        match self.read(&id).await? {
            Some(observed) => Ok(observed),
            None => Err(ReconcileError::ImportNotFound {
                resource_type: RESOURCE_TYPE,
                id: raw_id.to_string(),
            }),
        }
    }
}
