//! App Service Environment reconciler

use crate::client::EnvironmentsApi;
use crate::convert;
use crate::observed::ObservedEnvironment;
use async_trait::async_trait;
use siteflow_cloud::{Action, ClientError, Plan, Reconcile, ReconcileError, Result};
use siteflow_core::HostingEnvironmentId;
use siteflow_core::model::EnvironmentConfig;

const RESOURCE_TYPE: &str = "app_service_environment";

/// Reconciles an App Service Environment against the management API
pub struct EnvironmentReconciler<'a, C: EnvironmentsApi> {
    client: &'a C,
}

impl<'a, C: EnvironmentsApi> EnvironmentReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn api_err(&self, name: &str, resource_group: &str, source: ClientError) -> ReconcileError {
        ReconcileError::api(RESOURCE_TYPE, name, resource_group, source)
    }
}

#[async_trait]
impl<C: EnvironmentsApi> Reconcile for EnvironmentReconciler<'_, C> {
    type Config = EnvironmentConfig;
    type Id = HostingEnvironmentId;
    type Observed = ObservedEnvironment;

    async fn plan(&self, config: &EnvironmentConfig) -> Result<Plan> {
        config.validate()?;
        let resource_group = &config.resource_group;
        let name = &config.name;

        let current = self
            .client
            .get_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        let Some(environment) = current else {
            return Ok(Plan::new(vec![Action::create(
                RESOURCE_TYPE,
                name,
                resource_group,
            )]));
        };

        let properties = &environment.properties;
        let mut changed = Vec::new();
        if properties.multi_size.as_deref()
            != Some(convert::pricing_tier_to_worker_size(config.pricing_tier))
        {
            changed.push("pricing_tier");
        }
        if properties.front_end_scale_factor != Some(config.front_end_scale_factor) {
            changed.push("front_end_scale_factor");
        }
        if properties.internal_load_balancing_mode.as_deref()
            != Some(convert::load_balancing_mode_to_wire(
                config.internal_load_balancing_mode,
            ))
        {
            changed.push("internal_load_balancing_mode");
        }
        if properties
            .user_whitelisted_ip_ranges
            .as_deref()
            .unwrap_or(&[])
            != config.allowed_user_ip_cidrs.as_slice()
        {
            changed.push("allowed_user_ip_cidrs");
        }
        if environment.tags != config.tags {
            changed.push("tags");
        }

        let action = if changed.is_empty() {
            Action::no_op(RESOURCE_TYPE, name, resource_group)
        } else {
            Action::update(RESOURCE_TYPE, name, resource_group, changed, Vec::new())
        };
        Ok(Plan::new(vec![action]))
    }

    async fn create(&self, config: &EnvironmentConfig) -> Result<ObservedEnvironment> {
        config.validate()?;
        let resource_group = &config.resource_group;
        let name = &config.name;

        let existing = self
            .client
            .get_environment(resource_group, name)
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

        let envelope = convert::expand_environment(config);
        tracing::info!(name = %name, resource_group = %resource_group, "creating app service environment");
        self.client
            .create_or_update_environment(resource_group, name, &envelope)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        let read = self
            .client
            .get_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;
        Ok(ObservedEnvironment::assemble(&read, resource_group))
    }

    async fn read(&self, id: &HostingEnvironmentId) -> Result<Option<ObservedEnvironment>> {
        let resource_group = &id.resource_group;
        let name = &id.name;

        match self
            .client
            .get_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
        {
            None => {
                tracing::debug!(name = %name, "environment not found; clearing state");
                Ok(None)
            }
            Some(environment) => Ok(Some(ObservedEnvironment::assemble(
                &environment,
                resource_group,
            ))),
        }
    }

    async fn update(
        &self,
        id: &HostingEnvironmentId,
        config: &EnvironmentConfig,
    ) -> Result<ObservedEnvironment> {
        config.validate()?;
        let resource_group = &id.resource_group;
        let name = &id.name;

        // the configuration specifies every mutable field, so the merge
        // reduces to confirming the target still exists before the PUT
        self.client
            .get_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::UpdateTargetMissing {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;

        let envelope = convert::expand_environment(config);
        tracing::info!(name = %name, resource_group = %resource_group, "updating app service environment");
        self.client
            .create_or_update_environment(resource_group, name, &envelope)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        let read = self
            .client
            .get_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
            .ok_or_else(|| ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: name.clone(),
                resource_group: resource_group.clone(),
            })?;
        Ok(ObservedEnvironment::assemble(&read, resource_group))
    }

    async fn delete(&self, id: &HostingEnvironmentId) -> Result<()> {
        let resource_group = &id.resource_group;
        let name = &id.name;

        let found = self
            .client
            .delete_environment(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;
        if !found {
            tracing::debug!(name = %name, "environment was already absent");
        }

        if self
            .client
            .get_environment(resource_group, name)
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

    async fn import(&self, raw_id: &str) -> Result<ObservedEnvironment> {
        let id: HostingEnvironmentId = raw_id.parse()?;
        match self.read(&id).await? {
            Some(observed) => Ok(observed),
            None => Err(ReconcileError::ImportNotFound {
                resource_type: RESOURCE_TYPE,
                id: raw_id.to_string(),
            }),
        }
    }
}
