//! Function App reconciler
//!
//! Mostly the App Service flow over a different kind discriminator, plus the
//! reserved runtime app settings derived from the backing storage account.
//! Those keys are owned by the engine and always win over user-declared
//! values of the same name.

use crate::client::SitesApi;
use crate::convert::{self, SiteEnvelopeParts};
use crate::diff;
use crate::observed::{ObservedFunctionApp, ObservedSite};
use crate::wire;
use async_trait::async_trait;
use siteflow_cloud::{Action, ClientError, Plan, Reconcile, ReconcileError, Result};
use siteflow_core::identity::AppServicePlanId;
use siteflow_core::SiteId;
use siteflow_core::model::FunctionAppConfig;
use std::collections::BTreeMap;

const RESOURCE_TYPE: &str = "function_app";

const STORAGE_SETTING: &str = "AzureWebJobsStorage";
const DASHBOARD_SETTING: &str = "AzureWebJobsDashboard";
const EXTENSION_VERSION_SETTING: &str = "FUNCTIONS_EXTENSION_VERSION";
const CONTENT_CONNECTION_SETTING: &str = "WEBSITE_CONTENTAZUREFILECONNECTIONSTRING";
const CONTENT_SHARE_SETTING: &str = "WEBSITE_CONTENTSHARE";

/// User app settings with the reserved runtime keys merged over them
fn desired_app_settings(config: &FunctionAppConfig, plan_tier: &str) -> BTreeMap<String, String> {
    let storage_connection = format!(
        "DefaultEndpointsProtocol=https;AccountName={};AccountKey={};EndpointSuffix=core.windows.net",
        config.storage_account_name, config.storage_account_access_key
    );

    let mut settings = config.app_settings.clone();
    settings.insert(STORAGE_SETTING.to_string(), storage_connection.clone());
    settings.insert(
        EXTENSION_VERSION_SETTING.to_string(),
        config.runtime_version.clone(),
    );
    if config.enable_builtin_logging {
        settings.insert(DASHBOARD_SETTING.to_string(), storage_connection.clone());
    }
    if plan_tier.eq_ignore_ascii_case("dynamic") {
        settings.insert(CONTENT_CONNECTION_SETTING.to_string(), storage_connection);
        settings.insert(CONTENT_SHARE_SETTING.to_string(), config.name.to_lowercase());
    }
    settings
}

/// Reconciles a Function App against the management API
pub struct FunctionAppReconciler<'a, C: SitesApi> {
    client: &'a C,
}

impl<'a, C: SitesApi> FunctionAppReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn api_err(&self, name: &str, resource_group: &str, source: ClientError) -> ReconcileError {
        ReconcileError::api(RESOURCE_TYPE, name, resource_group, source)
    }

    /// Look up the plan's SKU tier; consumption-plan apps get extra content
    /// settings that dedicated plans must not carry
    async fn plan_tier(&self, config: &FunctionAppConfig) -> Result<String> {
        let plan_id: AppServicePlanId = config.app_service_plan_id.parse()?;
        let plan = self
            .client
            .get_app_service_plan(&plan_id.resource_group, &plan_id.name)
            .await
            .map_err(|e| self.api_err(&config.name, &config.resource_group, e))?
            .ok_or_else(|| ReconcileError::ParentNotFound {
                parent_type: "app_service_plan",
                parent_name: plan_id.name.clone(),
                resource_type: RESOURCE_TYPE,
                name: config.name.clone(),
                resource_group: config.resource_group.clone(),
            })?;
        Ok(plan
            .sku
            .and_then(|sku| sku.tier)
            .unwrap_or_default())
    }

    fn envelope(
        &self,
        config: &FunctionAppConfig,
        app_settings: BTreeMap<String, String>,
        current: Option<&wire::Site>,
    ) -> Result<wire::Site> {
        let envelope = convert::build_site_envelope(
            SiteEnvelopeParts {
                kind: Some(config.kind()),
                location: &config.location,
                server_farm_id: &config.app_service_plan_id,
                enabled: config.enabled,
                https_only: config.https_only,
                client_affinity_enabled: config.client_affinity_enabled,
                client_cert_enabled: None,
                daily_memory_time_quota: Some(config.daily_memory_time_quota),
                tags: &config.tags,
                app_settings,
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
        name: &str,
        site: wire::Site,
    ) -> Result<ObservedFunctionApp> {
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
        let host_keys = self
            .client
            .list_function_keys(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?;

        Ok(ObservedFunctionApp {
            site: ObservedSite::assemble(
                &site,
                resource_group,
                app_settings,
                &connection_strings,
                Some(&auth_settings),
                Some(credentials),
            ),
            master_key: host_keys.master_key,
            function_keys: host_keys.function_keys,
        })
    }

    async fn push_auth_settings(&self, config: &FunctionAppConfig) -> Result<()> {
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
impl<C: SitesApi> Reconcile for FunctionAppReconciler<'_, C> {
    type Config = FunctionAppConfig;
    type Id = SiteId;
    type Observed = ObservedFunctionApp;

    async fn plan(&self, config: &FunctionAppConfig) -> Result<Plan> {
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

        let tier = self.plan_tier(config).await?;
        let desired_settings = desired_app_settings(config, &tier);

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
        if properties.daily_memory_time_quota.unwrap_or_default() != config.daily_memory_time_quota
        {
            changed.push("daily_memory_time_quota");
        }
        if properties.server_farm_id.as_deref() != Some(config.app_service_plan_id.as_str()) {
            changed.push("app_service_plan_id");
        }
        if site.kind.as_deref() != Some(config.kind()) {
            changed.push("os_type");
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
        if remote_settings != desired_settings {
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

        let action = if changed.is_empty() && collections.is_empty() {
            Action::no_op(RESOURCE_TYPE, name, resource_group)
        } else {
            Action::update(RESOURCE_TYPE, name, resource_group, changed, collections)
        };
        Ok(Plan::new(vec![action]))
    }

    async fn create(&self, config: &FunctionAppConfig) -> Result<ObservedFunctionApp> {
        config.validate()?;
        let resource_group = &config.resource_group;
        let name = &config.name;

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

        let tier = self.plan_tier(config).await?;
        let app_settings = desired_app_settings(config, &tier);
        let envelope = self.envelope(config, app_settings, None)?;

        tracing::info!(name = %name, resource_group = %resource_group, "creating function app");
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

    async fn read(&self, id: &SiteId) -> Result<Option<ObservedFunctionApp>> {
        let resource_group = &id.resource_group;
        let name = &id.site_name;

        match self
            .client
            .get_site(resource_group, name)
            .await
            .map_err(|e| self.api_err(name, resource_group, e))?
        {
            None => {
                tracing::debug!(name = %name, "function app not found; clearing state");
                Ok(None)
            }
            Some(site) => Ok(Some(self.observe(resource_group, name, site).await?)),
        }
    }

    async fn update(&self, id: &SiteId, config: &FunctionAppConfig) -> Result<ObservedFunctionApp> {
        config.validate()?;
        let resource_group = &id.resource_group;
        let name = &id.site_name;

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

        let tier = self.plan_tier(config).await?;
        let app_settings = desired_app_settings(config, &tier);
        let envelope = self.envelope(config, app_settings, Some(&current))?;

        tracing::info!(name = %name, resource_group = %resource_group, "updating function app");
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
            tracing::debug!(name = %name, "function app was already absent");
        }

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

    async fn import(&self, raw_id: &str) -> Result<ObservedFunctionApp> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FunctionAppConfig {
        FunctionAppConfig {
            name: "AcctestFunc".to_string(),
            resource_group: "acctest-rg".to_string(),
            location: "westeurope".to_string(),
            app_service_plan_id: "/subscriptions/sub1/resourceGroups/acctest-rg/providers/Microsoft.Web/serverfarms/plan1".to_string(),
            storage_account_name: "acctestsa".to_string(),
            storage_account_access_key: "key==".to_string(),
            runtime_version: "~3".to_string(),
            enable_builtin_logging: true,
            ..Default::default()
        }
    }

    #[test]
    fn reserved_settings_are_synthesized() {
        let settings = desired_app_settings(&config(), "Standard");
        assert!(settings[STORAGE_SETTING].contains("AccountName=acctestsa"));
        assert_eq!(settings[EXTENSION_VERSION_SETTING], "~3");
        assert!(settings.contains_key(DASHBOARD_SETTING));
        assert!(!settings.contains_key(CONTENT_SHARE_SETTING));
    }

    #[test]
    fn consumption_plans_add_content_settings() {
        let settings = desired_app_settings(&config(), "Dynamic");
        assert_eq!(settings[CONTENT_SHARE_SETTING], "acctestfunc");
        assert!(settings.contains_key(CONTENT_CONNECTION_SETTING));
    }

    #[test]
    fn reserved_keys_override_user_values() {
        let mut custom = config();
        custom
            .app_settings
            .insert(STORAGE_SETTING.to_string(), "user-override".to_string());
        let settings = desired_app_settings(&custom, "Standard");
        assert_ne!(settings[STORAGE_SETTING], "user-override");
    }
}
