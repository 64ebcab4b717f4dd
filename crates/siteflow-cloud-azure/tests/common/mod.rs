//! In-memory management API for reconciler tests
//!
//! Stores envelopes keyed the way the real API addresses them and records
//! every mutating call, so tests can assert not just on the resulting state
//! but on how many writes it took to get there. Reads mirror the real API's
//! quirks: application settings and connection strings never ride on a GET
//! and must come through the list calls, and deleting a site cascades to its
//! slots and virtual-network connection.

// not every test binary exercises every helper
#![allow(dead_code)]

use async_trait::async_trait;
use siteflow_cloud_azure::client::{ClientResult, EnvironmentsApi, SitesApi, VnetApi};
use siteflow_cloud_azure::wire;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const TEST_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

pub fn site_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION}/resourceGroups/{resource_group}/providers/Microsoft.Web/sites/{name}"
    )
}

pub fn slot_id(resource_group: &str, site: &str, slot: &str) -> String {
    format!("{}/slots/{slot}", site_id(resource_group, site))
}

pub fn environment_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION}/resourceGroups/{resource_group}/providers/Microsoft.Web/hostingEnvironments/{name}"
    )
}

pub fn plan_id(resource_group: &str, name: &str) -> String {
    format!(
        "/subscriptions/{TEST_SUBSCRIPTION}/resourceGroups/{resource_group}/providers/Microsoft.Web/serverfarms/{name}"
    )
}

/// The platform's implicit allow-all rule
fn default_restrictions() -> Vec<wire::IpSecurityRestriction> {
    vec![wire::IpSecurityRestriction {
        ip_address: Some("Any".to_string()),
        action: Some("Allow".to_string()),
        name: Some("Allow all".to_string()),
        priority: Some(2_147_483_647),
        ..Default::default()
    }]
}

#[derive(Default)]
struct StoredSite {
    envelope: wire::Site,
    auth: wire::SiteAuthSettings,
}

#[derive(Default)]
struct State {
    sites: BTreeMap<(String, String), StoredSite>,
    slots: BTreeMap<(String, String, String), StoredSite>,
    plans: BTreeMap<(String, String), wire::AppServicePlan>,
    environments: BTreeMap<(String, String), wire::HostingEnvironment>,
    swift: BTreeMap<(String, String, Option<String>), wire::SwiftVirtualNetwork>,
    mutations: Vec<String>,
}

/// Fake management API shared by all reconciler tests
#[derive(Default)]
pub struct FakeAzure {
    state: Mutex<State>,
}

impl FakeAzure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls that changed remote state, in order
    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.state.lock().unwrap().mutations.len()
    }

    /// Seed an App Service plan the way an orchestrator dependency would
    pub fn seed_plan(&self, resource_group: &str, name: &str, tier: &str) {
        let mut state = self.state.lock().unwrap();
        state.plans.insert(
            (resource_group.to_string(), name.to_string()),
            wire::AppServicePlan {
                id: Some(plan_id(resource_group, name)),
                name: Some(name.to_string()),
                sku: Some(wire::SkuDescription {
                    name: Some("plan-sku".to_string()),
                    tier: Some(tier.to_string()),
                    capacity: Some(1),
                }),
            },
        );
    }

    /// Drop a site out-of-band, as if something else deleted it
    pub fn remove_site_out_of_band(&self, resource_group: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .sites
            .remove(&(resource_group.to_string(), name.to_string()));
    }

    /// The stored envelope, for asserting what a PUT actually carried
    pub fn stored_site(&self, resource_group: &str, name: &str) -> Option<wire::Site> {
        let state = self.state.lock().unwrap();
        state
            .sites
            .get(&(resource_group.to_string(), name.to_string()))
            .map(|stored| stored.envelope.clone())
    }

    pub fn stored_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Option<wire::HostingEnvironment> {
        let state = self.state.lock().unwrap();
        state
            .environments
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
    }

    fn record(state: &mut State, entry: String) {
        state.mutations.push(entry);
    }

    /// Apply server-side PUT semantics to an incoming envelope
    fn store_envelope(
        incoming: &wire::Site,
        existing: Option<&StoredSite>,
        id: String,
        name: &str,
    ) -> wire::Site {
        let mut envelope = incoming.clone();
        envelope.id = Some(id);
        envelope.name = Some(name.to_string());

        let current_config = existing.and_then(|s| s.envelope.properties.site_config.as_ref());
        let mut config = envelope.properties.site_config.take().unwrap_or_default();

        // omitted sub-collections are preserved; an empty restriction list
        // resets to the platform's implicit allow-all
        match &mut config.ip_security_restrictions {
            Some(rules) if rules.is_empty() => {
                config.ip_security_restrictions = Some(default_restrictions());
            }
            Some(_) => {}
            None => {
                config.ip_security_restrictions = current_config
                    .and_then(|c| c.ip_security_restrictions.clone())
                    .or_else(|| Some(default_restrictions()));
            }
        }
        if config.app_settings.is_none() {
            config.app_settings = current_config.and_then(|c| c.app_settings.clone());
        }
        if config.connection_strings.is_none() {
            config.connection_strings = current_config.and_then(|c| c.connection_strings.clone());
        }
        if config.azure_storage_accounts.is_none() {
            config.azure_storage_accounts =
                current_config.and_then(|c| c.azure_storage_accounts.clone());
        }
        envelope.properties.site_config = Some(config);

        envelope.properties.default_host_name =
            Some(format!("{}.azurewebsites.net", name.to_lowercase()));
        envelope.properties.outbound_ip_addresses = Some("52.1.1.1,52.1.1.2".to_string());
        envelope.properties.possible_outbound_ip_addresses =
            Some("52.1.1.1,52.1.1.2,52.1.1.3".to_string());
        envelope.properties.state = Some("Running".to_string());
        envelope
    }

    /// What a GET returns: the envelope with secret-bearing collections
    /// stripped, exactly like the real API
    fn redact(envelope: &wire::Site) -> wire::Site {
        let mut site = envelope.clone();
        if let Some(config) = site.properties.site_config.as_mut() {
            config.app_settings = None;
            config.connection_strings = None;
        }
        site
    }

    fn app_settings_of(stored: &StoredSite) -> BTreeMap<String, String> {
        stored
            .envelope
            .properties
            .site_config
            .as_ref()
            .and_then(|config| config.app_settings.as_ref())
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|pair| (pair.name.clone(), pair.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn connection_strings_of(stored: &StoredSite) -> Vec<wire::ConnStringInfo> {
        stored
            .envelope
            .properties
            .site_config
            .as_ref()
            .and_then(|config| config.connection_strings.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SitesApi for FakeAzure {
    async fn get_site(&self, resource_group: &str, name: &str) -> ClientResult<Option<wire::Site>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sites
            .get(&(resource_group.to_string(), name.to_string()))
            .map(|stored| Self::redact(&stored.envelope)))
    }

    async fn create_or_update_site(
        &self,
        resource_group: &str,
        name: &str,
        envelope: &wire::Site,
    ) -> ClientResult<wire::Site> {
        let mut state = self.state.lock().unwrap();
        let key = (resource_group.to_string(), name.to_string());
        let stored = Self::store_envelope(
            envelope,
            state.sites.get(&key),
            site_id(resource_group, name),
            name,
        );
        let auth = state
            .sites
            .remove(&key)
            .map(|existing| existing.auth)
            .unwrap_or_default();
        state.sites.insert(
            key,
            StoredSite {
                envelope: stored.clone(),
                auth,
            },
        );
        Self::record(&mut state, format!("PUT site {resource_group}/{name}"));
        Ok(stored)
    }

    async fn delete_site(&self, resource_group: &str, name: &str) -> ClientResult<bool> {
        let mut state = self.state.lock().unwrap();
        let key = (resource_group.to_string(), name.to_string());
        let found = state.sites.remove(&key).is_some();
        if found {
            // the platform cascades to slots and network attachments
            state
                .slots
                .retain(|(rg, site, _), _| !(rg == resource_group && site == name));
            state
                .swift
                .retain(|(rg, site, _), _| !(rg == resource_group && site == name));
            Self::record(&mut state, format!("DELETE site {resource_group}/{name}"));
        }
        Ok(found)
    }

    async fn get_slot(
        &self,
        resource_group: &str,
        site: &str,
        slot: &str,
    ) -> ClientResult<Option<wire::Site>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .slots
            .get(&(
                resource_group.to_string(),
                site.to_string(),
                slot.to_string(),
            ))
            .map(|stored| Self::redact(&stored.envelope)))
    }

    async fn create_or_update_slot(
        &self,
        resource_group: &str,
        site: &str,
        slot: &str,
        envelope: &wire::Site,
    ) -> ClientResult<wire::Site> {
        let mut state = self.state.lock().unwrap();
        let key = (
            resource_group.to_string(),
            site.to_string(),
            slot.to_string(),
        );
        let stored = Self::store_envelope(
            envelope,
            state.slots.get(&key),
            slot_id(resource_group, site, slot),
            slot,
        );
        let auth = state
            .slots
            .remove(&key)
            .map(|existing| existing.auth)
            .unwrap_or_default();
        state.slots.insert(
            key,
            StoredSite {
                envelope: stored.clone(),
                auth,
            },
        );
        Self::record(
            &mut state,
            format!("PUT slot {resource_group}/{site}/{slot}"),
        );
        Ok(stored)
    }

    async fn delete_slot(
        &self,
        resource_group: &str,
        site: &str,
        slot: &str,
    ) -> ClientResult<bool> {
        let mut state = self.state.lock().unwrap();
        let key = (
            resource_group.to_string(),
            site.to_string(),
            slot.to_string(),
        );
        let found = state.slots.remove(&key).is_some();
        if found {
            Self::record(
                &mut state,
                format!("DELETE slot {resource_group}/{site}/{slot}"),
            );
        }
        Ok(found)
    }

    async fn list_app_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<BTreeMap<String, String>> {
        let state = self.state.lock().unwrap();
        let stored = match slot {
            None => state
                .sites
                .get(&(resource_group.to_string(), site.to_string())),
            Some(slot) => state.slots.get(&(
                resource_group.to_string(),
                site.to_string(),
                slot.to_string(),
            )),
        };
        Ok(stored.map(Self::app_settings_of).unwrap_or_default())
    }

    async fn list_connection_strings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<Vec<wire::ConnStringInfo>> {
        let state = self.state.lock().unwrap();
        let stored = match slot {
            None => state
                .sites
                .get(&(resource_group.to_string(), site.to_string())),
            Some(slot) => state.slots.get(&(
                resource_group.to_string(),
                site.to_string(),
                slot.to_string(),
            )),
        };
        Ok(stored.map(Self::connection_strings_of).unwrap_or_default())
    }

    async fn get_auth_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<wire::SiteAuthSettings> {
        let state = self.state.lock().unwrap();
        let stored = match slot {
            None => state
                .sites
                .get(&(resource_group.to_string(), site.to_string())),
            Some(slot) => state.slots.get(&(
                resource_group.to_string(),
                site.to_string(),
                slot.to_string(),
            )),
        };
        Ok(stored.map(|s| s.auth.clone()).unwrap_or_default())
    }

    async fn update_auth_settings(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
        settings: &wire::SiteAuthSettings,
    ) -> ClientResult<()> {
        let mut state = self.state.lock().unwrap();
        let stored = match slot {
            None => state
                .sites
                .get_mut(&(resource_group.to_string(), site.to_string())),
            Some(slot) => state.slots.get_mut(&(
                resource_group.to_string(),
                site.to_string(),
                slot.to_string(),
            )),
        };
        if let Some(stored) = stored {
            stored.auth = settings.clone();
        }
        let suffix = slot.map(|s| format!("/{s}")).unwrap_or_default();
        Self::record(
            &mut state,
            format!("PUT auth {resource_group}/{site}{suffix}"),
        );
        Ok(())
    }

    async fn list_site_credentials(
        &self,
        _resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<wire::SiteCredential> {
        let user = match slot {
            Some(slot) => format!("${site}__{slot}"),
            None => format!("${site}"),
        };
        Ok(wire::SiteCredential {
            publishing_user_name: user,
            publishing_password: "fake-publishing-password".to_string(),
        })
    }

    async fn list_function_keys(
        &self,
        _resource_group: &str,
        _site: &str,
    ) -> ClientResult<wire::HostKeys> {
        Ok(wire::HostKeys {
            master_key: Some("fake-master-key".to_string()),
            function_keys: BTreeMap::from([(
                "default".to_string(),
                "fake-function-key".to_string(),
            )]),
        })
    }

    async fn get_app_service_plan(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<Option<wire::AppServicePlan>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .plans
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned())
    }
}

#[async_trait]
impl EnvironmentsApi for FakeAzure {
    async fn get_environment(
        &self,
        resource_group: &str,
        name: &str,
    ) -> ClientResult<Option<wire::HostingEnvironment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .environments
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned())
    }

    async fn create_or_update_environment(
        &self,
        resource_group: &str,
        name: &str,
        envelope: &wire::HostingEnvironment,
    ) -> ClientResult<wire::HostingEnvironment> {
        let mut state = self.state.lock().unwrap();
        let mut stored = envelope.clone();
        stored.id = Some(environment_id(resource_group, name));
        stored.name = Some(name.to_string());
        stored.properties.provisioning_state = Some("Succeeded".to_string());
        stored.properties.status = Some("Ready".to_string());
        state.environments.insert(
            (resource_group.to_string(), name.to_string()),
            stored.clone(),
        );
        Self::record(
            &mut state,
            format!("PUT environment {resource_group}/{name}"),
        );
        Ok(stored)
    }

    async fn delete_environment(&self, resource_group: &str, name: &str) -> ClientResult<bool> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .environments
            .remove(&(resource_group.to_string(), name.to_string()))
            .is_some();
        if found {
            Self::record(
                &mut state,
                format!("DELETE environment {resource_group}/{name}"),
            );
        }
        Ok(found)
    }
}

#[async_trait]
impl VnetApi for FakeAzure {
    async fn get_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<Option<wire::SwiftVirtualNetwork>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .swift
            .get(&(
                resource_group.to_string(),
                site.to_string(),
                slot.map(str::to_string),
            ))
            .cloned())
    }

    async fn put_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
        connection: &wire::SwiftVirtualNetwork,
    ) -> ClientResult<wire::SwiftVirtualNetwork> {
        let mut state = self.state.lock().unwrap();
        let mut stored = connection.clone();
        stored.id = Some(match slot {
            Some(slot) => format!(
                "{}/slots/{slot}/config/virtualNetwork",
                site_id(resource_group, site)
            ),
            None => format!("{}/config/virtualNetwork", site_id(resource_group, site)),
        });
        stored.name = Some("virtualNetwork".to_string());
        state.swift.insert(
            (
                resource_group.to_string(),
                site.to_string(),
                slot.map(str::to_string),
            ),
            stored.clone(),
        );
        let suffix = slot.map(|s| format!("/{s}")).unwrap_or_default();
        Self::record(
            &mut state,
            format!("PUT swift {resource_group}/{site}{suffix}"),
        );
        Ok(stored)
    }

    async fn delete_swift_connection(
        &self,
        resource_group: &str,
        site: &str,
        slot: Option<&str>,
    ) -> ClientResult<bool> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .swift
            .remove(&(
                resource_group.to_string(),
                site.to_string(),
                slot.map(str::to_string),
            ))
            .is_some();
        if found {
            let suffix = slot.map(|s| format!("/{s}")).unwrap_or_default();
            Self::record(
                &mut state,
                format!("DELETE swift {resource_group}/{site}{suffix}"),
            );
        }
        Ok(found)
    }
}
