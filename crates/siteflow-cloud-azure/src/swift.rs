//! Swift virtual-network connection reconciler
//!
//! The connection is a singleton attachment on a site or slot, so the usual
//! create/update split collapses: both are the same idempotent PUT, and
//! attaching to the subnet the site is already connected to is a no-op.
//! Detach must survive the parent having been cascade-deleted.

use crate::client::{SitesApi, VnetApi};
use crate::observed::ObservedSwiftConnection;
use crate::wire;
use async_trait::async_trait;
use siteflow_cloud::{Action, ClientError, Plan, Reconcile, ReconcileError, Result};
use siteflow_core::SwiftConnectionId;
use siteflow_core::model::SwiftConnectionConfig;

const RESOURCE_TYPE: &str = "app_service_virtual_network_swift_connection";

/// Reconciles the virtual-network attachment of a site or slot
pub struct SwiftConnectionReconciler<'a, C: VnetApi + SitesApi> {
    client: &'a C,
}

impl<'a, C: VnetApi + SitesApi> SwiftConnectionReconciler<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    fn api_err(&self, name: &str, resource_group: &str, source: ClientError) -> ReconcileError {
        ReconcileError::api(RESOURCE_TYPE, name, resource_group, source)
    }

    /// Resolve the parent site (or slot) the connection hangs off, failing
    /// fast when it does not exist
    async fn ensure_parent(&self, config: &SwiftConnectionConfig) -> Result<SwiftConnectionId> {
        let site_id = config.site_id()?;
        let resource_group = &site_id.resource_group;
        let site_name = &site_id.site_name;

        let parent_exists = match config.slot_name.as_deref() {
            None => self
                .client
                .get_site(resource_group, site_name)
                .await
                .map_err(|e| self.api_err(site_name, resource_group, e))?
                .is_some(),
            Some(slot) => self
                .client
                .get_slot(resource_group, site_name, slot)
                .await
                .map_err(|e| self.api_err(site_name, resource_group, e))?
                .is_some(),
        };
        if !parent_exists {
            return Err(ReconcileError::ParentNotFound {
                parent_type: if config.slot_name.is_some() {
                    "app_service_slot"
                } else {
                    "app_service"
                },
                parent_name: match config.slot_name.as_deref() {
                    Some(slot) => format!("{site_name}/{slot}"),
                    None => site_name.clone(),
                },
                resource_type: RESOURCE_TYPE,
                name: site_name.clone(),
                resource_group: resource_group.clone(),
            });
        }

        Ok(match config.slot_name.clone() {
            Some(slot) => SwiftConnectionId::for_slot(site_id, slot),
            None => SwiftConnectionId::for_site(site_id),
        })
    }

    /// The attached subnet, if the connection object is live
    async fn current_subnet(&self, id: &SwiftConnectionId) -> Result<Option<String>> {
        let resource_group = &id.site.resource_group;
        let site_name = &id.site.site_name;
        let connection = self
            .client
            .get_swift_connection(resource_group, site_name, id.slot_name.as_deref())
            .await
            .map_err(|e| self.api_err(site_name, resource_group, e))?;
        Ok(connection.and_then(|c| c.properties.subnet_resource_id))
    }

    /// Create and update in one: an idempotent PUT of the attachment
    async fn attach(&self, config: &SwiftConnectionConfig) -> Result<ObservedSwiftConnection> {
        config.validate()?;
        let id = self.ensure_parent(config).await?;
        let resource_group = id.site.resource_group.clone();
        let site_name = id.site.site_name.clone();

        // attaching to the already-connected subnet is a no-op update
        if self.current_subnet(&id).await?.as_deref() == Some(config.subnet_id.as_str()) {
            tracing::debug!(site = %site_name, "subnet already attached");
            return Ok(ObservedSwiftConnection {
                id: id.to_string(),
                subnet_id: config.subnet_id.clone(),
            });
        }

        let connection = wire::SwiftVirtualNetwork {
            id: None,
            name: None,
            properties: wire::SwiftVirtualNetworkProperties {
                subnet_resource_id: Some(config.subnet_id.clone()),
                swift_supported: Some(true),
            },
        };
        tracing::info!(site = %site_name, subnet = %config.subnet_id, "attaching virtual network");
        self.client
            .put_swift_connection(
                &resource_group,
                &site_name,
                id.slot_name.as_deref(),
                &connection,
            )
            .await
            .map_err(|e| self.api_err(&site_name, &resource_group, e))?;

        let subnet = self.current_subnet(&id).await?.ok_or_else(|| {
            ReconcileError::MissingAfterWrite {
                resource_type: RESOURCE_TYPE,
                name: site_name.clone(),
                resource_group: resource_group.clone(),
            }
        })?;
        Ok(ObservedSwiftConnection {
            id: id.to_string(),
            subnet_id: subnet,
        })
    }
}

#[async_trait]
impl<C: VnetApi + SitesApi> Reconcile for SwiftConnectionReconciler<'_, C> {
    type Config = SwiftConnectionConfig;
    type Id = SwiftConnectionId;
    type Observed = ObservedSwiftConnection;

    async fn plan(&self, config: &SwiftConnectionConfig) -> Result<Plan> {
        config.validate()?;
        let id = self.ensure_parent(config).await?;
        let resource_group = id.site.resource_group.clone();
        let site_name = id.site.site_name.clone();

        let action = match self.current_subnet(&id).await? {
            None => Action::create(RESOURCE_TYPE, &site_name, &resource_group),
            Some(subnet) if subnet == config.subnet_id => {
                Action::no_op(RESOURCE_TYPE, &site_name, &resource_group)
            }
            Some(_) => Action::update(
                RESOURCE_TYPE,
                &site_name,
                &resource_group,
                vec!["subnet_id"],
                Vec::new(),
            ),
        };
        Ok(Plan::new(vec![action]))
    }

    async fn create(&self, config: &SwiftConnectionConfig) -> Result<ObservedSwiftConnection> {
        self.attach(config).await
    }

    async fn read(&self, id: &SwiftConnectionId) -> Result<Option<ObservedSwiftConnection>> {
        Ok(self
            .current_subnet(id)
            .await?
            .map(|subnet| ObservedSwiftConnection {
                id: id.to_string(),
                subnet_id: subnet,
            }))
    }

    async fn update(
        &self,
        _id: &SwiftConnectionId,
        config: &SwiftConnectionConfig,
    ) -> Result<ObservedSwiftConnection> {
        self.attach(config).await
    }

    async fn delete(&self, id: &SwiftConnectionId) -> Result<()> {
        let resource_group = &id.site.resource_group;
        let site_name = &id.site.site_name;

        // tolerate a connection (or its whole parent) that is already gone
        let found = self
            .client
            .delete_swift_connection(resource_group, site_name, id.slot_name.as_deref())
            .await
            .map_err(|e| self.api_err(site_name, resource_group, e))?;
        if !found {
            tracing::debug!(site = %site_name, "virtual network connection was already detached");
        }
        Ok(())
    }

    async fn import(&self, raw_id: &str) -> Result<ObservedSwiftConnection> {
        let id: SwiftConnectionId = raw_id.parse()?;
        match self.read(&id).await? {
            Some(observed) => Ok(observed),
            None => Err(ReconcileError::ImportNotFound {
                resource_type: RESOURCE_TYPE,
                id: raw_id.to_string(),
            }),
        }
    }
}
