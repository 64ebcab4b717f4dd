//! Diff helpers between desired configuration and fetched remote state
//!
//! These produce the field lists and collection deltas a plan reports. They
//! never mutate anything; the reconcilers decide what to do with a non-empty
//! result. Collection diffs go through the identity-keyed machinery so the
//! outcome is invariant under permutation of the declared blocks.

use crate::convert;
use crate::wire;
use siteflow_cloud::CollectionChange;
use siteflow_core::error::Result;
use siteflow_core::model::{
    self, BlockList, ConnectionString, StorageAccountMount, diff_elements,
    normalize_ip_restrictions,
};
use std::collections::BTreeMap;

/// Compare the `site_config` block against the remote `siteConfig`
///
/// Option-typed fields the configuration leaves unset are computed: they
/// track whatever the server holds and never count as drift.
pub(crate) fn diff_site_config(
    desired: &model::SiteConfig,
    current: Option<&wire::SiteConfig>,
) -> Result<(Vec<&'static str>, Vec<CollectionChange>)> {
    let mut changed = Vec::new();
    let mut collections = Vec::new();
    let empty = wire::SiteConfig::default();
    let current = current.unwrap_or(&empty);

    if current.always_on.unwrap_or_default() != desired.always_on {
        changed.push("site_config.always_on");
    }
    if current.http20_enabled.unwrap_or_default() != desired.http2_enabled {
        changed.push("site_config.http2_enabled");
    }
    if current.web_sockets_enabled.unwrap_or_default() != desired.websockets_enabled {
        changed.push("site_config.websockets_enabled");
    }
    if current.use_32_bit_worker_process.unwrap_or_default() != desired.use_32_bit_worker_process {
        changed.push("site_config.use_32_bit_worker_process");
    }
    if let Some(ftps_state) = desired.ftps_state {
        if current.ftps_state.as_deref() != Some(convert::ftps_state_to_wire(ftps_state)) {
            changed.push("site_config.ftps_state");
        }
    }
    if let Some(min_tls_version) = desired.min_tls_version {
        if current.min_tls_version.as_deref() != Some(min_tls_version.as_str()) {
            changed.push("site_config.min_tls_version");
        }
    }
    if let Some(scm_type) = desired.scm_type {
        if current.scm_type.as_deref() != Some(convert::scm_type_to_wire(scm_type)) {
            changed.push("site_config.scm_type");
        }
    }
    if let Some(linux_fx_version) = desired.linux_fx_version.as_deref() {
        if current.linux_fx_version.as_deref() != Some(linux_fx_version) {
            changed.push("site_config.linux_fx_version");
        }
    }
    if let Some(count) = desired.pre_warmed_instance_count {
        if current.pre_warmed_instance_count != Some(count) {
            changed.push("site_config.pre_warmed_instance_count");
        }
    }
    if let Some(cors) = desired.cors.as_ref() {
        let current_cors = current.cors.as_ref().map(convert::flatten_cors);
        if current_cors.as_ref() != Some(cors) {
            changed.push("site_config.cors");
        }
    }

    if let Some(change) = diff_ip_restrictions(
        &desired.ip_restrictions,
        current.ip_security_restrictions.as_deref().unwrap_or(&[]),
    )? {
        collections.push(change);
    }

    Ok((changed, collections))
}

/// Diff a declared ip_restriction block against the remote rules
///
/// `None` when the block was omitted; the remote collection is left
/// untouched, implicit default rules included.
pub(crate) fn diff_ip_restrictions(
    desired: &BlockList<model::IpRestriction>,
    current: &[wire::IpSecurityRestriction],
) -> Result<Option<CollectionChange>> {
    let Some(declared) = desired.as_set() else {
        return Ok(None);
    };

    let desired_normalized = normalize_ip_restrictions(declared)?;
    let current_flat = convert::flatten_ip_restrictions(current);
    let current_normalized = normalize_ip_restrictions(&current_flat)?;
    let delta = diff_elements(&desired_normalized, &current_normalized);

    Ok(Some(CollectionChange {
        collection: "ip_restriction",
        added: delta.added.len(),
        updated: delta.updated.len(),
        removed: delta.removed.len(),
    }))
}

/// Diff a declared connection_string block against the listed remote values
pub(crate) fn diff_connection_strings(
    desired: &BlockList<ConnectionString>,
    current: &[wire::ConnStringInfo],
) -> Option<CollectionChange> {
    let declared = desired.as_set()?;
    let current_flat = convert::flatten_connection_strings(current);
    let delta = diff_elements(declared, &current_flat);

    Some(CollectionChange {
        collection: "connection_string",
        added: delta.added.len(),
        updated: delta.updated.len(),
        removed: delta.removed.len(),
    })
}

/// Diff a declared storage_account block against the remote mount map
pub(crate) fn diff_storage_accounts(
    desired: &BlockList<StorageAccountMount>,
    current: Option<&BTreeMap<String, wire::AzureStorageInfoValue>>,
) -> Option<CollectionChange> {
    let declared = desired.as_set()?;
    let current_flat = current
        .map(convert::flatten_storage_accounts)
        .unwrap_or_default();
    let delta = diff_elements(declared, &current_flat);

    Some(CollectionChange {
        collection: "storage_account",
        added: delta.added.len(),
        updated: delta.updated.len(),
        removed: delta.removed.len(),
    })
}
