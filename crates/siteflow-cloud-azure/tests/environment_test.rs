mod common;

use common::{FakeAzure, environment_id};
use siteflow_cloud::{ActionType, Reconcile, ReconcileError};
use siteflow_cloud_azure::EnvironmentReconciler;
use siteflow_core::HostingEnvironmentId;
use siteflow_core::model::{EnvironmentConfig, LoadBalancingMode, PricingTier};

fn base_config() -> EnvironmentConfig {
    EnvironmentConfig {
        name: "acctest-ase".to_string(),
        resource_group: "acctest-rg".to_string(),
        location: "westeurope".to_string(),
        subnet_id: format!(
            "/subscriptions/{}/resourceGroups/acctest-rg/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/ase",
            common::TEST_SUBSCRIPTION
        ),
        pricing_tier: PricingTier::I1,
        front_end_scale_factor: 15,
        ..Default::default()
    }
}

#[tokio::test]
async fn create_materializes_the_environment() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    let observed = reconciler.create(&base_config()).await.unwrap();
    assert_eq!(observed.id, environment_id("acctest-rg", "acctest-ase"));
    assert_eq!(observed.pricing_tier, Some(PricingTier::I1));
    assert_eq!(observed.front_end_scale_factor, Some(15));
    assert_eq!(
        observed.internal_load_balancing_mode,
        Some(LoadBalancingMode::None)
    );

    let plan = reconciler.plan(&base_config()).await.unwrap();
    assert!(!plan.has_changes);
}

#[tokio::test]
async fn tier_and_scale_change_in_one_merged_write() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    reconciler.create(&base_config()).await.unwrap();
    let mutations_after_create = api.mutation_count();

    let mut updated = base_config();
    updated.pricing_tier = PricingTier::I2;
    updated.front_end_scale_factor = 10;

    let plan = reconciler.plan(&updated).await.unwrap();
    let action = &plan.actions[0];
    assert_eq!(action.action_type, ActionType::Update);
    assert!(action.changed_fields.contains(&"pricing_tier"));
    assert!(action.changed_fields.contains(&"front_end_scale_factor"));

    let id: HostingEnvironmentId = environment_id("acctest-rg", "acctest-ase").parse().unwrap();
    let observed = reconciler.update(&id, &updated).await.unwrap();
    assert_eq!(observed.pricing_tier, Some(PricingTier::I2));
    assert_eq!(observed.front_end_scale_factor, Some(10));

    // both fields traveled in a single write
    assert_eq!(api.mutation_count(), mutations_after_create + 1);
    let stored = api.stored_environment("acctest-rg", "acctest-ase").unwrap();
    assert_eq!(
        stored.properties.multi_size.as_deref(),
        Some("Standard_D2_V2")
    );
    assert_eq!(stored.properties.front_end_scale_factor, Some(10));
    // the subnet the config still declares was not reverted
    assert_eq!(
        stored.properties.virtual_network.unwrap().id,
        base_config().subnet_id
    );
}

#[tokio::test]
async fn create_against_existing_environment_requires_import() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    reconciler.create(&base_config()).await.unwrap();
    let mutations = api.mutation_count();

    let err = reconciler.create(&base_config()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::RequiresImport { .. }));
    assert_eq!(api.mutation_count(), mutations);
}

#[tokio::test]
async fn scale_factor_outside_range_never_reaches_the_api() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    let mut config = base_config();
    config.front_end_scale_factor = 20;
    let err = reconciler.create(&config).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Validation(_)));
    assert_eq!(api.mutation_count(), 0);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    reconciler.create(&base_config()).await.unwrap();
    let id: HostingEnvironmentId = environment_id("acctest-rg", "acctest-ase").parse().unwrap();

    reconciler.delete(&id).await.unwrap();
    assert!(reconciler.read(&id).await.unwrap().is_none());
    reconciler.delete(&id).await.unwrap();
}

#[tokio::test]
async fn import_round_trips() {
    let api = FakeAzure::new();
    let reconciler = EnvironmentReconciler::new(&api);

    let mut config = base_config();
    config.internal_load_balancing_mode = LoadBalancingMode::WebPublishing;
    config
        .allowed_user_ip_cidrs
        .push("203.0.113.0/24".to_string());
    reconciler.create(&config).await.unwrap();

    let raw = environment_id("acctest-rg", "acctest-ase");
    let observed = reconciler.import(&raw).await.unwrap();
    assert_eq!(observed.id, raw);
    assert_eq!(
        observed.internal_load_balancing_mode,
        Some(LoadBalancingMode::WebPublishing)
    );
    assert_eq!(observed.allowed_user_ip_cidrs, vec!["203.0.113.0/24"]);
}
