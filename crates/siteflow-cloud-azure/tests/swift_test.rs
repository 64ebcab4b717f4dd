mod common;

use common::{FakeAzure, site_id};
use siteflow_cloud::{ActionType, Reconcile, ReconcileError};
use siteflow_cloud_azure::{AppServiceReconciler, SwiftConnectionReconciler};
use siteflow_core::SwiftConnectionId;
use siteflow_core::model::{AppServiceConfig, SwiftConnectionConfig};

fn subnet(name: &str) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/acctest-rg/providers/Microsoft.Network/virtualNetworks/vnet1/subnets/{name}",
        common::TEST_SUBSCRIPTION
    )
}

fn parent_config() -> AppServiceConfig {
    AppServiceConfig {
        name: "acctest-app".to_string(),
        resource_group: "acctest-rg".to_string(),
        location: "westeurope".to_string(),
        app_service_plan_id: common::plan_id("acctest-rg", "acctest-plan"),
        enabled: true,
        ..Default::default()
    }
}

fn connection_config() -> SwiftConnectionConfig {
    SwiftConnectionConfig {
        app_service_id: site_id("acctest-rg", "acctest-app"),
        slot_name: None,
        subnet_id: subnet("apps"),
    }
}

#[tokio::test]
async fn attach_is_idempotent() {
    let api = FakeAzure::new();
    AppServiceReconciler::new(&api)
        .create(&parent_config())
        .await
        .unwrap();
    let reconciler = SwiftConnectionReconciler::new(&api);

    let observed = reconciler.create(&connection_config()).await.unwrap();
    assert_eq!(observed.subnet_id, subnet("apps"));
    let mutations = api.mutation_count();

    // attaching to the same subnet again is a no-op, not an error
    let plan = reconciler.plan(&connection_config()).await.unwrap();
    assert_eq!(plan.actions[0].action_type, ActionType::NoOp);

    let id: SwiftConnectionId = observed.id.parse().unwrap();
    reconciler.update(&id, &connection_config()).await.unwrap();
    assert_eq!(api.mutation_count(), mutations);
}

#[tokio::test]
async fn changing_subnet_is_an_update() {
    let api = FakeAzure::new();
    AppServiceReconciler::new(&api)
        .create(&parent_config())
        .await
        .unwrap();
    let reconciler = SwiftConnectionReconciler::new(&api);

    let observed = reconciler.create(&connection_config()).await.unwrap();
    let id: SwiftConnectionId = observed.id.parse().unwrap();

    let mut moved = connection_config();
    moved.subnet_id = subnet("backend");
    let plan = reconciler.plan(&moved).await.unwrap();
    let action = &plan.actions[0];
    assert_eq!(action.action_type, ActionType::Update);
    assert_eq!(action.changed_fields, vec!["subnet_id"]);

    let observed = reconciler.update(&id, &moved).await.unwrap();
    assert_eq!(observed.subnet_id, subnet("backend"));
}

#[tokio::test]
async fn attaching_to_a_missing_site_fails_fast() {
    let api = FakeAzure::new();
    let reconciler = SwiftConnectionReconciler::new(&api);

    let err = reconciler.create(&connection_config()).await.unwrap_err();
    assert!(matches!(err, ReconcileError::ParentNotFound { .. }));
    assert_eq!(api.mutation_count(), 0);
}

#[tokio::test]
async fn detach_survives_a_cascade_deleted_parent() {
    let api = FakeAzure::new();
    let parent_reconciler = AppServiceReconciler::new(&api);
    parent_reconciler.create(&parent_config()).await.unwrap();
    let reconciler = SwiftConnectionReconciler::new(&api);
    let observed = reconciler.create(&connection_config()).await.unwrap();
    let id: SwiftConnectionId = observed.id.parse().unwrap();

    // deleting the site takes the attachment with it
    let parent_id = site_id("acctest-rg", "acctest-app").parse().unwrap();
    parent_reconciler.delete(&parent_id).await.unwrap();
    assert!(reconciler.read(&id).await.unwrap().is_none());

    // detach after the cascade is still success
    reconciler.delete(&id).await.unwrap();
}

#[tokio::test]
async fn detaching_a_never_attached_connection_succeeds() {
    let api = FakeAzure::new();
    AppServiceReconciler::new(&api)
        .create(&parent_config())
        .await
        .unwrap();
    let reconciler = SwiftConnectionReconciler::new(&api);

    let id = SwiftConnectionId::for_site(
        site_id("acctest-rg", "acctest-app").parse().unwrap(),
    );
    reconciler.delete(&id).await.unwrap();
    assert_eq!(api.mutation_count(), 1); // only the parent create
}

#[tokio::test]
async fn slot_scoped_connections_are_independent() {
    let api = FakeAzure::new();
    AppServiceReconciler::new(&api)
        .create(&parent_config())
        .await
        .unwrap();

    // give the parent a staging slot to attach against
    use siteflow_cloud_azure::SlotReconciler;
    use siteflow_core::model::SlotConfig;
    SlotReconciler::new(&api)
        .create(&SlotConfig {
            name: "staging".to_string(),
            resource_group: "acctest-rg".to_string(),
            app_service_name: "acctest-app".to_string(),
            location: "westeurope".to_string(),
            app_service_plan_id: common::plan_id("acctest-rg", "acctest-plan"),
            enabled: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let reconciler = SwiftConnectionReconciler::new(&api);
    reconciler.create(&connection_config()).await.unwrap();

    let mut slot_connection = connection_config();
    slot_connection.slot_name = Some("staging".to_string());
    slot_connection.subnet_id = subnet("staging-apps");
    let observed = reconciler.create(&slot_connection).await.unwrap();
    assert!(observed.id.contains("/slots/staging/"));
    assert_eq!(observed.subnet_id, subnet("staging-apps"));

    // production attachment is untouched
    let production_id = SwiftConnectionId::for_site(
        site_id("acctest-rg", "acctest-app").parse().unwrap(),
    );
    let production = reconciler.read(&production_id).await.unwrap().unwrap();
    assert_eq!(production.subnet_id, subnet("apps"));
}

#[tokio::test]
async fn import_round_trips_site_and_slot_ids() {
    let api = FakeAzure::new();
    AppServiceReconciler::new(&api)
        .create(&parent_config())
        .await
        .unwrap();
    let reconciler = SwiftConnectionReconciler::new(&api);
    let observed = reconciler.create(&connection_config()).await.unwrap();

    let imported = reconciler.import(&observed.id).await.unwrap();
    assert_eq!(imported, observed);

    let parsed: SwiftConnectionId = observed.id.parse().unwrap();
    assert_eq!(parsed.to_string(), observed.id);
}
