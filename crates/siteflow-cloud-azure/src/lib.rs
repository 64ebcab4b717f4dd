//! siteflow Azure web-hosting implementation
//!
//! Reconcilers for App Services, Function Apps, App Service Environments,
//! deployment slots and Swift virtual-network connections, built on typed
//! client capability traits over the Azure management API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 orchestrator                      │
//! └─────────────────┬────────────────────────────────┘
//!                   │ desired configuration (siteflow-core)
//! ┌─────────────────▼────────────────────────────────┐
//! │             siteflow-cloud-azure                  │
//! │  ┌────────────────────────────────────────────┐  │
//! │  │ reconcilers: plan / create / read /        │  │
//! │  │ update / delete / import                   │  │
//! │  └───────┬──────────────────────┬─────────────┘  │
//! │  ┌───────▼───────┐     ┌────────▼────────┐       │
//! │  │ convert/diff  │     │ client traits   │       │
//! │  │ (model↔wire)  │     │ SitesApi, …     │       │
//! │  └───────────────┘     └─────────────────┘       │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod client;
mod convert;
mod diff;
pub mod observed;
pub mod wire;

pub mod app_service;
pub mod environment;
pub mod function_app;
pub mod slot;
pub mod swift;

// Re-exports
pub use app_service::AppServiceReconciler;
pub use client::{ClientResult, EnvironmentsApi, SitesApi, VnetApi};
pub use environment::EnvironmentReconciler;
pub use function_app::FunctionAppReconciler;
pub use observed::{
    ObservedEnvironment, ObservedFunctionApp, ObservedIdentity, ObservedSite, ObservedSlot,
    ObservedSwiftConnection, SiteCredentials,
};
pub use slot::SlotReconciler;
pub use swift::SwiftConnectionReconciler;
