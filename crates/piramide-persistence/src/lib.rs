//! Implementación Diesel del contrato `CampaignStore`.
//! Este archivo expone el módulo `schema` y reexporta el store Diesel que
//! implementa el adaptador de almacenamiento del motor. La implementación
//! detallada está en `campaign_persistence.rs`.

mod campaign_persistence;
pub mod schema;

#[cfg(not(feature = "pg"))]
pub use campaign_persistence::new_sqlite_for_test;
pub use campaign_persistence::{new_from_env, DieselCampaignStore, MIGRATIONS};
