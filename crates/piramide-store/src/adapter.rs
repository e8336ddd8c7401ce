// Archivo: adapter.rs
// Propósito: definir el trait `CampaignStore` (y el trait auxiliar
// `CampaignTx` para operaciones transaccionales). Describe el contrato que
// deben implementar las persistencias (Diesel, in-memory, etc.) y que
// consume el motor de propagación.
use crate::errors::Result;
use chrono::{DateTime, Utc};
use piramide_domain::{Campaign, Membership, UserRecord};
use uuid::Uuid;

/// Campos incrementables del agregado de campaña, con su nombre de cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignField {
    TotalConfirmedVotes,
    TotalPotentialVotes,
}

impl CampaignField {
    pub fn wire_name(&self) -> &'static str {
        match self {
            CampaignField::TotalConfirmedVotes => "totalConfirmedVotes",
            CampaignField::TotalPotentialVotes => "totalPotentialVotes",
        }
    }
}

/// Vista transaccional del agregado de campaña. Sólo se usa dentro de
/// `CampaignStore::run_transaction`: lo que se escriba con `put_campaign`
/// se confirma o revierte como unidad.
pub trait CampaignTx {
    /// Lee el agregado de campaña dentro de la transacción.
    fn get_campaign(&mut self, campaign_id: &Uuid) -> Result<Option<Campaign>>;

    /// Escribe el agregado de campaña dentro de la transacción.
    fn put_campaign(&mut self, campaign: &Campaign) -> Result<()>;
}

/// Contrato del adaptador de almacenamiento que consume el motor.
///
/// El motor sólo necesita leer/parchear documentos de usuario (la lista de
/// membresías embebida completa), leer campañas, incrementar un campo del
/// agregado sin transacción y ejecutar una transacción para el total de
/// votos confirmados. Las operaciones de alta (usuarios, campañas, listado)
/// las usa la capa de mutación de membresías.
pub trait CampaignStore: Send + Sync {
    /// Obtiene el documento de usuario por id, si existe.
    fn get_user(&self, user_id: &Uuid) -> Result<Option<UserRecord>>;

    /// Parchea la lista completa de membresías del usuario (escritura de
    /// documento entero, sin chequeo de concurrencia optimista: la última
    /// escritura gana).
    fn update_user(&self, user_id: &Uuid, memberships: Vec<Membership>, timestamp: DateTime<Utc>) -> Result<()>;

    /// Inserta un documento de usuario nuevo. Error si el id ya existe.
    fn create_user(&self, user: UserRecord) -> Result<()>;

    /// Obtiene el agregado de campaña por id, si existe.
    fn get_campaign(&self, campaign_id: &Uuid) -> Result<Option<Campaign>>;

    /// Inserta una campaña nueva. Error si el id ya existe.
    fn create_campaign(&self, campaign: Campaign) -> Result<()>;

    /// Lista todas las campañas (útil para el CLI y pruebas).
    fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    /// Incremento plano (leer-incrementar-escribir, NO transaccional) de un
    /// campo del agregado. Es deliberadamente susceptible a carreras: sólo
    /// se usa para el total de votos potenciales.
    fn increment_campaign_field(&self, campaign_id: &Uuid, field: CampaignField, delta: i64) -> Result<()>;

    /// Ejecuta `op` de forma atómica. Si `op` devuelve error, ninguna
    /// escritura hecha a través del `CampaignTx` debe quedar visible.
    fn run_transaction(&self, op: &mut dyn FnMut(&mut dyn CampaignTx) -> Result<()>) -> Result<()>;
}
