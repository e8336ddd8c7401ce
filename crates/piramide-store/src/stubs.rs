// Archivo: stubs.rs
// Propósito: implementación en memoria para pruebas y wiring rápido.
//
// Incluye un store en memoria (`InMemoryCampaignStore`) que cumple el
// contrato `CampaignStore`. No es durable y se usa para demos o pruebas
// locales; las pruebas del motor de propagación se apoyan en él.
use crate::adapter::{CampaignField, CampaignStore, CampaignTx};
use crate::errors::{Result, StoreError};
use chrono::{DateTime, Utc};
use piramide_domain::{Campaign, Membership, UserRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Store en memoria; estado protegido por mutex para cumplir `Send + Sync`.
pub struct InMemoryCampaignStore {
    /// Documentos de usuario indexados por id.
    users: Mutex<HashMap<Uuid, UserRecord>>,
    /// Agregados de campaña indexados por id.
    campaigns: Mutex<HashMap<Uuid, Campaign>>,
}

impl InMemoryCampaignStore {
    /// Crea una nueva instancia del store en memoria.
    pub fn new() -> Self {
        Self { users: Mutex::new(HashMap::new()),
               campaigns: Mutex::new(HashMap::new()) }
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `StoreError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> std::result::Result<MutexGuard<'a, T>, StoreError> {
        m.lock().map_err(|e| StoreError::Storage(format!("mutex poisoned: {:?}", e)))
    }
}

impl Default for InMemoryCampaignStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Vista transaccional sobre el mapa de campañas; el guard del mutex vive
/// en el caller durante toda la transacción, por lo que la operación es
/// atómica frente a otros hilos.
struct InMemoryTx<'a> {
    campaigns: &'a mut HashMap<Uuid, Campaign>,
}

impl CampaignTx for InMemoryTx<'_> {
    fn get_campaign(&mut self, campaign_id: &Uuid) -> Result<Option<Campaign>> {
        Ok(self.campaigns.get(campaign_id).cloned())
    }

    fn put_campaign(&mut self, campaign: &Campaign) -> Result<()> {
        self.campaigns.insert(campaign.id(), campaign.clone());
        Ok(())
    }
}

impl CampaignStore for InMemoryCampaignStore {
    /// Obtiene el documento de usuario por id.
    fn get_user(&self, user_id: &Uuid) -> Result<Option<UserRecord>> {
        let users = self.lock(&self.users)?;
        Ok(users.get(user_id).cloned())
    }

    /// Reemplaza la lista de membresías del usuario (documento entero).
    /// Retorna `NotFound` si el usuario no existe.
    fn update_user(&self, user_id: &Uuid, memberships: Vec<Membership>, timestamp: DateTime<Utc>) -> Result<()> {
        let mut users = self.lock(&self.users)?;
        let user = users.get_mut(user_id)
                        .ok_or(StoreError::NotFound(format!("usuario {}", user_id)))?;
        user.replace_memberships(memberships, timestamp);
        Ok(())
    }

    /// Inserta un usuario nuevo; rechaza ids duplicados.
    fn create_user(&self, user: UserRecord) -> Result<()> {
        let mut users = self.lock(&self.users)?;
        if users.contains_key(&user.id()) {
            return Err(StoreError::Conflict(format!("usuario {} ya existe", user.id())));
        }
        users.insert(user.id(), user);
        Ok(())
    }

    /// Obtiene el agregado de campaña por id.
    fn get_campaign(&self, campaign_id: &Uuid) -> Result<Option<Campaign>> {
        let campaigns = self.lock(&self.campaigns)?;
        Ok(campaigns.get(campaign_id).cloned())
    }

    /// Inserta una campaña nueva; rechaza ids duplicados.
    fn create_campaign(&self, campaign: Campaign) -> Result<()> {
        let mut campaigns = self.lock(&self.campaigns)?;
        if campaigns.contains_key(&campaign.id()) {
            return Err(StoreError::Conflict(format!("campaña {} ya existe", campaign.id())));
        }
        campaigns.insert(campaign.id(), campaign);
        Ok(())
    }

    /// Lista todas las campañas registradas.
    fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let campaigns = self.lock(&self.campaigns)?;
        Ok(campaigns.values().cloned().collect())
    }

    /// Incremento plano del campo pedido. En memoria el mutex lo vuelve
    /// atómico de facto, pero el contrato no lo garantiza.
    fn increment_campaign_field(&self, campaign_id: &Uuid, field: CampaignField, delta: i64) -> Result<()> {
        let mut campaigns = self.lock(&self.campaigns)?;
        let campaign = campaigns.get_mut(campaign_id)
                                .ok_or(StoreError::NotFound(format!("campaña {}", campaign_id)))?;
        match field {
            CampaignField::TotalConfirmedVotes => campaign.add_confirmed(delta),
            CampaignField::TotalPotentialVotes => campaign.add_potential(delta),
        }
        Ok(())
    }

    /// Ejecuta `op` manteniendo el guard del mutex durante toda la
    /// operación; si `op` falla se restaura el estado previo.
    fn run_transaction(&self, op: &mut dyn FnMut(&mut dyn CampaignTx) -> Result<()>) -> Result<()> {
        let mut campaigns = self.lock(&self.campaigns)?;
        let backup = campaigns.clone();
        let mut tx = InMemoryTx { campaigns: &mut campaigns };
        match op(&mut tx) {
            Ok(()) => Ok(()),
            Err(e) => {
                *campaigns = backup;
                Err(e)
            }
        }
    }
}
