// Archivo: service.rs
// Propósito: implementar `MembershipService`, la API de mutación de
// membresías. Es la única caller legítima del motor de propagación: valida
// y autoriza el cambio local, lo persiste y después dispara la propagación
// como efecto secundario fire-and-forget.
use crate::errors::{EngineError, Result};
use crate::propagation::{propagate_potential_votes, propagate_real_votes};
use chrono::Utc;
use log::warn;
use piramide_domain::{Campaign, Estado, Membership, Rol, UserRecord};
use piramide_store::{CampaignStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

/// Identidad del que origina una mutación. `admin` marca a los
/// administradores de plataforma, que pueden mutar cualquier campo.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
  pub user_id: Uuid,
  pub admin: bool,
}

impl Actor {
  pub fn usuario(user_id: Uuid) -> Self {
    Self { user_id, admin: false }
  }

  pub fn administrador(user_id: Uuid) -> Self {
    Self { user_id, admin: true }
  }
}

/// Cambios solicitados sobre una membresía. Los campos en `None` no se
/// tocan.
#[derive(Debug, Clone, Default)]
pub struct MembershipUpdate {
  /// Intención de voto autodeclarada (sólo el propio miembro).
  pub voto_promesa: Option<i64>,
  /// Votos esperados (sólo el superior directo con rol privilegiado);
  /// su delta dispara la propagación de votos potenciales.
  pub voto_esperado: Option<i64>,
  /// Permiso de reclutamiento (misma regla que `voto_esperado`).
  pub can_register_subordinates: Option<bool>,
}

/// Servicio de alto nivel que origina los cambios del árbol.
///
/// La autorización vive aquí, no en el motor: el motor asume que cada
/// llamada de propagación corresponde exactamente a un cambio lógico ya
/// validado y persistido.
pub struct MembershipService<S> where S: CampaignStore
{
  store: Arc<S>,
}

impl<S> MembershipService<S> where S: CampaignStore + 'static
{
  /// Crea el servicio inyectando el `CampaignStore`.
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// Crea la campaña con sus totales en cero y la membresía raíz del
  /// candidato (auto-referenciada). Si el usuario del candidato no existe
  /// todavía, se crea su documento. Devuelve el id de la campaña.
  pub fn create_campaign(&self,
                         nombre: &str,
                         candidato_id: Uuid,
                         nombre_candidato: &str,
                         metadata: serde_json::Value)
                         -> Result<Uuid> {
    let campaign = Campaign::new(nombre, candidato_id, metadata)?;
    let campaign_id = campaign.id();
    let raiz = Membership::raiz(campaign_id, candidato_id)?;

    match self.store.get_user(&candidato_id)? {
      Some(mut user) => {
        user.add_membership(raiz)?;
        self.store.update_user(&candidato_id, user.into_memberships(), Utc::now())?;
      }
      None => {
        let mut user = UserRecord::new(candidato_id, nombre_candidato, None)?;
        user.add_membership(raiz)?;
        self.store.create_user(user)?;
      }
    }

    self.store.create_campaign(campaign)?;
    Ok(campaign_id)
  }

  /// Registra un subordinado nuevo colgando de `owner_id`.
  ///
  /// Reglas: el actor debe ser el propio superior (o administrador); la
  /// membresía del superior debe estar activa y con permiso de
  /// reclutamiento; el rol no puede ser `Candidato`; el usuario destino no
  /// puede pertenecer ya a la campaña.
  pub fn register_subordinate(&self,
                              actor: &Actor,
                              campaign_id: &Uuid,
                              owner_id: Uuid,
                              user_id: Uuid,
                              nombre: &str,
                              rol: Rol)
                              -> Result<()> {
    if !actor.admin && actor.user_id != owner_id {
      return Err(EngineError::Unauthorized(format!("el actor {} no es el superior {}", actor.user_id, owner_id)));
    }

    let owner = self.store
                    .get_user(&owner_id)?
                    .ok_or(StoreError::NotFound(format!("usuario {}", owner_id)))?;
    let owner_membership = owner.membership_for(campaign_id)
                                .ok_or_else(|| EngineError::Validation(format!("el superior {} no pertenece a la campaña {}", owner_id, campaign_id)))?;
    if !owner_membership.esta_activo() {
      return Err(EngineError::Validation(format!("la membresía del superior {} está inactiva", owner_id)));
    }
    if !owner_membership.can_register_subordinates() {
      return Err(EngineError::Unauthorized(format!("el superior {} no puede registrar subordinados", owner_id)));
    }

    let membership = Membership::subordinada(*campaign_id, user_id, rol, owner_id)?;

    match self.store.get_user(&user_id)? {
      Some(mut user) => {
        user.add_membership(membership)?;
        self.store.update_user(&user_id, user.into_memberships(), Utc::now())?;
      }
      None => {
        let mut user = UserRecord::new(user_id, nombre, None)?;
        user.add_membership(membership)?;
        self.store.create_user(user)?;
      }
    }
    Ok(())
  }

  /// Aplica las ediciones pedidas sobre la membresía de `user_id` en
  /// `campaign_id` y devuelve los nombres de cable de los campos que
  /// realmente cambiaron.
  ///
  /// Autorización por campo:
  /// - `voto_promesa`: el propio miembro (o administrador).
  /// - `voto_esperado` y `can_register_subordinates`: el superior directo
  ///   registrado en `owner_by`, con rol privilegiado en la misma campaña
  ///   (o administrador).
  ///
  /// Si `voto_esperado` cambió, el delta `nuevo - anterior` se propaga como
  /// votos potenciales DESPUÉS de persistir el cambio local; un fallo de la
  /// propagación se registra y no revierte el cambio local.
  pub fn update_membership(&self,
                           actor: &Actor,
                           user_id: &Uuid,
                           campaign_id: &Uuid,
                           updates: MembershipUpdate)
                           -> Result<Vec<String>> {
    let user = self.store
                   .get_user(user_id)?
                   .ok_or(StoreError::NotFound(format!("usuario {}", user_id)))?;
    let actual = user.membership_for(campaign_id)
                     .ok_or_else(|| EngineError::Validation(format!("el usuario {} no pertenece a la campaña {}", user_id, campaign_id)))?;

    // Autorizar ANTES de tocar nada: un rechazo no debe dejar ni el cambio
    // local ni ninguna propagación.
    if updates.voto_promesa.is_some() && !(actor.admin || actor.user_id == *user_id) {
      return Err(EngineError::Unauthorized("votoPromesa sólo puede editarlo el propio miembro".to_string()));
    }
    if updates.voto_esperado.is_some() || updates.can_register_subordinates.is_some() {
      self.autorizar_como_superior(actor, actual, campaign_id)?;
    }

    let mut memberships = user.into_memberships();
    let membership = memberships.iter_mut()
                                .find(|m| m.campaign_id() == *campaign_id)
                                .ok_or_else(|| EngineError::Other("membresía desapareció del documento".to_string()))?;

    let mut cambiados: Vec<String> = Vec::new();
    let mut delta_potencial = 0i64;

    if let Some(valor) = updates.voto_promesa {
      if membership.voto_promesa() != valor {
        membership.set_voto_promesa(valor);
        cambiados.push("votoPromesa".to_string());
      }
    }
    if let Some(valor) = updates.voto_esperado {
      if membership.voto_esperado() != valor {
        delta_potencial = membership.set_voto_esperado(valor);
        cambiados.push("votoEsperado".to_string());
      }
    }
    if let Some(valor) = updates.can_register_subordinates {
      if membership.can_register_subordinates() != valor {
        membership.set_can_register_subordinates(valor);
        cambiados.push("canRegisterSubordinates".to_string());
      }
    }

    if cambiados.is_empty() {
      return Ok(cambiados);
    }

    self.store.update_user(user_id, memberships, Utc::now())?;

    if delta_potencial != 0 {
      // Fire-and-forget: el cambio local ya está persistido y no se
      // revierte si la propagación falla.
      if let Err(e) = propagate_potential_votes(self.store.as_ref(), campaign_id, user_id, delta_potencial) {
        warn!("propagación de votos potenciales fallida (campaña {}, usuario {}): {}", campaign_id, user_id, e);
      }
    }
    Ok(cambiados)
  }

  /// Registra `votes_count` votos directos reportados por el miembro y
  /// dispara la propagación de votos confirmados.
  ///
  /// Requiere `votes_count > 0` y una membresía activa. El incremento local
  /// de `direct_votes` se persiste primero; la propagación es
  /// fire-and-forget y su fallo no revierte el reporte local.
  pub fn submit_direct_vote(&self, user_id: &Uuid, campaign_id: &Uuid, votes_count: i64) -> Result<()> {
    if votes_count <= 0 {
      return Err(EngineError::Validation(format!("votesCount debe ser positivo, se recibió {}", votes_count)));
    }

    let user = self.store
                   .get_user(user_id)?
                   .ok_or(StoreError::NotFound(format!("usuario {}", user_id)))?;
    let actual = user.membership_for(campaign_id)
                     .ok_or_else(|| EngineError::Validation(format!("el usuario {} no pertenece a la campaña {}", user_id, campaign_id)))?;
    if !actual.esta_activo() {
      return Err(EngineError::Validation(format!("la membresía del usuario {} está inactiva", user_id)));
    }

    let mut memberships = user.into_memberships();
    if let Some(m) = memberships.iter_mut().find(|m| m.campaign_id() == *campaign_id) {
      m.add_direct_votes(votes_count);
    }
    self.store.update_user(user_id, memberships, Utc::now())?;

    if let Err(e) = propagate_real_votes(self.store.as_ref(), campaign_id, user_id, votes_count) {
      warn!("propagación de votos confirmados fallida (campaña {}, usuario {}): {}", campaign_id, user_id, e);
    }
    Ok(())
  }

  /// Cambia el estado de una membresía (los miembros nunca se borran:
  /// se marcan inactivos). Misma regla de autorización que las ediciones
  /// del superior.
  pub fn set_member_estado(&self, actor: &Actor, user_id: &Uuid, campaign_id: &Uuid, estado: Estado) -> Result<()> {
    let user = self.store
                   .get_user(user_id)?
                   .ok_or(StoreError::NotFound(format!("usuario {}", user_id)))?;
    let actual = user.membership_for(campaign_id)
                     .ok_or_else(|| EngineError::Validation(format!("el usuario {} no pertenece a la campaña {}", user_id, campaign_id)))?;
    self.autorizar_como_superior(actor, actual, campaign_id)?;

    let mut memberships = user.into_memberships();
    if let Some(m) = memberships.iter_mut().find(|m| m.campaign_id() == *campaign_id) {
      m.set_estado(estado);
    }
    self.store.update_user(user_id, memberships, Utc::now())?;
    Ok(())
  }

  /// Regla de "superior directo suficientemente privilegiado": el actor es
  /// administrador, o es exactamente el `owner_by` registrado del miembro y
  /// además tiene en la misma campaña una membresía con rol por encima de
  /// `votante`.
  fn autorizar_como_superior(&self, actor: &Actor, membership: &Membership, campaign_id: &Uuid) -> Result<()> {
    if actor.admin {
      return Ok(());
    }
    if membership.owner_by() != actor.user_id {
      return Err(EngineError::Unauthorized(format!("el actor {} no es el superior directo de {}",
                                                   actor.user_id,
                                                   membership.user_id())));
    }
    let actor_user = self.store
                         .get_user(&actor.user_id)?
                         .ok_or(StoreError::NotFound(format!("usuario {}", actor.user_id)))?;
    let actor_membership = actor_user.membership_for(campaign_id)
                                     .ok_or_else(|| EngineError::Unauthorized(format!("el actor {} no pertenece a la campaña {}", actor.user_id, campaign_id)))?;
    if !actor_membership.rol().es_privilegiado() {
      return Err(EngineError::Unauthorized(format!("el rol '{}' no puede editar subordinados", actor_membership.rol())));
    }
    Ok(())
  }
}
