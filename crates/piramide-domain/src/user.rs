// user.rs
use crate::DomainError;
use crate::Membership;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Documento de usuario tal como lo persiste la plataforma: todas sus
/// membresías viven embebidas como una lista dentro del propio registro.
///
/// Este diseño (lista embebida como libro mayor) obliga a reescribir la
/// lista completa en cada toque de un ancestro durante la propagación; es
/// la causa raíz de la carrera de actualización perdida documentada en el
/// motor, y se conserva tal cual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
  id: Uuid,
  nombre: String,
  email: Option<String>,
  memberships: Vec<Membership>,
  updated_at: DateTime<Utc>,
}

impl UserRecord {
  pub fn new(id: Uuid, nombre: &str, email: Option<String>) -> Result<Self, DomainError> {
    if nombre.trim().is_empty() {
      return Err(DomainError::ValidationError("El nombre del usuario no puede estar vacío".to_string()));
    }
    Ok(Self { id, nombre: nombre.to_string(), email, memberships: Vec::new(), updated_at: Utc::now() })
  }

  /// Reconstruye un documento desde la persistencia, con membresías ya
  /// acumuladas.
  pub fn from_parts(id: Uuid,
                    nombre: &str,
                    email: Option<String>,
                    memberships: Vec<Membership>,
                    updated_at: DateTime<Utc>)
                    -> Result<Self, DomainError> {
    if nombre.trim().is_empty() {
      return Err(DomainError::ValidationError("El nombre del usuario no puede estar vacío".to_string()));
    }
    if memberships.iter().any(|m| m.user_id() != id) {
      return Err(DomainError::ValidationError(format!("El documento del usuario {} contiene membresías ajenas", id)));
    }
    Ok(Self { id, nombre: nombre.to_string(), email, memberships, updated_at })
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn nombre(&self) -> &str {
    &self.nombre
  }

  pub fn email(&self) -> Option<&str> {
    self.email.as_deref()
  }

  pub fn memberships(&self) -> &[Membership] {
    &self.memberships
  }

  pub fn updated_at(&self) -> DateTime<Utc> {
    self.updated_at
  }

  /// Membresía de este usuario en la campaña dada, si existe.
  pub fn membership_for(&self, campaign_id: &Uuid) -> Option<&Membership> {
    self.memberships.iter().find(|m| m.campaign_id() == *campaign_id)
  }

  pub fn membership_for_mut(&mut self, campaign_id: &Uuid) -> Option<&mut Membership> {
    self.memberships.iter_mut().find(|m| m.campaign_id() == *campaign_id)
  }

  /// Añade una membresía. A lo sumo una por campaña y por usuario.
  pub fn add_membership(&mut self, membership: Membership) -> Result<(), DomainError> {
    if membership.user_id() != self.id {
      return Err(DomainError::ValidationError("La membresía pertenece a otro usuario".to_string()));
    }
    if self.membership_for(&membership.campaign_id()).is_some() {
      return Err(DomainError::ValidationError(format!("El usuario {} ya pertenece a la campaña {}",
                                                      self.id,
                                                      membership.campaign_id())));
    }
    self.memberships.push(membership);
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Reemplaza la lista completa de membresías (escritura de documento
  /// entero, como hace la propagación).
  pub fn replace_memberships(&mut self, memberships: Vec<Membership>, timestamp: DateTime<Utc>) {
    self.memberships = memberships;
    self.updated_at = timestamp;
  }

  pub fn into_memberships(self) -> Vec<Membership> {
    self.memberships
  }
}
