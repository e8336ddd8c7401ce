// campaign.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agregado de campaña: totales globales mantenidos como lectura barata,
/// independientes de los contadores de cualquier miembro individual.
///
/// `total_confirmed_votes` se actualiza dentro de una transacción (es la
/// cifra auditada); `total_potential_votes` se actualiza con un incremento
/// plano y puede derivar si el recorrido aborta antes de la raíz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
  id: Uuid,
  nombre: String,
  candidato_id: Uuid,
  total_confirmed_votes: i64,
  total_potential_votes: i64,
  metadata: serde_json::Value,
  created_at: DateTime<Utc>,
}

impl Campaign {
  pub fn new(nombre: &str, candidato_id: Uuid, metadata: serde_json::Value) -> Result<Self, DomainError> {
    if nombre.trim().is_empty() {
      return Err(DomainError::ValidationError("El nombre de la campaña no puede estar vacío".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              nombre: nombre.to_string(),
              candidato_id,
              total_confirmed_votes: 0,
              total_potential_votes: 0,
              metadata,
              created_at: Utc::now() })
  }

  /// Reconstruye un agregado desde la persistencia, con totales ya
  /// acumulados.
  #[allow(clippy::too_many_arguments)]
  pub fn from_parts(id: Uuid,
                    nombre: &str,
                    candidato_id: Uuid,
                    total_confirmed_votes: i64,
                    total_potential_votes: i64,
                    metadata: serde_json::Value,
                    created_at: DateTime<Utc>)
                    -> Result<Self, DomainError> {
    if nombre.trim().is_empty() {
      return Err(DomainError::ValidationError("El nombre de la campaña no puede estar vacío".to_string()));
    }
    Ok(Self { id, nombre: nombre.to_string(), candidato_id, total_confirmed_votes, total_potential_votes, metadata, created_at })
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn nombre(&self) -> &str {
    &self.nombre
  }

  pub fn candidato_id(&self) -> Uuid {
    self.candidato_id
  }

  pub fn total_confirmed_votes(&self) -> i64 {
    self.total_confirmed_votes
  }

  pub fn total_potential_votes(&self) -> i64 {
    self.total_potential_votes
  }

  pub fn metadata(&self) -> &serde_json::Value {
    &self.metadata
  }

  pub fn created_at(&self) -> DateTime<Utc> {
    self.created_at
  }

  /// Los deltas son simétricos: correcciones negativas restan sin caso
  /// especial.
  pub fn add_confirmed(&mut self, delta: i64) {
    self.total_confirmed_votes += delta;
  }

  pub fn add_potential(&mut self, delta: i64) {
    self.total_potential_votes += delta;
  }
}
