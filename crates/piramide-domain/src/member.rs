// member.rs
use crate::DomainError;
use crate::Rol;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Estado de la membresía. Los miembros nunca se borran: se marcan
/// `Inactivo` y conservan su historial de contadores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
  Activo,
  Inactivo,
}

/// Membresía de un usuario dentro de una campaña concreta: rol, referencia
/// al superior (`owner_by`) y los contadores de votos.
///
/// Contadores:
/// - `voto_promesa`: intención declarada por el propio miembro (no se
///   propaga).
/// - `voto_esperado`: votos esperados atribuidos al esfuerzo del miembro;
///   sus ediciones disparan la propagación de votos potenciales.
/// - `direct_votes`: votos confirmados reportados personalmente.
/// - `pyramid_votes`: votos confirmados acumulados desde todo el subárbol.
/// - `total_potential_votes`: votos potenciales acumulados desde el subárbol
///   vía deltas de `voto_esperado`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
  campaign_id: Uuid,
  user_id: Uuid,
  #[serde(rename = "role")]
  rol: Rol,
  owner_by: Uuid,
  #[serde(rename = "status")]
  estado: Estado,
  voto_promesa: i64,
  voto_esperado: i64,
  direct_votes: i64,
  pyramid_votes: i64,
  total_potential_votes: i64,
  can_register_subordinates: bool,
}

impl Membership {
  fn new(campaign_id: Uuid, user_id: Uuid, rol: Rol, owner_by: Uuid) -> Result<Self, DomainError> {
    // Regla de raíz: el candidato se posee a sí mismo y nadie más puede
    // hacerlo. Un árbol que viole esto rompe la terminación del recorrido.
    if rol == Rol::Candidato && owner_by != user_id {
      return Err(DomainError::ValidationError("El candidato debe ser su propio superior (owner_by == user_id)".to_string()));
    }
    if rol != Rol::Candidato && owner_by == user_id {
      return Err(DomainError::ValidationError(format!("Un miembro con rol '{}' no puede ser su propio superior", rol)));
    }
    Ok(Self { campaign_id,
              user_id,
              rol,
              owner_by,
              estado: Estado::Activo,
              voto_promesa: 0,
              voto_esperado: 0,
              direct_votes: 0,
              pyramid_votes: 0,
              total_potential_votes: 0,
              can_register_subordinates: rol.es_privilegiado() })
  }

  /// Crea la membresía raíz de una campaña: candidato auto-referenciado.
  pub fn raiz(campaign_id: Uuid, candidato_id: Uuid) -> Result<Self, DomainError> {
    Self::new(campaign_id, candidato_id, Rol::Candidato, candidato_id)
  }

  /// Crea una membresía subordinada colgando de `owner_by`.
  pub fn subordinada(campaign_id: Uuid, user_id: Uuid, rol: Rol, owner_by: Uuid) -> Result<Self, DomainError> {
    if rol == Rol::Candidato {
      return Err(DomainError::ValidationError("No se puede registrar un subordinado con rol 'candidato'".to_string()));
    }
    Self::new(campaign_id, user_id, rol, owner_by)
  }

  pub fn campaign_id(&self) -> Uuid {
    self.campaign_id
  }

  pub fn user_id(&self) -> Uuid {
    self.user_id
  }

  pub fn rol(&self) -> Rol {
    self.rol
  }

  pub fn owner_by(&self) -> Uuid {
    self.owner_by
  }

  pub fn estado(&self) -> Estado {
    self.estado
  }

  pub fn esta_activo(&self) -> bool {
    self.estado == Estado::Activo
  }

  pub fn voto_promesa(&self) -> i64 {
    self.voto_promesa
  }

  pub fn voto_esperado(&self) -> i64 {
    self.voto_esperado
  }

  pub fn direct_votes(&self) -> i64 {
    self.direct_votes
  }

  pub fn pyramid_votes(&self) -> i64 {
    self.pyramid_votes
  }

  pub fn total_potential_votes(&self) -> i64 {
    self.total_potential_votes
  }

  pub fn can_register_subordinates(&self) -> bool {
    self.can_register_subordinates
  }

  /// Regla de detección de raíz usada por el recorrido de ancestros:
  /// `rol == Candidato && owner_by == user_id`. Cualquier otro nodo
  /// auto-referenciado es un bug de integridad de datos, no un caso a
  /// manejar aquí.
  pub fn es_raiz(&self) -> bool {
    self.rol == Rol::Candidato && self.owner_by == self.user_id
  }

  pub fn set_estado(&mut self, estado: Estado) {
    self.estado = estado;
  }

  pub fn set_voto_promesa(&mut self, valor: i64) {
    self.voto_promesa = valor;
  }

  /// Fija el nuevo `voto_esperado` y devuelve el delta contra el valor
  /// anterior; ese delta es lo que debe propagarse hacia los ancestros.
  pub fn set_voto_esperado(&mut self, valor: i64) -> i64 {
    let delta = valor - self.voto_esperado;
    self.voto_esperado = valor;
    delta
  }

  pub fn set_can_register_subordinates(&mut self, valor: bool) {
    self.can_register_subordinates = valor;
  }

  pub fn add_direct_votes(&mut self, delta: i64) {
    self.direct_votes += delta;
  }

  pub fn add_pyramid_votes(&mut self, delta: i64) {
    self.pyramid_votes += delta;
  }

  pub fn add_total_potential_votes(&mut self, delta: i64) {
    self.total_potential_votes += delta;
  }
}

impl fmt::Display for Membership {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Membership(campaña: {}, usuario: {}, rol: {}, superior: {})",
           self.campaign_id, self.user_id, self.rol, self.owner_by)
  }
}
