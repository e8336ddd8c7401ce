// rol.rs
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Posición de un miembro dentro de la pirámide de la campaña.
/// `Candidato` es siempre la raíz del árbol de su campaña.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
  Candidato,
  Manager,
  Anillo,
  Votante,
}

/// Jerarquía numérica usada por las reglas de autorización: a mayor valor,
/// mayor privilegio. `Votante` no puede administrar subordinados.
static JERARQUIA: Lazy<HashMap<Rol, u8>> = Lazy::new(|| {
  HashMap::from([(Rol::Candidato, 3), (Rol::Manager, 2), (Rol::Anillo, 1), (Rol::Votante, 0)])
});

impl Rol {
  pub fn rango(&self) -> u8 {
    *JERARQUIA.get(self).unwrap_or(&0)
  }

  /// Un rol es privilegiado si está por encima de `Votante`; sólo los roles
  /// privilegiados pueden editar subordinados o registrar nuevos miembros.
  pub fn es_privilegiado(&self) -> bool {
    self.rango() > Rol::Votante.rango()
  }
}

impl fmt::Display for Rol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Rol::Candidato => "candidato",
      Rol::Manager => "manager",
      Rol::Anillo => "anillo",
      Rol::Votante => "votante",
    };
    write!(f, "{}", s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn jerarquia_ordena_roles() {
    assert!(Rol::Candidato.rango() > Rol::Manager.rango());
    assert!(Rol::Manager.rango() > Rol::Anillo.rango());
    assert!(Rol::Anillo.rango() > Rol::Votante.rango());
  }

  #[test]
  fn votante_no_es_privilegiado() {
    assert!(!Rol::Votante.es_privilegiado());
    assert!(Rol::Anillo.es_privilegiado());
  }

  #[test]
  fn serializa_en_minusculas() {
    assert_eq!(serde_json::to_string(&Rol::Candidato).unwrap(), "\"candidato\"");
    let r: Rol = serde_json::from_str("\"anillo\"").unwrap();
    assert_eq!(r, Rol::Anillo);
  }
}
