use thiserror::Error;

// Errores comunes del motor de propagación y de la API de mutación de
// membresías.
//
// Este enum centraliza los errores que pueden ocurrir al originar un
// cambio en el árbol: errores del adaptador de almacenamiento
// (`StoreError`), errores del dominio (`DomainError`), validaciones,
// autorización y errores de serializacion.
#[derive(Error, Debug)]
pub enum EngineError {
  /// Errores originados por la capa de almacenamiento.
  #[error("Error de almacenamiento: {0}")]
  Store(#[from] piramide_store::StoreError),

  /// Errores originados por el modelo de dominio.
  #[error("Error de dominio: {0}")]
  Domain(#[from] piramide_domain::DomainError),

  /// Errores de validacion local de la API de mutación (por ejemplo
  /// cantidades de votos no positivas).
  #[error("Error de validación: {0}")]
  Validation(String),

  /// El actor no tiene permiso para la mutación pedida.
  #[error("No autorizado: {0}")]
  Unauthorized(String),

  /// Errores de serializacion/deserializacion JSON.
  #[error("Error de serialización: {0}")]
  Serialization(#[from] serde_json::Error),

  /// Error generico: captura otros tipos de errores no tipados.
  #[error("Otro error: {0}")]
  Other(String),
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, EngineError>;
