// Archivo: errors.rs
// Propósito: definir los errores de la capa de almacenamiento y el alias
// Result<T> usado por las APIs del crate. Los comentarios y variantes están
// en español.
use thiserror::Error;
/// Errores comunes del adaptador de almacenamiento.
///
/// - `NotFound`: entidad no encontrada.
/// - `Conflict`: conflicto de concurrencia dentro de una transacción.
/// - `Storage`: error al acceder al almacenamiento externo.
/// - `Other`: cualquier otro error.
#[derive(Error, Debug)]
pub enum StoreError {
  /// Entidad no encontrada (por ejemplo, usuario o campaña).
  #[error("No encontrado: {0}")]
  NotFound(String),
  /// Conflicto al aplicar una transacción.
  #[error("Conflicto: {0}")]
  Conflict(String),
  /// Error genérico de almacenamiento (BD, red, etc.).
  #[error("Error de almacenamiento: {0}")]
  Storage(String),
  /// Otro tipo de error.
  #[error("Otro: {0}")]
  Other(String),
}
/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, StoreError>;
