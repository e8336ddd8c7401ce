//! Crate `piramide-engine` — motor de agregación de la pirámide de campaña
//!
//! Dos piezas:
//! - El motor de propagación (`propagate_potential_votes`,
//!   `propagate_real_votes`): recorre la cadena de ancestros desde el
//!   miembro que cambió hasta la raíz (candidato auto-referenciado),
//!   actualizando un contador por ancestro, y después el agregado de la
//!   campaña (transaccional para votos confirmados, incremento plano para
//!   potenciales).
//! - La API de mutación (`MembershipService`): las operaciones que originan
//!   cambios (ediciones de promesa/voto esperado, reporte de votos
//!   directos, altas de membresías) y únicas callers legítimas del motor.
//!
//! Semántica de fallos: la propagación es best-effort; un ancestro ausente
//! o un error de almacenamiento a mitad de camino truncan el recorrido con
//! un `warn`, nunca revierten la mutación local ya persistida. No hay clave
//! de idempotencia: repetir una llamada duplica su efecto.
pub mod errors;
pub mod propagation;
pub mod service;

pub use errors::*;
pub use propagation::*;
pub use service::*;
