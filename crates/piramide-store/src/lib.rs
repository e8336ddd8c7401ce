//! Crate `piramide-store` — contrato de persistencia del motor de pirámide
//!
//! Este crate define el trait `CampaignStore` que consume el motor de
//! propagación (leer/parchear documentos de usuario, leer campañas,
//! incremento plano de un campo del agregado y transacciones para el total
//! de votos confirmados), el trait auxiliar `CampaignTx` y una
//! implementación en memoria útil para pruebas (`InMemoryCampaignStore`).
//!
//! Diseño resumido:
//! - Documento entero: `update_user` reescribe la lista completa de
//!   membresías del usuario; no hay chequeo optimista y la última escritura
//!   gana (carrera de actualización perdida documentada).
//! - Transacción sólo para votos confirmados: `run_transaction` es la única
//!   operación atómica del contrato; `increment_campaign_field` es un
//!   leer-incrementar-escribir plano.
//!
//! Ejemplo rápido:
//! ```rust
//! use piramide_store::InMemoryCampaignStore;
//! let store = InMemoryCampaignStore::new();
//! ```
pub mod adapter;
pub mod errors;
pub mod stubs;

pub use adapter::*;
pub use errors::*;
pub use stubs::*;
