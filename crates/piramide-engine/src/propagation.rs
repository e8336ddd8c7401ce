use crate::errors::Result;
use log::warn;
use piramide_store::{CampaignField, CampaignStore, StoreError};
use uuid::Uuid;

/// Contador por-ancestro que acumula un recorrido de propagación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contador {
  /// `total_potential_votes`: acumulado de deltas de `voto_esperado`.
  Potencial,
  /// `pyramid_votes`: acumulado de votos confirmados del subárbol.
  Piramide,
}

impl Contador {
  fn nombre(&self) -> &'static str {
    match self {
      Contador::Potencial => "totalPotentialVotes",
      Contador::Piramide => "pyramidVotes",
    }
  }
}

/// Sube por la cadena de ancestros desde `origin_user_id` hasta la raíz de
/// la campaña, sumando `delta` al contador indicado en cada nodo tocado.
///
/// Cada paso es un leer-modificar-escribir del documento de usuario entero
/// (sin lock ni chequeo optimista): dos propagaciones concurrentes sobre el
/// mismo ancestro pueden perder una actualización. El estado del miembro no
/// se consulta: un ancestro `inactivo` acumula igual.
///
/// Terminación: `rol == candidato && owner_by == user_id`. Un usuario o una
/// membresía ausentes a mitad de camino, o un error de almacenamiento, se
/// registran con `warn` y truncan el recorrido sin devolver error al
/// caller. Devuelve `true` sólo si se alcanzó la raíz.
fn subir_cadena<S>(store: &S, campaign_id: &Uuid, origin_user_id: &Uuid, delta: i64, contador: Contador) -> bool
  where S: CampaignStore + ?Sized
{
  let mut current = *origin_user_id;
  loop {
    let user = match store.get_user(&current) {
      Ok(Some(u)) => u,
      Ok(None) => {
        warn!("propagación {} truncada: usuario {} no existe (campaña {})",
              contador.nombre(), current, campaign_id);
        return false;
      }
      Err(e) => {
        warn!("propagación {} truncada: error leyendo usuario {}: {}", contador.nombre(), current, e);
        return false;
      }
    };

    let timestamp = chrono::Utc::now();
    let mut memberships = user.into_memberships();
    let membership = match memberships.iter_mut().find(|m| m.campaign_id() == *campaign_id) {
      Some(m) => m,
      None => {
        warn!("propagación {} truncada: usuario {} sin membresía en campaña {}",
              contador.nombre(), current, campaign_id);
        return false;
      }
    };

    match contador {
      Contador::Potencial => membership.add_total_potential_votes(delta),
      Contador::Piramide => membership.add_pyramid_votes(delta),
    }
    let raiz = membership.es_raiz();
    let siguiente = membership.owner_by();

    if let Err(e) = store.update_user(&current, memberships, timestamp) {
      warn!("propagación {} truncada: error escribiendo usuario {}: {}", contador.nombre(), current, e);
      return false;
    }

    if raiz {
      // La raíz ya fue actualizada; no volver a cargarla como su propio
      // superior.
      return true;
    }
    current = siguiente;
  }
}

/// Propaga un delta de votos potenciales (edición de `voto_esperado`) desde
/// `origin_user_id` hasta la raíz, y luego incrementa el total de la
/// campaña con un incremento plano NO transaccional.
///
/// `delta` puede ser negativo (reducción de una estimación); el algoritmo
/// es simétrico. Todo el camino es best-effort: si el recorrido se trunca
/// antes de la raíz el agregado de campaña no se toca, y el caller no
/// recibe error.
pub fn propagate_potential_votes<S>(store: &S, campaign_id: &Uuid, origin_user_id: &Uuid, delta: i64) -> Result<()>
  where S: CampaignStore + ?Sized
{
  if !subir_cadena(store, campaign_id, origin_user_id, delta, Contador::Potencial) {
    return Ok(());
  }
  if let Err(e) = store.increment_campaign_field(campaign_id, CampaignField::TotalPotentialVotes, delta) {
    warn!("no se pudo incrementar totalPotentialVotes de la campaña {}: {}", campaign_id, e);
  }
  Ok(())
}

/// Propaga votos confirmados desde `origin_user_id`.
///
/// Primero incrementa `totalConfirmedVotes` del agregado de campaña dentro
/// de una transacción: es la cifra auditada y su actualización es atómica e
/// independiente de que el recorrido posterior se complete. Un fallo en esa
/// transacción SÍ se devuelve como error duro. Después sube la cadena de
/// ancestros sumando a `pyramid_votes`, con la misma semántica best-effort
/// del camino potencial.
pub fn propagate_real_votes<S>(store: &S, campaign_id: &Uuid, origin_user_id: &Uuid, delta: i64) -> Result<()>
  where S: CampaignStore + ?Sized
{
  store.run_transaction(&mut |tx| {
         let mut campaign = tx.get_campaign(campaign_id)?
                              .ok_or(StoreError::NotFound(format!("campaña {}", campaign_id)))?;
         campaign.add_confirmed(delta);
         tx.put_campaign(&campaign)
       })?;

  subir_cadena(store, campaign_id, origin_user_id, delta, Contador::Piramide);
  Ok(())
}
