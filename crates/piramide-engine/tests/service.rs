use piramide_domain::{Estado, Rol};
use piramide_engine::{Actor, EngineError, MembershipService, MembershipUpdate};
use piramide_store::{CampaignStore, InMemoryCampaignStore};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Campaña CMP1 con A(candidato, ownerBy=A), B(manager, ownerBy=A) y
/// C(votante, ownerBy=B), creada a través del propio servicio.
fn servicio_cmp1() -> (MembershipService<InMemoryCampaignStore>, Uuid, Uuid, Uuid, Uuid) {
  let store = Arc::new(InMemoryCampaignStore::new());
  let service = MembershipService::new(store);
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();
  let c = Uuid::new_v4();

  let cid = service.create_campaign("CMP1", a, "Candidata A", json!({})).unwrap();
  service.register_subordinate(&Actor::usuario(a), &cid, a, b, "Manager B", Rol::Manager).unwrap();
  service.register_subordinate(&Actor::usuario(b), &cid, b, c, "Votante C", Rol::Votante).unwrap();

  (service, cid, a, b, c)
}

fn pyramid_votes(service: &MembershipService<InMemoryCampaignStore>, cid: &Uuid, uid: &Uuid) -> i64 {
  service.store().get_user(uid).unwrap().unwrap().membership_for(cid).unwrap().pyramid_votes()
}

fn potential_votes(service: &MembershipService<InMemoryCampaignStore>, cid: &Uuid, uid: &Uuid) -> i64 {
  service.store().get_user(uid).unwrap().unwrap().membership_for(cid).unwrap().total_potential_votes()
}

#[test]
fn escenario_concreto_cmp1() {
  let (service, cid, a, b, c) = servicio_cmp1();

  service.submit_direct_vote(&c, &cid, 10).unwrap();

  let uc = service.store().get_user(&c).unwrap().unwrap();
  let mc = uc.membership_for(&cid).unwrap();
  assert_eq!(mc.direct_votes(), 10);
  assert_eq!(mc.pyramid_votes(), 10);
  assert_eq!(pyramid_votes(&service, &cid, &b), 10);
  assert_eq!(pyramid_votes(&service, &cid, &a), 10);
  assert_eq!(service.store().get_campaign(&cid).unwrap().unwrap().total_confirmed_votes(), 10);
}

#[test]
fn votos_directos_no_positivos_se_rechazan_sin_propagar() {
  let (service, cid, a, _b, c) = servicio_cmp1();

  for invalido in [0i64, -5] {
    let res = service.submit_direct_vote(&c, &cid, invalido);
    assert!(matches!(res, Err(EngineError::Validation(_))));
  }
  assert_eq!(pyramid_votes(&service, &cid, &a), 0);
  assert_eq!(service.store().get_campaign(&cid).unwrap().unwrap().total_confirmed_votes(), 0);
}

#[test]
fn membresia_inactiva_no_puede_reportar_votos() {
  let (service, cid, _a, b, c) = servicio_cmp1();

  service.set_member_estado(&Actor::usuario(b), &c, &cid, Estado::Inactivo).unwrap();
  let res = service.submit_direct_vote(&c, &cid, 3);
  assert!(matches!(res, Err(EngineError::Validation(_))));
  assert_eq!(service.store().get_campaign(&cid).unwrap().unwrap().total_confirmed_votes(), 0);
}

#[test]
fn edicion_de_voto_esperado_propaga_el_delta() {
  let (service, cid, a, b, c) = servicio_cmp1();

  let cambiados = service.update_membership(&Actor::usuario(b),
                                            &c,
                                            &cid,
                                            MembershipUpdate { voto_esperado: Some(10), ..Default::default() })
                         .unwrap();
  assert_eq!(cambiados, vec!["votoEsperado".to_string()]);

  // el delta se recalcula contra el valor anterior: 10 -> 7 propaga -3
  service.update_membership(&Actor::usuario(b),
                            &c,
                            &cid,
                            MembershipUpdate { voto_esperado: Some(7), ..Default::default() })
         .unwrap();

  assert_eq!(potential_votes(&service, &cid, &c), 7);
  assert_eq!(potential_votes(&service, &cid, &b), 7);
  assert_eq!(potential_votes(&service, &cid, &a), 7);
  assert_eq!(service.store().get_campaign(&cid).unwrap().unwrap().total_potential_votes(), 7);
}

#[test]
fn voto_promesa_es_solo_del_propio_miembro() {
  let (service, cid, _a, b, c) = servicio_cmp1();

  // el propio miembro sí
  let cambiados = service.update_membership(&Actor::usuario(c),
                                            &c,
                                            &cid,
                                            MembershipUpdate { voto_promesa: Some(1), ..Default::default() })
                         .unwrap();
  assert_eq!(cambiados, vec!["votoPromesa".to_string()]);

  // el superior no (votoPromesa es autodeclarado)
  let res = service.update_membership(&Actor::usuario(b),
                                      &c,
                                      &cid,
                                      MembershipUpdate { voto_promesa: Some(99), ..Default::default() });
  assert!(matches!(res, Err(EngineError::Unauthorized(_))));
}

#[test]
fn frontera_de_autorizacion_sin_cambios_de_contadores() {
  let (service, cid, a, b, c) = servicio_cmp1();

  // un tercero que no es superior de C intenta editar su votoEsperado
  let intruso = Uuid::new_v4();
  service.register_subordinate(&Actor::usuario(a), &cid, a, intruso, "Intruso", Rol::Manager).unwrap();

  let res = service.update_membership(&Actor::usuario(intruso),
                                      &c,
                                      &cid,
                                      MembershipUpdate { voto_esperado: Some(50), ..Default::default() });
  assert!(matches!(res, Err(EngineError::Unauthorized(_))));

  // cero cambios de contadores en cualquier parte
  for uid in [&a, &b, &c] {
    assert_eq!(potential_votes(&service, &cid, uid), 0);
    assert_eq!(pyramid_votes(&service, &cid, uid), 0);
  }
  let campaign = service.store().get_campaign(&cid).unwrap().unwrap();
  assert_eq!(campaign.total_potential_votes(), 0);
  assert_eq!(campaign.total_confirmed_votes(), 0);
}

#[test]
fn votante_no_puede_editar_aunque_sea_el_superior_registrado() {
  // owner_by correcto pero rol sin privilegio: también se rechaza
  let (service, cid, _a, _b, c) = servicio_cmp1();

  // un admin habilita a C (votante) para reclutar, y C registra a D
  let admin = Actor::administrador(Uuid::new_v4());
  service.update_membership(&admin,
                            &c,
                            &cid,
                            MembershipUpdate { can_register_subordinates: Some(true), ..Default::default() })
         .unwrap();
  let d = Uuid::new_v4();
  service.register_subordinate(&Actor::usuario(c), &cid, c, d, "Votante D", Rol::Votante).unwrap();

  // C es el owner_by registrado de D, pero su rol (votante) no alcanza
  let res = service.update_membership(&Actor::usuario(c),
                                      &d,
                                      &cid,
                                      MembershipUpdate { voto_esperado: Some(5), ..Default::default() });
  assert!(matches!(res, Err(EngineError::Unauthorized(_))));
}

#[test]
fn administrador_puede_editar_cualquier_campo() {
  let (service, cid, _a, _b, c) = servicio_cmp1();
  let admin = Actor::administrador(Uuid::new_v4());

  let cambiados = service.update_membership(&admin,
                                            &c,
                                            &cid,
                                            MembershipUpdate { voto_promesa: Some(1),
                                                               voto_esperado: Some(4),
                                                               can_register_subordinates: Some(true) })
                         .unwrap();
  assert_eq!(cambiados.len(), 3);
  assert_eq!(potential_votes(&service, &cid, &c), 4);
}

#[test]
fn actualizacion_sin_cambios_reales_no_propaga() {
  let (service, cid, a, b, c) = servicio_cmp1();

  service.update_membership(&Actor::usuario(b),
                            &c,
                            &cid,
                            MembershipUpdate { voto_esperado: Some(10), ..Default::default() })
         .unwrap();
  // mismo valor otra vez: ningún campo cambiado, ninguna propagación extra
  let cambiados = service.update_membership(&Actor::usuario(b),
                                            &c,
                                            &cid,
                                            MembershipUpdate { voto_esperado: Some(10), ..Default::default() })
                         .unwrap();
  assert!(cambiados.is_empty());
  assert_eq!(potential_votes(&service, &cid, &a), 10);
  assert_eq!(service.store().get_campaign(&cid).unwrap().unwrap().total_potential_votes(), 10);
}

#[test]
fn registro_de_subordinados_respeta_las_reglas() {
  let (service, cid, a, b, c) = servicio_cmp1();

  // C es votante: no puede reclutar
  let res = service.register_subordinate(&Actor::usuario(c), &cid, c, Uuid::new_v4(), "X", Rol::Votante);
  assert!(matches!(res, Err(EngineError::Unauthorized(_))));

  // nadie puede registrar un segundo candidato
  let res = service.register_subordinate(&Actor::usuario(a), &cid, a, Uuid::new_v4(), "X", Rol::Candidato);
  assert!(res.is_err());

  // un actor distinto del superior no puede colgar miembros bajo él
  let res = service.register_subordinate(&Actor::usuario(b), &cid, a, Uuid::new_v4(), "X", Rol::Votante);
  assert!(matches!(res, Err(EngineError::Unauthorized(_))));

  // el usuario destino no puede pertenecer ya a la campaña
  let res = service.register_subordinate(&Actor::usuario(a), &cid, a, c, "C bis", Rol::Manager);
  assert!(res.is_err());

  // un superior inactivo tampoco recluta
  service.set_member_estado(&Actor::usuario(a), &b, &cid, Estado::Inactivo).unwrap();
  let res = service.register_subordinate(&Actor::usuario(b), &cid, b, Uuid::new_v4(), "X", Rol::Votante);
  assert!(matches!(res, Err(EngineError::Validation(_))));
}

#[test]
fn un_usuario_puede_pertenecer_a_varias_campanias() {
  let (service, cid1, _a, b, _c) = servicio_cmp1();

  // B es manager en CMP1 y candidato raíz de su propia campaña
  let cid2 = service.create_campaign("CMP2", b, "B por sí mismo", json!({})).unwrap();

  service.submit_direct_vote(&b, &cid2, 3).unwrap();

  let ub = service.store().get_user(&b).unwrap().unwrap();
  assert_eq!(ub.membership_for(&cid2).unwrap().pyramid_votes(), 3);
  // la campaña original no se ve afectada
  assert_eq!(ub.membership_for(&cid1).unwrap().pyramid_votes(), 0);
  assert_eq!(service.store().get_campaign(&cid1).unwrap().unwrap().total_confirmed_votes(), 0);
  assert_eq!(service.store().get_campaign(&cid2).unwrap().unwrap().total_confirmed_votes(), 3);
}
