use piramide_engine::{Actor, MembershipService, MembershipUpdate};
use piramide_domain::Rol;
use piramide_store::CampaignStore;
use serde_json::json;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Pequeño menú interactivo para administrar campañas y su pirámide de
/// miembros usando el store proporcionado por `piramide-persistence`.
///
/// Opciones soportadas:
/// 1) Ver campañas (tabla con id, candidato y totales)
/// 2) Crear campaña (da de alta al candidato raíz)
/// 3) Registrar subordinado
/// 4) Reportar votos directos
/// 5) Editar voto esperado de un subordinado
/// 6) Salir
fn main() -> Result<(), Box<dyn Error>> {
    // Inicializar store (aplica migraciones embebidas si procede)
    let store = piramide_persistence::new_from_env().map_err(|e| Box::new(e) as Box<dyn Error>)?;
    let store = Arc::new(store);
    let service = MembershipService::new(store.clone());

    loop {
        println!("\n== Pirámide CLI menu ==");
        println!("1) Ver campañas");
        println!("2) Crear campaña");
        println!("3) Registrar subordinado");
        println!("4) Reportar votos directos");
        println!("5) Editar voto esperado");
        println!("6) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => {
                match store.list_campaigns() {
                    Ok(campaigns) => {
                        println!("\nID                                   | CANDIDATO                            | CONFIRMADOS | POTENCIALES | NOMBRE");
                        println!("--------------------------------------------------------------------------------------------------------------------");
                        for c in campaigns {
                            println!("{} | {} | {:>11} | {:>11} | {}",
                                     c.id(), c.candidato_id(), c.total_confirmed_votes(), c.total_potential_votes(), c.nombre());
                        }
                    }
                    Err(e) => eprintln!("Error listando campañas: {}", e),
                }
            }
            "2" => {
                let nombre = prompt("Nombre de la campaña: ")?;
                if nombre.trim().is_empty() { eprintln!("El nombre no puede estar vacío"); continue; }
                let nombre_candidato = prompt("Nombre del candidato: ")?;
                let candidato_id = Uuid::new_v4();
                match service.create_campaign(nombre.trim(), candidato_id, nombre_candidato.trim(), json!({})) {
                    Ok(id) => println!("Campaña creada: {} (candidato: {})", id, candidato_id),
                    Err(e) => eprintln!("Error creando campaña: {}", e),
                }
            }
            "3" => {
                let cid = match prompt_uuid("Campaña (UUID): ")? { Some(u) => u, None => continue };
                let owner = match prompt_uuid("Superior (UUID de usuario): ")? { Some(u) => u, None => continue };
                let nombre = prompt("Nombre del nuevo miembro: ")?;
                let rol_s = prompt("Rol (manager/anillo/votante): ")?;
                let rol = match rol_s.trim() {
                    "manager" => Rol::Manager,
                    "anillo" => Rol::Anillo,
                    "votante" => Rol::Votante,
                    other => { eprintln!("Rol inválido: {}", other); continue; }
                };
                let user_id = Uuid::new_v4();
                match service.register_subordinate(&Actor::usuario(owner), &cid, owner, user_id, nombre.trim(), rol) {
                    Ok(()) => println!("Miembro registrado: {}", user_id),
                    Err(e) => eprintln!("Error registrando miembro: {}", e),
                }
            }
            "4" => {
                let cid = match prompt_uuid("Campaña (UUID): ")? { Some(u) => u, None => continue };
                let uid = match prompt_uuid("Miembro que reporta (UUID): ")? { Some(u) => u, None => continue };
                let votos_s = prompt("Cantidad de votos: ")?;
                let votos: i64 = match votos_s.trim().parse() {
                    Ok(n) => n,
                    Err(_) => { eprintln!("Cantidad inválida"); continue; }
                };
                match service.submit_direct_vote(&uid, &cid, votos) {
                    Ok(()) => println!("Votos reportados y propagados"),
                    Err(e) => eprintln!("Error reportando votos: {}", e),
                }
            }
            "5" => {
                let cid = match prompt_uuid("Campaña (UUID): ")? { Some(u) => u, None => continue };
                let actor = match prompt_uuid("Superior que edita (UUID): ")? { Some(u) => u, None => continue };
                let uid = match prompt_uuid("Subordinado (UUID): ")? { Some(u) => u, None => continue };
                let valor_s = prompt("Nuevo voto esperado: ")?;
                let valor: i64 = match valor_s.trim().parse() {
                    Ok(n) => n,
                    Err(_) => { eprintln!("Valor inválido"); continue; }
                };
                let updates = MembershipUpdate { voto_esperado: Some(valor), ..Default::default() };
                match service.update_membership(&Actor::usuario(actor), &uid, &cid, updates) {
                    Ok(cambiados) if cambiados.is_empty() => println!("Sin cambios"),
                    Ok(cambiados) => println!("Campos actualizados: {:?}", cambiados),
                    Err(e) => eprintln!("Error actualizando membresía: {}", e),
                }
            }
            "6" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}

fn prompt_uuid(msg: &str) -> io::Result<Option<Uuid>> {
    let s = prompt(msg)?;
    match Uuid::parse_str(s.trim()) {
        Ok(u) => Ok(Some(u)),
        Err(_) => {
            eprintln!("UUID inválido");
            Ok(None)
        }
    }
}
