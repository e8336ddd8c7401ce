use crate::schema;
use crate::schema::campanias::dsl as campanias_dsl;
use crate::schema::usuarios::dsl as usuarios_dsl;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::Error as DieselError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::warn;
use piramide_domain::{Campaign, Membership, UserRecord};
use piramide_store::{CampaignField, CampaignStore, CampaignTx, StoreError};
use std::sync::Arc;
use uuid::Uuid;

type Result<T> = std::result::Result<T, StoreError>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
#[cfg(all(feature = "pg", not(test)))]
type DbPool = Pool<ConnectionManager<PgConnection>>;
#[cfg(any(test, not(feature = "pg")))]
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
#[cfg(all(feature = "pg", not(test)))]
type DbConn = PgConnection;
#[cfg(any(test, not(feature = "pg")))]
type DbConn = SqliteConnection;

/// Store Diesel que implementa `CampaignStore`.
pub struct DieselCampaignStore {
  pool: Arc<DbPool>,
}

impl DieselCampaignStore {
  pub fn new(database_url: &str) -> Self {
    Self::with_pool_size(database_url, 4)
  }

  fn with_pool_size(database_url: &str, size: u32) -> Self {
    let manager = ConnectionManager::<DbConn>::new(database_url);
    let pool = Pool::builder().max_size(size).build(manager).expect("no se pudo crear el pool de conexiones");
    let store = DieselCampaignStore { pool: Arc::new(pool) };
    if let Ok(mut c) = store.conn_raw() {
      let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut c);
      if let Err(e) = c.run_pending_migrations(MIGRATIONS) {
        warn!("no se pudieron aplicar las migraciones: {}", e);
      }
    }
    store
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<DbConn>>, r2d2::Error> {
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>> {
    self.conn_raw().map_err(|e| StoreError::Storage(format!("pool: {}", e)))
  }
}

/// Construye el store desde el entorno (`DATABASE_URL`, con `.env` vía
/// dotenvy). Si no hay variable usa un archivo SQLite local.
pub fn new_from_env() -> Result<DieselCampaignStore> {
  dotenvy::dotenv().ok();
  let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "piramide.db".to_string());
  Ok(DieselCampaignStore::new(&url))
}

/// Store SQLite en memoria para pruebas: pool de una sola conexión para
/// que la BD `:memory:` sobreviva entre llamadas.
#[cfg(any(test, not(feature = "pg")))]
pub fn new_sqlite_for_test() -> DieselCampaignStore {
  DieselCampaignStore::with_pool_size(":memory:", 1)
}

// Filas Diesel para las tablas del motor
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::usuarios)]
struct UsuarioRow {
  pub id: String,
  pub nombre: String,
  pub email: Option<String>,
  pub memberships: String,
  pub updated_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::campanias)]
struct CampaniaRow {
  pub id: String,
  pub nombre: String,
  pub candidato_id: String,
  pub total_confirmed_votes: i64,
  pub total_potential_votes: i64,
  pub metadata: String,
  pub created_at_ts: i64,
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| StoreError::Storage(format!("db: {}", e)))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| StoreError::Storage(format!("uuid inválido '{}': {}", s, e)))
}

fn user_from_row(row: UsuarioRow) -> Result<UserRecord> {
  let id = parse_uuid(&row.id)?;
  let memberships: Vec<Membership> =
    serde_json::from_str(&row.memberships).map_err(|e| StoreError::Storage(format!("memberships json: {}", e)))?;
  let updated_at = DateTime::from_timestamp_millis(row.updated_at_ts).unwrap_or_else(Utc::now);
  UserRecord::from_parts(id, &row.nombre, row.email, memberships, updated_at).map_err(|e| StoreError::Other(e.to_string()))
}

fn user_to_row(user: &UserRecord) -> Result<UsuarioRow> {
  let memberships =
    serde_json::to_string(user.memberships()).map_err(|e| StoreError::Storage(format!("memberships json: {}", e)))?;
  Ok(UsuarioRow { id: user.id().to_string(),
                  nombre: user.nombre().to_string(),
                  email: user.email().map(|s| s.to_string()),
                  memberships,
                  updated_at_ts: user.updated_at().timestamp_millis() })
}

fn campaign_from_row(row: CampaniaRow) -> Result<Campaign> {
  let id = parse_uuid(&row.id)?;
  let candidato_id = parse_uuid(&row.candidato_id)?;
  let metadata = serde_json::from_str(&row.metadata).unwrap_or(serde_json::json!({}));
  let created_at = DateTime::from_timestamp_millis(row.created_at_ts).unwrap_or_else(Utc::now);
  Campaign::from_parts(id,
                       &row.nombre,
                       candidato_id,
                       row.total_confirmed_votes,
                       row.total_potential_votes,
                       metadata,
                       created_at).map_err(|e| StoreError::Other(e.to_string()))
}

fn campaign_to_row(campaign: &Campaign) -> CampaniaRow {
  CampaniaRow { id: campaign.id().to_string(),
                nombre: campaign.nombre().to_string(),
                candidato_id: campaign.candidato_id().to_string(),
                total_confirmed_votes: campaign.total_confirmed_votes(),
                total_potential_votes: campaign.total_potential_votes(),
                metadata: campaign.metadata().to_string(),
                created_at_ts: campaign.created_at().timestamp_millis() }
}

fn get_campaign_with(conn: &mut DbConn, campaign_id: &Uuid) -> Result<Option<Campaign>> {
  let id_s = campaign_id.to_string();
  let opt = map_db_err(campanias_dsl::campanias.filter(campanias_dsl::id.eq(&id_s))
                                               .first::<CampaniaRow>(conn)
                                               .optional())?;
  opt.map(campaign_from_row).transpose()
}

fn put_campaign_with(conn: &mut DbConn, campaign: &Campaign) -> Result<()> {
  let row = campaign_to_row(campaign);
  let updated = map_db_err(diesel::update(campanias_dsl::campanias.filter(campanias_dsl::id.eq(&row.id)))
                             .set((campanias_dsl::nombre.eq(&row.nombre),
                                   campanias_dsl::total_confirmed_votes.eq(row.total_confirmed_votes),
                                   campanias_dsl::total_potential_votes.eq(row.total_potential_votes),
                                   campanias_dsl::metadata.eq(&row.metadata)))
                             .execute(conn))?;
  if updated == 0 {
    map_db_err(diesel::insert_into(campanias_dsl::campanias).values(&row).execute(conn))?;
  }
  Ok(())
}

/// Vista transaccional sobre la conexión: las escrituras se confirman o
/// revierten junto con la transacción Diesel que la envuelve.
struct DieselTx<'a> {
  conn: &'a mut DbConn,
}

impl CampaignTx for DieselTx<'_> {
  fn get_campaign(&mut self, campaign_id: &Uuid) -> Result<Option<Campaign>> {
    get_campaign_with(self.conn, campaign_id)
  }

  fn put_campaign(&mut self, campaign: &Campaign) -> Result<()> {
    put_campaign_with(self.conn, campaign)
  }
}

/// Error interno de la transacción: distingue fallos del caller de fallos
/// de Diesel para cumplir el `From<diesel::result::Error>` que exige
/// `Connection::transaction`.
enum TxFail {
  Store(StoreError),
  Db(DieselError),
}

impl From<DieselError> for TxFail {
  fn from(e: DieselError) -> Self {
    TxFail::Db(e)
  }
}

impl CampaignStore for DieselCampaignStore {
  fn get_user(&self, user_id: &Uuid) -> Result<Option<UserRecord>> {
    let mut conn = self.conn()?;
    let id_s = user_id.to_string();
    let opt = map_db_err(usuarios_dsl::usuarios.filter(usuarios_dsl::id.eq(&id_s))
                                               .first::<UsuarioRow>(&mut conn)
                                               .optional())?;
    opt.map(user_from_row).transpose()
  }

  fn update_user(&self, user_id: &Uuid, memberships: Vec<Membership>, timestamp: DateTime<Utc>) -> Result<()> {
    let mut conn = self.conn()?;
    let id_s = user_id.to_string();
    let json =
      serde_json::to_string(&memberships).map_err(|e| StoreError::Storage(format!("memberships json: {}", e)))?;
    let updated = map_db_err(diesel::update(usuarios_dsl::usuarios.filter(usuarios_dsl::id.eq(&id_s)))
                               .set((usuarios_dsl::memberships.eq(&json),
                                     usuarios_dsl::updated_at_ts.eq(timestamp.timestamp_millis())))
                               .execute(&mut conn))?;
    if updated == 0 {
      return Err(StoreError::NotFound(format!("usuario {}", user_id)));
    }
    Ok(())
  }

  fn create_user(&self, user: UserRecord) -> Result<()> {
    let mut conn = self.conn()?;
    let row = user_to_row(&user)?;
    let existe: i64 = map_db_err(usuarios_dsl::usuarios.filter(usuarios_dsl::id.eq(&row.id))
                                                       .count()
                                                       .get_result(&mut conn))?;
    if existe > 0 {
      return Err(StoreError::Conflict(format!("usuario {} ya existe", user.id())));
    }
    map_db_err(diesel::insert_into(usuarios_dsl::usuarios).values(&row).execute(&mut conn))?;
    Ok(())
  }

  fn get_campaign(&self, campaign_id: &Uuid) -> Result<Option<Campaign>> {
    let mut conn = self.conn()?;
    get_campaign_with(&mut conn, campaign_id)
  }

  fn create_campaign(&self, campaign: Campaign) -> Result<()> {
    let mut conn = self.conn()?;
    let row = campaign_to_row(&campaign);
    let existe: i64 = map_db_err(campanias_dsl::campanias.filter(campanias_dsl::id.eq(&row.id))
                                                         .count()
                                                         .get_result(&mut conn))?;
    if existe > 0 {
      return Err(StoreError::Conflict(format!("campaña {} ya existe", campaign.id())));
    }
    map_db_err(diesel::insert_into(campanias_dsl::campanias).values(&row).execute(&mut conn))?;
    Ok(())
  }

  fn list_campaigns(&self) -> Result<Vec<Campaign>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(campanias_dsl::campanias.load::<CampaniaRow>(&mut conn))?;
    rows.into_iter().map(campaign_from_row).collect()
  }

  /// Leer-incrementar-escribir SIN transacción: dos sentencias separadas,
  /// fiel al contrato (y a su carrera documentada).
  fn increment_campaign_field(&self, campaign_id: &Uuid, field: CampaignField, delta: i64) -> Result<()> {
    let mut conn = self.conn()?;
    let mut campaign = get_campaign_with(&mut conn, campaign_id)?
      .ok_or(StoreError::NotFound(format!("campaña {}", campaign_id)))?;
    match field {
      CampaignField::TotalConfirmedVotes => campaign.add_confirmed(delta),
      CampaignField::TotalPotentialVotes => campaign.add_potential(delta),
    }
    put_campaign_with(&mut conn, &campaign)
  }

  fn run_transaction(&self, op: &mut dyn FnMut(&mut dyn CampaignTx) -> Result<()>) -> Result<()> {
    let mut conn = self.conn()?;
    conn.transaction::<(), TxFail, _>(|c| {
          let mut tx = DieselTx { conn: c };
          op(&mut tx).map_err(TxFail::Store)
        })
        .map_err(|e| match e {
          TxFail::Store(s) => s,
          TxFail::Db(d) => StoreError::Storage(format!("db: {}", d)),
        })
  }
}
