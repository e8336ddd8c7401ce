// Esquema Diesel simplificado usado en SQLite (y Postgres vía `pg`).
// Tablas: usuarios, campanias
use diesel::allow_tables_to_appear_in_same_query;
diesel::table! {
    usuarios (id) {
        id -> Text,
        nombre -> Text,
        email -> Nullable<Text>,
        memberships -> Text,
        updated_at_ts -> BigInt,
    }
}
diesel::table! {
    campanias (id) {
        id -> Text,
        nombre -> Text,
        candidato_id -> Text,
        total_confirmed_votes -> BigInt,
        total_potential_votes -> BigInt,
        metadata -> Text,
        created_at_ts -> BigInt,
    }
}
allow_tables_to_appear_in_same_query!(usuarios, campanias);
