use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod connection;
pub mod models;
pub mod schema;

pub const MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../../db/migrations");
