pub mod models;
pub mod schema;

use diesel::{Connection, PgConnection};
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager},
    AsyncPgConnection,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/migrations");

#[derive(Error, Debug)]
pub enum DBError {
    #[error("failed to connect to database: {0}")]
    ConnectionError(#[from] diesel::ConnectionError),
    #[error("failed to run migrations: {0}")]
    MigrationError(#[from] Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to create database connection pool: {0}")]
    PoolCreationError(#[from] diesel_async::pooled_connection::deadpool::BuildError),
    #[error("failed to execute query: {0}")]
    DieselError(#[from] diesel::result::Error),
}

/// Applies all pending migrations to the given database.
/// Returns the versions of the migrations that were applied, in order.
///
/// The `user_sessions` migration declares a foreign key into the external
/// `users` table, so that table must exist before migrations are run.
pub fn run_migrations(database_url_base: &str, database_name: &str) -> Result<Vec<String>, DBError> {
    let url = make_database_url(database_url_base, database_name);
    let mut connection = PgConnection::establish(&url)?;
    let versions = connection.run_pending_migrations(MIGRATIONS)?;
    Ok(versions
        .into_iter()
        .map(|version| version.to_string())
        .collect())
}

pub fn create_database_connection_pool(
    database_url_base: &str,
    database_name: &str,
) -> Result<Pool<AsyncPgConnection>, DBError> {
    let url = make_database_url(database_url_base, database_name);
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
    let pool = Pool::builder(manager).build()?;
    Ok(pool)
}

pub(crate) fn make_database_url(database_url_base: &str, database_name: &str) -> String {
    if database_url_base.ends_with('/') {
        format!("{}{}", database_url_base, database_name)
    } else {
        format!("{}/{}", database_url_base, database_name)
    }
}
