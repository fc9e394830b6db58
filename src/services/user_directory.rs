use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserDirectoryError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

/// Lookup into the external account system that owns the users table.
/// The schema store only references user IDs; it never creates or updates
/// them, so this is the whole surface it needs.
#[async_trait]
pub trait UserDirectory {
    /// Returns whether a user with the given ID exists.
    async fn contains_user(&self, user_id: i32) -> Result<bool, UserDirectoryError>;
}

/// A directory backed by the users table living in the same database.
pub struct PgUserDirectory {
    db_pool: Pool<AsyncPgConnection>,
}

impl PgUserDirectory {
    pub fn new(db_pool: Pool<AsyncPgConnection>) -> Arc<Self> {
        Arc::new(Self { db_pool })
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn contains_user(&self, user_id: i32) -> Result<bool, UserDirectoryError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let id = schema::users::dsl::users
            .filter(schema::users::id.eq(user_id))
            .select(schema::users::id)
            .first::<i32>(db)
            .await
            .optional()?;

        Ok(id.is_some())
    }
}
