use crate::db::models::{CreatingUserSession, UserSession};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionServiceError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

#[derive(Error, Debug)]
pub enum CreateSessionError {
    #[error("a session with the given token already exists")]
    DuplicateToken,
    #[error("user with ID `{user_id}` does not exist")]
    UnknownUser { user_id: i32 },
    #[error("{0}")]
    Error(#[from] SessionServiceError),
}

pub struct SessionService {
    db_pool: Pool<AsyncPgConnection>,
}

impl SessionService {
    pub fn new(db_pool: Pool<AsyncPgConnection>) -> Arc<Self> {
        Arc::new(Self { db_pool })
    }

    /// Creates a new session for the given user ID.
    /// The token is minted by the authentication flow that owns it; this
    /// service only persists it. Its uniqueness is enforced by the primary key.
    pub async fn create_session(
        &self,
        user_id: i32,
        token: &str,
    ) -> Result<UserSession, CreateSessionError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await.map_err(SessionServiceError::from)?;
        let session = diesel::insert_into(schema::user_sessions::table)
            .values(CreatingUserSession { token, user_id })
            .returning((
                schema::user_sessions::token,
                schema::user_sessions::user_id,
                schema::user_sessions::created_at,
            ))
            .get_result::<UserSession>(db)
            .await;

        let session = match session {
            Ok(session) => session,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => return Err(CreateSessionError::DuplicateToken),
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                err,
            )) if err.constraint_name() == Some("user_fk") => {
                return Err(CreateSessionError::UnknownUser { user_id })
            }
            Err(err) => return Err(SessionServiceError::from(err).into()),
        };

        Ok(session)
    }

    /// Retrieves a session by its token.
    pub async fn get_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<UserSession>, SessionServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let session = schema::user_sessions::dsl::user_sessions
            .filter(schema::user_sessions::token.eq(token))
            .select((
                schema::user_sessions::token,
                schema::user_sessions::user_id,
                schema::user_sessions::created_at,
            ))
            .first::<UserSession>(db)
            .await
            .optional()?;

        Ok(session)
    }

    /// Removes a session by its token.
    /// Returns the session that was removed, or `None` if no session was found.
    pub async fn remove_session_by_token(
        &self,
        token: &str,
    ) -> Result<Option<UserSession>, SessionServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let session = diesel::delete(
            schema::user_sessions::dsl::user_sessions
                .filter(schema::user_sessions::token.eq(token)),
        )
        .returning((
            schema::user_sessions::token,
            schema::user_sessions::user_id,
            schema::user_sessions::created_at,
        ))
        .get_result::<UserSession>(db)
        .await
        .optional()?;

        Ok(session)
    }
}
