use crate::db::models::{Collection, CreatingCollection};
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CollectionServiceError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

#[derive(Error, Debug)]
pub enum RemoveCollectionError {
    #[error("collection with ID `{collection_id}` still contains files")]
    CollectionInUse { collection_id: Uuid },
    #[error("{0}")]
    Error(#[from] CollectionServiceError),
}

pub struct CollectionService {
    db_pool: Pool<AsyncPgConnection>,
}

impl CollectionService {
    pub fn new(db_pool: Pool<AsyncPgConnection>) -> Arc<Self> {
        Arc::new(Self { db_pool })
    }

    /// Creates a new collection.
    pub async fn create_collection(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Collection, CollectionServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let collection = diesel::insert_into(schema::collections::table)
            .values(CreatingCollection { name, description })
            .returning((
                schema::collections::id,
                schema::collections::name,
                schema::collections::description,
                schema::collections::created_at,
            ))
            .get_result::<Collection>(db)
            .await?;

        Ok(collection)
    }

    /// Removes a collection by its ID.
    /// Returns the collection that was removed, or `None` if no collection was found.
    /// Removal is blocked while any file is still associated with the collection.
    pub async fn remove_collection_by_id(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<Collection>, RemoveCollectionError> {
        use crate::db::schema;

        let db = &mut self
            .db_pool
            .get()
            .await
            .map_err(CollectionServiceError::from)?;
        let collection = diesel::delete(
            schema::collections::dsl::collections.filter(schema::collections::id.eq(collection_id)),
        )
        .returning((
            schema::collections::id,
            schema::collections::name,
            schema::collections::description,
            schema::collections::created_at,
        ))
        .get_result::<Collection>(db)
        .await
        .optional();

        let collection = match collection {
            Ok(collection) => collection,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                err,
            )) if err.constraint_name() == Some("collection_fk") => {
                return Err(RemoveCollectionError::CollectionInUse { collection_id })
            }
            Err(err) => return Err(CollectionServiceError::from(err).into()),
        };

        Ok(collection)
    }

    /// Retrieves a list of collections.
    /// The result will be sorted by name and ID (name first) in ascending order,
    /// following the `collections_name_id_idx` index.
    /// If `last_collection_id` is provided, the result will start from the collection that comes after it.
    pub async fn get_collections(
        &self,
        last_collection_id: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<Collection>, CollectionServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;

        let query = schema::collections::dsl::collections
            .select((
                schema::collections::id,
                schema::collections::name,
                schema::collections::description,
                schema::collections::created_at,
            ))
            .order((schema::collections::name.asc(), schema::collections::id.asc()))
            .limit(limit as i64);

        let collections = match last_collection_id {
            Some(last_collection_id) => {
                let last_collection = schema::collections::dsl::collections
                    .select((schema::collections::name, schema::collections::id))
                    .filter(schema::collections::id.eq(last_collection_id))
                    .first::<(String, Uuid)>(db)
                    .await
                    .optional()?;

                let (last_collection_name, last_collection_id) = match last_collection {
                    Some((name, id)) => (name, id),
                    None => return Ok(Vec::new()),
                };

                query
                    .filter(
                        schema::collections::name
                            .gt(last_collection_name.clone())
                            .or(schema::collections::name
                                .eq(last_collection_name)
                                .and(schema::collections::id.gt(last_collection_id))),
                    )
                    .load::<Collection>(db)
            }
            None => query.load::<Collection>(db),
        };
        let collections = collections.await?;

        Ok(collections)
    }

    /// Retrieves a collection by its ID.
    pub async fn get_collection_by_id(
        &self,
        collection_id: Uuid,
    ) -> Result<Option<Collection>, CollectionServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let collection = schema::collections::dsl::collections
            .filter(schema::collections::id.eq(collection_id))
            .select((
                schema::collections::id,
                schema::collections::name,
                schema::collections::description,
                schema::collections::created_at,
            ))
            .first::<Collection>(db)
            .await
            .optional()?;

        Ok(collection)
    }
}
