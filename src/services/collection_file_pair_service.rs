use crate::db::models::{CollectionFilePair, CreatingCollectionFilePair};
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CollectionFilePairServiceError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

#[derive(Error, Debug)]
pub enum AddFileToCollectionError {
    #[error("collection with ID `{collection_id}` already contains file with ID `{file_id}`")]
    AlreadyExists { collection_id: Uuid, file_id: Uuid },
    #[error("collection with ID `{collection_id}` does not exist")]
    InvalidCollection { collection_id: Uuid },
    #[error("file with ID `{file_id}` does not exist")]
    InvalidFile { file_id: Uuid },
    #[error("{0}")]
    Error(#[from] CollectionFilePairServiceError),
}

pub struct CollectionFilePairService {
    db_pool: Pool<AsyncPgConnection>,
}

impl CollectionFilePairService {
    pub fn new(db_pool: Pool<AsyncPgConnection>) -> Arc<Self> {
        Arc::new(Self { db_pool })
    }

    /// Adds a file to a collection.
    pub async fn add_file_to_collection(
        &self,
        collection_id: Uuid,
        file_id: Uuid,
    ) -> Result<CollectionFilePair, AddFileToCollectionError> {
        use crate::db::schema;

        let db = &mut self
            .db_pool
            .get()
            .await
            .map_err(CollectionFilePairServiceError::from)?;
        let pair = diesel::insert_into(schema::collection_file_pairs::table)
            .values(CreatingCollectionFilePair {
                collection_id,
                file_id,
            })
            .returning((
                schema::collection_file_pairs::collection_id,
                schema::collection_file_pairs::file_id,
            ))
            .get_result::<CollectionFilePair>(db)
            .await;

        let pair = match pair {
            Ok(pair) => pair,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                return Err(AddFileToCollectionError::AlreadyExists {
                    collection_id,
                    file_id,
                })
            }
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                err,
            )) if err.constraint_name() == Some("collection_fk") => {
                return Err(AddFileToCollectionError::InvalidCollection { collection_id })
            }
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                err,
            )) if err.constraint_name() == Some("file_fk") => {
                return Err(AddFileToCollectionError::InvalidFile { file_id })
            }
            Err(err) => return Err(CollectionFilePairServiceError::from(err).into()),
        };

        Ok(pair)
    }

    /// Removes a file from a collection.
    /// Returns the pair that was removed, or `None` if no pair was found.
    pub async fn remove_file_from_collection(
        &self,
        collection_id: Uuid,
        file_id: Uuid,
    ) -> Result<Option<CollectionFilePair>, CollectionFilePairServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let pair = diesel::delete(
            schema::collection_file_pairs::dsl::collection_file_pairs.filter(
                schema::collection_file_pairs::collection_id
                    .eq(collection_id)
                    .and(schema::collection_file_pairs::file_id.eq(file_id)),
            ),
        )
        .returning((
            schema::collection_file_pairs::collection_id,
            schema::collection_file_pairs::file_id,
        ))
        .get_result::<CollectionFilePair>(db)
        .await
        .optional()?;

        Ok(pair)
    }

    /// Retrieves the IDs of the files in a collection, sorted in ascending order.
    pub async fn get_file_ids_in_collection(
        &self,
        collection_id: Uuid,
    ) -> Result<Vec<Uuid>, CollectionFilePairServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let file_ids = schema::collection_file_pairs::dsl::collection_file_pairs
            .select(schema::collection_file_pairs::file_id)
            .filter(schema::collection_file_pairs::collection_id.eq(collection_id))
            .order(schema::collection_file_pairs::file_id.asc())
            .load::<Uuid>(db)
            .await?;

        Ok(file_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{create_test_services, helpers};

    #[tokio::test]
    async fn test_add_file_to_collection() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();
        let file = helpers::create_file(&services, "file").await;

        let pair = collection_file_pair_service
            .add_file_to_collection(collection.id, file.id)
            .await
            .unwrap();

        assert_eq!(pair.collection_id, collection.id);
        assert_eq!(pair.file_id, file.id);
    }

    #[tokio::test]
    async fn test_add_file_to_collection_twice() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();
        let file = helpers::create_file(&services, "file").await;

        collection_file_pair_service
            .add_file_to_collection(collection.id, file.id)
            .await
            .unwrap();

        let result = collection_file_pair_service
            .add_file_to_collection(collection.id, file.id)
            .await;

        assert!(matches!(
            result,
            Err(AddFileToCollectionError::AlreadyExists {
                collection_id,
                file_id,
            }) if collection_id == collection.id && file_id == file.id
        ));
    }

    #[tokio::test]
    async fn test_add_unknown_file_to_collection() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();

        let unknown_file_id = Uuid::new_v4();
        let result = collection_file_pair_service
            .add_file_to_collection(collection.id, unknown_file_id)
            .await;

        assert!(matches!(
            result,
            Err(AddFileToCollectionError::InvalidFile { file_id }) if file_id == unknown_file_id
        ));
    }

    #[tokio::test]
    async fn test_add_file_to_unknown_collection() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let file = helpers::create_file(&services, "file").await;

        let unknown_collection_id = Uuid::new_v4();
        let result = collection_file_pair_service
            .add_file_to_collection(unknown_collection_id, file.id)
            .await;

        assert!(matches!(
            result,
            Err(AddFileToCollectionError::InvalidCollection { collection_id })
                if collection_id == unknown_collection_id
        ));
    }

    #[tokio::test]
    async fn test_remove_file_from_collection() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();
        let file = helpers::create_file(&services, "file").await;

        let pair = collection_file_pair_service
            .add_file_to_collection(collection.id, file.id)
            .await
            .unwrap();

        let removed_pair = collection_file_pair_service
            .remove_file_from_collection(collection.id, file.id)
            .await
            .unwrap();

        assert_eq!(removed_pair, Some(pair));

        let removed_again = collection_file_pair_service
            .remove_file_from_collection(collection.id, file.id)
            .await
            .unwrap();

        assert_eq!(removed_again, None);
    }

    #[tokio::test]
    async fn test_get_file_ids_in_collection() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();
        let other_collection = collection_service
            .create_collection("other collection", None)
            .await
            .unwrap();

        let first_file = helpers::create_file(&services, "first file").await;
        let second_file = helpers::create_file(&services, "second file").await;

        collection_file_pair_service
            .add_file_to_collection(collection.id, first_file.id)
            .await
            .unwrap();
        collection_file_pair_service
            .add_file_to_collection(collection.id, second_file.id)
            .await
            .unwrap();

        let mut expected = vec![first_file.id, second_file.id];
        expected.sort();

        let file_ids = collection_file_pair_service
            .get_file_ids_in_collection(collection.id)
            .await
            .unwrap();

        assert_eq!(file_ids, expected);

        let other_file_ids = collection_file_pair_service
            .get_file_ids_in_collection(other_collection.id)
            .await
            .unwrap();

        assert!(other_file_ids.is_empty());
    }
}
