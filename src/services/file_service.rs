use super::staging_file_service::{StagingFileService, StagingFileServiceError};
use crate::db::models::{CreatingFile, File, StagingFile};
use diesel::{query_dsl::methods::LockingDsl, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{
    pooled_connection::deadpool::Pool, scoped_futures::ScopedFutureExt, AsyncConnection,
    AsyncPgConnection, RunQueryDsl,
};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum FileServiceError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("{0}")]
    StagingFile(#[from] StagingFileServiceError),
}

pub struct FileService {
    db_pool: Pool<AsyncPgConnection>,
    staging_file_service: Arc<StagingFileService>,
}

impl FileService {
    pub fn new(
        db_pool: Pool<AsyncPgConnection>,
        staging_file_service: Arc<StagingFileService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            db_pool,
            staging_file_service,
        })
    }

    /// Creates a new file.
    /// The metadata columns are nullable; callers that require them must
    /// enforce that before inserting.
    pub async fn create_file(
        &self,
        name: &str,
        mime: Option<&str>,
        size: Option<i64>,
        hash: Option<i64>,
    ) -> Result<File, FileServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let file = diesel::insert_into(schema::files::table)
            .values(CreatingFile {
                name,
                mime,
                size,
                hash,
            })
            .returning((
                schema::files::id,
                schema::files::name,
                schema::files::mime,
                schema::files::size,
                schema::files::hash,
                schema::files::created_at,
            ))
            .get_result::<File>(db)
            .await?;

        Ok(file)
    }

    /// Promotes a staging file into a permanent file.
    /// The staging row is locked, its name, mime and size are carried over
    /// and the row is removed, all within a single transaction.
    /// The hash stays unset; content hashing belongs to the upload pipeline.
    /// Returns the new file, or `None` if no staging file was found.
    pub async fn create_file_from_staging_file_id(
        &self,
        staging_file_id: Uuid,
    ) -> Result<Option<File>, FileServiceError> {
        use crate::db::schema;

        let staging_file_service = self.staging_file_service.clone();

        let db = &mut self.db_pool.get().await?;
        db.transaction(|db| {
            async move {
                let staging_file = schema::staging_files::dsl::staging_files
                    .filter(schema::staging_files::id.eq(staging_file_id))
                    .select((
                        schema::staging_files::id,
                        schema::staging_files::name,
                        schema::staging_files::mime,
                        schema::staging_files::size,
                        schema::staging_files::staged_at,
                    ))
                    .for_update()
                    .first::<StagingFile>(db)
                    .await
                    .optional()?;
                let staging_file = match staging_file {
                    Some(staging_file) => staging_file,
                    None => {
                        return Ok(None);
                    }
                };

                let file = diesel::insert_into(schema::files::table)
                    .values(CreatingFile {
                        name: &staging_file.name,
                        mime: staging_file.mime.as_deref(),
                        size: Some(staging_file.size),
                        hash: None,
                    })
                    .returning((
                        schema::files::id,
                        schema::files::name,
                        schema::files::mime,
                        schema::files::size,
                        schema::files::hash,
                        schema::files::created_at,
                    ))
                    .get_result::<File>(db)
                    .await?;

                staging_file_service
                    .remove_staging_file_by_id(staging_file.id, Some(db))
                    .await?;

                Ok(Some(file))
            }
            .scope_boxed()
        })
        .await
    }

    /// Removes a file by its ID.
    /// Returns the file that was removed, or `None` if no file was found.
    /// Tags and collection associations of the file are removed with it.
    pub async fn remove_file_by_id(&self, file_id: Uuid) -> Result<Option<File>, FileServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let file = diesel::delete(
            schema::files::dsl::files.filter(schema::files::id.eq(file_id)),
        )
        .returning((
            schema::files::id,
            schema::files::name,
            schema::files::mime,
            schema::files::size,
            schema::files::hash,
            schema::files::created_at,
        ))
        .get_result::<File>(db)
        .await
        .optional()?;

        Ok(file)
    }

    /// Retrieves a file by its ID.
    pub async fn get_file_by_id(&self, file_id: Uuid) -> Result<Option<File>, FileServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let file = schema::files::dsl::files
            .filter(schema::files::id.eq(file_id))
            .select((
                schema::files::id,
                schema::files::name,
                schema::files::mime,
                schema::files::size,
                schema::files::hash,
                schema::files::created_at,
            ))
            .first::<File>(db)
            .await
            .optional()?;

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::create_test_services;

    #[tokio::test]
    async fn test_create_file() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let file_service = &services.file_service;

        let file = file_service
            .create_file("file", Some("text/plain"), Some(1024), Some(0x1234))
            .await
            .unwrap();

        assert_eq!(file.name, "file");
        assert_eq!(file.mime.as_deref(), Some("text/plain"));
        assert_eq!(file.size, Some(1024));
        assert_eq!(file.hash, Some(0x1234));

        let raw_file = file_service.get_file_by_id(file.id).await.unwrap().unwrap();

        assert_eq!(raw_file, file);
    }

    #[tokio::test]
    async fn test_create_file_without_metadata() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let file_service = &services.file_service;

        let file = file_service
            .create_file("bare file", None, None, None)
            .await
            .unwrap();

        assert_eq!(file.mime, None);
        assert_eq!(file.size, None);
        assert_eq!(file.hash, None);
    }

    #[tokio::test]
    async fn test_remove_file_cascades_tags_and_associations() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let collection_service = &services.collection_service;
        let collection_file_pair_service = &services.collection_file_pair_service;
        let file_service = &services.file_service;
        let tag_service = &services.tag_service;

        let collection = collection_service
            .create_collection("collection", None)
            .await
            .unwrap();
        let file = file_service
            .create_file("file", Some("text/plain"), Some(4), Some(1))
            .await
            .unwrap();

        collection_file_pair_service
            .add_file_to_collection(collection.id, file.id)
            .await
            .unwrap();
        tag_service.add_tag_to_file("red", file.id).await.unwrap();
        tag_service.add_tag_to_file("blue", file.id).await.unwrap();

        let removed_file = file_service.remove_file_by_id(file.id).await.unwrap();

        assert_eq!(removed_file, Some(file.clone()));

        let tags = tag_service.get_tags_by_file_id(file.id).await.unwrap();
        assert!(tags.is_empty());

        let file_ids = collection_file_pair_service
            .get_file_ids_in_collection(collection.id)
            .await
            .unwrap();
        assert!(file_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_file_from_staging_file() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let file_service = &services.file_service;
        let staging_file_service = &services.staging_file_service;

        let staging_file = staging_file_service
            .create_staging_file("staged", Some("image/png"), 2048)
            .await
            .unwrap();

        let file = file_service
            .create_file_from_staging_file_id(staging_file.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(file.name, staging_file.name);
        assert_eq!(file.mime, staging_file.mime);
        assert_eq!(file.size, Some(staging_file.size));
        assert_eq!(file.hash, None);

        // the staging row is consumed by the promotion
        let raw_staging_file = staging_file_service
            .get_staging_file_by_id(staging_file.id)
            .await
            .unwrap();

        assert_eq!(raw_staging_file, None);
    }

    #[tokio::test]
    async fn test_create_file_from_unknown_staging_file() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let file_service = &services.file_service;

        let file = file_service
            .create_file_from_staging_file_id(Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(file, None);
    }
}
