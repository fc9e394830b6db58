use crate::db::models::{CreatingTag, Tag};
use diesel::{BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection, RunQueryDsl};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TagServiceError {
    #[error("database pool error: {0}")]
    Pool(#[from] diesel_async::pooled_connection::deadpool::PoolError),
    #[error("diesel error: {0}")]
    Diesel(#[from] diesel::result::Error),
}

#[derive(Error, Debug)]
pub enum AddTagToFileError {
    #[error("file with ID `{file_id}` already has tag `{name}`")]
    DuplicateTag { name: String, file_id: Uuid },
    #[error("file with ID `{file_id}` does not exist")]
    UnknownFile { file_id: Uuid },
    #[error("{0}")]
    Error(#[from] TagServiceError),
}

pub struct TagService {
    db_pool: Pool<AsyncPgConnection>,
}

impl TagService {
    pub fn new(db_pool: Pool<AsyncPgConnection>) -> Arc<Self> {
        Arc::new(Self { db_pool })
    }

    /// Adds a tag to a file.
    pub async fn add_tag_to_file(
        &self,
        name: &str,
        file_id: Uuid,
    ) -> Result<Tag, AddTagToFileError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await.map_err(TagServiceError::from)?;
        let tag = diesel::insert_into(schema::tags::table)
            .values(CreatingTag { name, file_id })
            .returning((schema::tags::name, schema::tags::file_id))
            .get_result::<Tag>(db)
            .await;

        let tag = match tag {
            Ok(tag) => tag,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                return Err(AddTagToFileError::DuplicateTag {
                    name: name.to_owned(),
                    file_id,
                })
            }
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                err,
            )) if err.constraint_name() == Some("tags_file_fk") => {
                return Err(AddTagToFileError::UnknownFile { file_id })
            }
            Err(err) => return Err(TagServiceError::from(err).into()),
        };

        Ok(tag)
    }

    /// Removes a tag from a file.
    /// Returns the tag that was removed, or `None` if no tag was found.
    pub async fn remove_tag_from_file(
        &self,
        name: &str,
        file_id: Uuid,
    ) -> Result<Option<Tag>, TagServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let tag = diesel::delete(
            schema::tags::dsl::tags.filter(
                schema::tags::name
                    .eq(name)
                    .and(schema::tags::file_id.eq(file_id)),
            ),
        )
        .returning((schema::tags::name, schema::tags::file_id))
        .get_result::<Tag>(db)
        .await
        .optional()?;

        Ok(tag)
    }

    /// Retrieves the tag names of a file, sorted in ascending order.
    pub async fn get_tags_by_file_id(&self, file_id: Uuid) -> Result<Vec<String>, TagServiceError> {
        use crate::db::schema;

        let db = &mut self.db_pool.get().await?;
        let tags = schema::tags::dsl::tags
            .select(schema::tags::name)
            .filter(schema::tags::file_id.eq(file_id))
            .order(schema::tags::name.asc())
            .load::<String>(db)
            .await?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{create_test_services, helpers};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_tag_round_trip() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let tag_service = &services.tag_service;

        let file = helpers::create_file(&services, "file").await;

        tag_service.add_tag_to_file("red", file.id).await.unwrap();
        tag_service.add_tag_to_file("blue", file.id).await.unwrap();

        let tags = tag_service.get_tags_by_file_id(file.id).await.unwrap();

        let tags = tags.into_iter().collect::<HashSet<_>>();
        let expected = ["red".to_owned(), "blue".to_owned()]
            .into_iter()
            .collect::<HashSet<_>>();

        assert_eq!(tags, expected);
    }

    #[tokio::test]
    async fn test_add_duplicate_tag() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let tag_service = &services.tag_service;

        let file = helpers::create_file(&services, "file").await;

        tag_service.add_tag_to_file("red", file.id).await.unwrap();

        let result = tag_service.add_tag_to_file("red", file.id).await;

        assert!(matches!(
            result,
            Err(AddTagToFileError::DuplicateTag { ref name, file_id })
                if name == "red" && file_id == file.id
        ));

        // the same name on a different file is still fine
        let other_file = helpers::create_file(&services, "other file").await;
        tag_service
            .add_tag_to_file("red", other_file.id)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_tag_to_unknown_file() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let tag_service = &services.tag_service;

        let unknown_file_id = Uuid::new_v4();
        let result = tag_service.add_tag_to_file("red", unknown_file_id).await;

        assert!(matches!(
            result,
            Err(AddTagToFileError::UnknownFile { file_id }) if file_id == unknown_file_id
        ));
    }

    #[tokio::test]
    async fn test_remove_tag_from_file() {
        let (services, _db_pool, _database_dropper) = create_test_services().await;
        let tag_service = &services.tag_service;

        let file = helpers::create_file(&services, "file").await;

        let tag = tag_service.add_tag_to_file("red", file.id).await.unwrap();

        let removed_tag = tag_service
            .remove_tag_from_file("red", file.id)
            .await
            .unwrap();

        assert_eq!(removed_tag, Some(tag));

        let removed_again = tag_service
            .remove_tag_from_file("red", file.id)
            .await
            .unwrap();

        assert_eq!(removed_again, None);
    }
}
