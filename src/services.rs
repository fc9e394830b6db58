mod collection_file_pair_service;
mod collection_service;
mod file_service;
mod session_service;
mod staging_file_service;
mod tag_service;
mod user_directory;

pub use collection_file_pair_service::*;
pub use collection_service::*;
pub use file_service::*;
pub use session_service::*;
pub use staging_file_service::*;
pub use tag_service::*;
pub use user_directory::*;

use diesel_async::{pooled_connection::deadpool::Pool, AsyncPgConnection};
use std::sync::Arc;

/// The full operation surface of the schema store.
pub struct Services {
    pub collection_service: Arc<CollectionService>,
    pub file_service: Arc<FileService>,
    pub staging_file_service: Arc<StagingFileService>,
    pub tag_service: Arc<TagService>,
    pub collection_file_pair_service: Arc<CollectionFilePairService>,
    pub session_service: Arc<SessionService>,
    pub user_directory: Arc<dyn UserDirectory + Send + Sync>,
}

pub fn create_services(db_pool: Pool<AsyncPgConnection>) -> Services {
    let collection_service = CollectionService::new(db_pool.clone());
    let staging_file_service = StagingFileService::new(db_pool.clone());
    let file_service = FileService::new(db_pool.clone(), staging_file_service.clone());
    let tag_service = TagService::new(db_pool.clone());
    let collection_file_pair_service = CollectionFilePairService::new(db_pool.clone());
    let session_service = SessionService::new(db_pool.clone());
    let user_directory = PgUserDirectory::new(db_pool);

    Services {
        collection_service,
        file_service,
        staging_file_service,
        tag_service,
        collection_file_pair_service,
        session_service,
        user_directory,
    }
}
