mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoCuratorStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        if err.is_write() {
            StorageError::write(err.to_string(), err)
        } else {
            StorageError::unavailable(err.to_string(), err)
        }
    }
}
