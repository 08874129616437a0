mod error;
mod traits;

pub mod local;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use traits::{BlobStore, StoredObject};
