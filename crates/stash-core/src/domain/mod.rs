//! Domain model (ids, file types, records, errors).

pub mod errors;
pub mod file_type;
pub mod ids;
pub mod record;

pub use self::errors::{ConvertError, StoreError};
pub use self::file_type::{FileType, SUPPORTED_EXTENSIONS};
pub use self::ids::{BlobId, ParseBlobIdError};
pub use self::record::{BlobInfo, BlobName, BlobRecord, Metadata, Ttl};
