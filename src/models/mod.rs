pub mod asset;
pub mod batch;
pub mod tag_set;

pub use asset::{AssetRecord, Metadata};
pub use batch::{Batch, UploadItem};
pub use tag_set::{TagSet, MAX_TAGS};
