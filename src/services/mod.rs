pub mod backlog;
pub mod metadata_store;
pub mod tag_builder;

pub use backlog::select_backlog;
pub use metadata_store::MetadataStore;
pub use tag_builder::build_tags;
