//! Writes extracted tables and their metadata to disk.

pub mod metadata;
pub mod table;

pub use metadata::{save_metadata, MetadataRecord};
pub use table::save_table;
