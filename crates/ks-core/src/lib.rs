//! ks-core: shared types, errors, configuration, and media-path primitives.
//!
//! This crate is the foundational dependency for the other ks-* crates,
//! providing a unified error type, application configuration, the media
//! MIME allow-list, HTTP byte-range parsing, and storage-root path
//! resolution.

pub mod config;
pub mod error;
pub mod media;
pub mod range;
pub mod storage;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use media::{MediaKind, MimeTable};
pub use range::ByteRange;
pub use storage::StorageRoot;
