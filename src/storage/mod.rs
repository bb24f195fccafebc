pub mod archive_cache;

pub use archive_cache::ArchiveCache;
