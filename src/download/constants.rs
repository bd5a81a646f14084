//! Constants for the download module (chunking, accepted schemes).

/// Default size of the pieces the body is copied in (8 KiB).
///
/// Each piece produces exactly one progress event.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Smallest chunk size accepted by [`Downloader::with_chunk_size`](super::Downloader::with_chunk_size).
pub const MIN_CHUNK_SIZE: usize = 1;

/// URL schemes the transport can fetch.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["http", "https"];
