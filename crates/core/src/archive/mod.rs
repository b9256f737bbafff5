//! Artifact packaging and delivery.
//!
//! Batch output is packed into a single zip with [`build_archive`]. Both
//! archives and single-item files are handed out as an [`ArtifactStream`],
//! which owns a [`CleanupGuard`] that deletes the artifacts once the stream
//! is gone.

mod builder;
mod guard;
mod stream;

pub use builder::{build_archive, ArchiveSummary};
pub use guard::CleanupGuard;
pub use stream::ArtifactStream;
