//! Workspace snapshots for Vega.
//!
//! A [`Snapshot`] is an immutable, versioned view of the workspace files.
//! Everything derived from it is computed lazily and cached for the
//! snapshot's lifetime:
//! - parsed files ([`Snapshot::parse`]),
//! - package [`Metadata`] (import paths, module paths from `go.mod`,
//!   dependency edges),
//! - the type-checked [`vega_types::Program`] ([`Snapshot::program`]).
//!
//! Requests never mutate a snapshot. Synthetic re-checks go through
//! [`Snapshot::with_overlay`], which returns a new snapshot.

mod metadata;
mod snapshot;
mod source_db;

pub use metadata::{parse_module_path, KnownPackage, Metadata, PackageMetadata};
pub use snapshot::{Snapshot, SnapshotError};
pub use source_db::SourceDatabase;
