//! Domain models for CodeVault.
//!
//! # Core Concepts
//!
//! - [`Project`]: An independently versioned collection of files with its own
//!   undo/redo history and framework tag.
//! - [`ProjectFile`]: The *current* content of one path inside a project.
//! - [`Snapshot`]: An immutable, ordered copy of a project's entire file set.
//!   Snapshots of one project form a contiguous chain `0, 1, 2, …`, and
//!   [`Project::snapshot_index`] points at the one matching the live files.
//! - [`Template`]: Read-only seed used to create a project.

mod file;
mod project;
mod snapshot;
mod template;

pub use file::*;
pub use project::*;
pub use snapshot::*;
pub use template::*;
