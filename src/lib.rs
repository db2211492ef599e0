//! CodeVault: a local, transactional, version-controlled store for
//! multi-file coding projects.

pub mod api;
pub mod archive;
pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod models;
pub mod templates;

pub use error::{VaultError, VaultResult};
