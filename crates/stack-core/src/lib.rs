//! Shared Stack Core Library
//!
//! Maintains a shared EUPS software stack: fetches the tags published on a
//! distribution server, installs the ones missing locally, and keeps the
//! `current` tag on the most recently published installed release.

pub mod bootstrap;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod install;
pub mod remote;

/// Re-exports of commonly used types
pub mod prelude {
    pub use crate::catalog::{CURRENT_TAG, Product, ProductCatalog};
    pub use crate::commands::{StackContext, StatusCommand, UpdateCommand};
    pub use crate::config::StackConfig;
    pub use crate::engine::{ProductReport, ReconcileReport, ReconciliationEngine};
    pub use crate::error::{CatalogError, FetchError, InstallationError, StackError};
    pub use crate::install::{EupsDriver, InstallDriver, LocalStack};
    pub use crate::remote::{CatalogTransport, HttpTransport, RemoteCatalog, RemoteCatalogFetcher};
}
