//! Error taxonomy for stack maintenance.
//!
//! Fetch and bootstrap errors end a run. Installation errors are scoped to a
//! single (product, tag) unit of work and are reported by the engine instead
//! of propagated.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Contract violations when querying a [`crate::catalog::ProductCatalog`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("version '{version}' of product '{product}' is not registered")]
    NotFound { product: String, version: String },
}

/// Failures while building the remote catalog.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to request {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("no Last-Modified header in response from {url}")]
    MissingLastModified { url: String },

    #[error("invalid Last-Modified value '{value}' from {url}")]
    InvalidLastModified { url: String, value: String },

    #[error("malformed line {line_number} in version list for tag '{tag}': '{line}'")]
    MalformedLine {
        tag: String,
        line_number: usize,
        line: String,
    },

    #[error("invalid tag pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A local command (eups, conda, bash) that could not run or exited nonzero.
#[derive(Debug, Error)]
pub enum InstallationError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {status}")]
    Failed {
        command: String,
        status: ExitStatus,
        output: String,
    },

    #[error("unexpected inventory line '{line}'")]
    Inventory { line: String },

    #[error("failed to update startup file {path}: {source}")]
    Startup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InstallationError {
    /// Captured stdout of a failed command, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Failures while creating a brand-new stack.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("stack directory already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Installation(#[from] InstallationError),
}

/// Errors that abort a maintenance run.
#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error("failed to load stack environment: {0}")]
    Environment(#[source] InstallationError),

    #[error("failed to read local inventory: {0}")]
    Inventory(#[source] InstallationError),

    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
}
