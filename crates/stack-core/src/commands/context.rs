//! Stack context shared by the maintenance commands.
//!
//! StackContext owns the configuration and knows how to create the per-run
//! scratch directory, the EUPS driver for an existing stack, and the HTTP
//! transport for the distribution server.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::StackConfig;
use crate::error::{FetchError, StackError};
use crate::install::{EUPS_USERDATA, Environment, EupsDriver};
use crate::remote::HttpTransport;

/// Dependency container for one maintenance run.
#[derive(Debug, Clone)]
pub struct StackContext {
    config: StackConfig,
    /// Explicit `eups` executable (otherwise resolved from the stack's PATH)
    eups_program: Option<PathBuf>,
}

impl StackContext {
    pub fn new(config: StackConfig) -> Self {
        Self {
            config,
            eups_program: None,
        }
    }

    /// Use a specific `eups` executable instead of the one on the stack's PATH.
    pub fn with_eups_program(mut self, program: PathBuf) -> Self {
        self.eups_program = Some(program);
        self
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Fresh scratch directory for EUPS user data, removed on drop.
    ///
    /// Each run gets its own so concurrent runs never share a cache.
    pub fn scratch_dir(&self) -> Result<TempDir, StackError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shared-stack-");
        let dir = match &self.config.scratch_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        };
        dir.map_err(StackError::Scratch)
    }

    /// Driver for the existing stack at `root`, with EUPS user data kept in
    /// `userdata`.
    pub fn open_driver(&self, userdata: &Path) -> Result<EupsDriver, StackError> {
        let environment = Environment::capture(self.root())
            .map_err(StackError::Environment)?
            .with_var(EUPS_USERDATA, userdata.to_string_lossy().into_owned());
        if self.config.debug {
            tracing::debug!(environment = ?environment.vars(), "Stack environment");
        }
        Ok(self.driver(EupsDriver::new(self.root().to_path_buf(), environment)))
    }

    /// Apply the configured `eups` program to a driver.
    pub fn driver(&self, driver: EupsDriver) -> EupsDriver {
        match &self.eups_program {
            Some(program) => driver.with_program(program.clone()),
            None => driver,
        }
    }

    pub fn transport(&self) -> Result<HttpTransport, FetchError> {
        HttpTransport::new()
    }
}
