//! Full maintenance run: bootstrap if needed, fetch, reconcile.

use std::path::PathBuf;

use serde::Serialize;

use super::context::StackContext;
use crate::bootstrap::StackBootstrap;
use crate::engine::{ReconcileReport, ReconciliationEngine};
use crate::error::StackError;
use crate::install::LocalStack;
use crate::remote::{CatalogTransport, RemoteCatalogFetcher};

/// Result of an update run.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub root: PathBuf,
    /// The stack did not exist and was created by this run
    pub bootstrapped: bool,
    /// Number of remote tags matching the pattern
    pub remote_tags: usize,
    pub reconcile: ReconcileReport,
}

/// Brings the stack up to date with the distribution server.
pub struct UpdateCommand {
    ctx: StackContext,
}

impl UpdateCommand {
    pub fn new(ctx: StackContext) -> Self {
        Self { ctx }
    }

    /// Run against the configured HTTP server.
    pub fn execute(&self) -> Result<UpdateReport, StackError> {
        let transport = self.ctx.transport()?;
        self.execute_with(&transport)
    }

    /// Run using `transport` for every remote request.
    pub fn execute_with<T: CatalogTransport>(
        &self,
        transport: &T,
    ) -> Result<UpdateReport, StackError> {
        let config = self.ctx.config();
        let scratch = self.ctx.scratch_dir()?;

        let bootstrapped = !self.ctx.root().exists();
        let driver = if bootstrapped {
            let driver = StackBootstrap::new(config, transport).create(scratch.path())?;
            self.ctx.driver(driver)
        } else {
            self.ctx.open_driver(scratch.path())?
        };

        let remote =
            RemoteCatalogFetcher::new(transport, &config.pkgroot).fetch(&config.tag_pattern)?;
        let mut local = LocalStack::open(driver).map_err(StackError::Inventory)?;

        let reconcile = ReconciliationEngine::new(&remote, &mut local).reconcile(&config.products);
        tracing::info!(
            installed = reconcile.installed_count(),
            failures = reconcile.failure_count(),
            "Update finished"
        );

        Ok(UpdateReport {
            root: config.root.clone(),
            bootstrapped,
            remote_tags: remote.tags_by_date().len(),
            reconcile,
        })
    }
}
