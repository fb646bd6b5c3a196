//! Local installation: inventory, mutations, and the cached local catalog.
//!
//! [`InstallDriver`] is the seam to the package manager. [`LocalStack`] wraps
//! a driver together with the catalog it last reported and rebuilds that
//! catalog after every install, so callers never query stale state.

mod command;
pub mod conda;
mod environment;
mod eups;
mod inventory;

use std::collections::BTreeSet;

pub use environment::{EUPS_USERDATA, Environment, LOAD_SCRIPT};
pub use eups::EupsDriver;
pub use inventory::parse_inventory;

pub(crate) use command::run_checked;

use crate::catalog::ProductCatalog;
use crate::error::InstallationError;

/// Side-effecting operations against a local installation.
pub trait InstallDriver {
    /// List every installed `(product, version, tags)` triple.
    fn read_inventory(&self) -> Result<ProductCatalog, InstallationError>;

    /// Install `product`, optionally pinned to a version and/or tag.
    fn install_distribution(
        &mut self,
        product: &str,
        version: Option<&str>,
        tag: Option<&str>,
    ) -> Result<(), InstallationError>;

    /// Attach `tag` to an installed `(product, version)`.
    fn declare_tag(&mut self, product: &str, version: &str, tag: &str)
    -> Result<(), InstallationError>;

    /// Make `tag` usable for declarations.
    fn register_global_tag(&mut self, tag: &str) -> Result<(), InstallationError>;

    /// Tag names currently usable for declarations.
    fn list_declared_tags(&self) -> Result<BTreeSet<String>, InstallationError>;
}

/// An [`InstallDriver`] plus the local catalog it last reported.
#[derive(Debug)]
pub struct LocalStack<D: InstallDriver> {
    driver: D,
    catalog: ProductCatalog,
}

impl<D: InstallDriver> LocalStack<D> {
    /// Read the initial inventory from `driver`.
    pub fn open(driver: D) -> Result<Self, InstallationError> {
        let catalog = driver.read_inventory()?;
        Ok(Self { driver, catalog })
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Discard the cached catalog and re-read the inventory.
    pub fn refresh(&mut self) -> Result<(), InstallationError> {
        self.catalog = self.driver.read_inventory()?;
        Ok(())
    }

    /// Install and then refresh the local catalog.
    pub fn install_distribution(
        &mut self,
        product: &str,
        version: Option<&str>,
        tag: Option<&str>,
    ) -> Result<(), InstallationError> {
        self.driver.install_distribution(product, version, tag)?;
        self.refresh()
    }

    /// Declare `tag` on `(product, version)` if that version is installed.
    ///
    /// Returns `false` without calling the driver when the version is not
    /// installed or already carries `tag`.
    pub fn declare_tag(
        &mut self,
        product: &str,
        version: &str,
        tag: &str,
    ) -> Result<bool, InstallationError> {
        let Ok(tags) = self.catalog.tags_of_version(product, version) else {
            tracing::debug!(product, version, tag, "Not installed; skipping declaration");
            return Ok(false);
        };
        if tags.contains(tag) {
            return Ok(false);
        }

        self.driver.declare_tag(product, version, tag)?;
        // Registered above, so the move cannot miss.
        let _ = self.catalog.move_tag(product, version, tag);
        Ok(true)
    }

    pub fn register_global_tag(&mut self, tag: &str) -> Result<(), InstallationError> {
        self.driver.register_global_tag(tag)
    }

    pub fn declared_tags(&self) -> Result<BTreeSet<String>, InstallationError> {
        self.driver.list_declared_tags()
    }
}
