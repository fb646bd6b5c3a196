//! Local and remote inspection commands.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::StackContext;
use crate::catalog::ProductCatalog;
use crate::error::StackError;
use crate::install::InstallDriver;
use crate::remote::{CatalogTransport, RemoteCatalog, RemoteCatalogFetcher};

/// One installed version and its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionStatus {
    pub version: String,
    pub tags: Vec<String>,
}

/// Installed state of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductStatus {
    pub product: String,
    pub installed: bool,
    pub current: Option<String>,
    pub versions: Vec<VersionStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub products: Vec<ProductStatus>,
}

impl StatusReport {
    /// Summarise `products` (every installed product when empty).
    pub fn from_catalog<S: AsRef<str>>(catalog: &ProductCatalog, products: &[S]) -> Self {
        let names: Vec<String> = if products.is_empty() {
            catalog.products().map(str::to_string).collect()
        } else {
            products.iter().map(|p| p.as_ref().to_string()).collect()
        };

        let products = names
            .into_iter()
            .map(|product| {
                let versions = catalog
                    .all_versions(&product)
                    .into_iter()
                    .map(|version| {
                        let tags = catalog
                            .tags_of_version(&product, &version)
                            .map(|tags| tags.iter().cloned().collect())
                            .unwrap_or_default();
                        VersionStatus { version, tags }
                    })
                    .collect::<Vec<_>>();
                ProductStatus {
                    installed: !versions.is_empty(),
                    current: catalog.latest_tagged(&product),
                    product,
                    versions,
                }
            })
            .collect();

        Self { products }
    }
}

/// Shows what is installed in the stack.
pub struct StatusCommand {
    ctx: StackContext,
}

impl StatusCommand {
    pub fn new(ctx: StackContext) -> Self {
        Self { ctx }
    }

    /// Report on `products`, or on everything installed when empty.
    pub fn execute<S: AsRef<str>>(&self, products: &[S]) -> Result<StatusReport, StackError> {
        let scratch = self.ctx.scratch_dir()?;
        let driver = self.ctx.open_driver(scratch.path())?;
        let catalog = driver.read_inventory().map_err(StackError::Inventory)?;
        Ok(StatusReport::from_catalog(&catalog, products))
    }
}

/// A tag published on the distribution server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteTag {
    pub tag: String,
    pub published: DateTime<Utc>,
    pub products: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteReport {
    pub tags: Vec<RemoteTag>,
}

impl RemoteReport {
    /// Tags oldest first, with the number of products each covers.
    pub fn from_catalog(remote: &RemoteCatalog) -> Self {
        let tags = remote
            .tags_by_date()
            .into_iter()
            .map(|(tag, published)| RemoteTag {
                tag: tag.to_string(),
                published,
                products: remote.products_tagged(tag).len(),
            })
            .collect();
        Self { tags }
    }
}

/// Lists tags on the distribution server that match the configured pattern.
pub struct RemoteCommand {
    ctx: StackContext,
}

impl RemoteCommand {
    pub fn new(ctx: StackContext) -> Self {
        Self { ctx }
    }

    pub fn execute(&self) -> Result<RemoteReport, StackError> {
        let transport = self.ctx.transport()?;
        self.execute_with(&transport)
    }

    pub fn execute_with<T: CatalogTransport>(
        &self,
        transport: &T,
    ) -> Result<RemoteReport, StackError> {
        let config = self.ctx.config();
        let remote =
            RemoteCatalogFetcher::new(transport, &config.pkgroot).fetch(&config.tag_pattern)?;
        Ok(RemoteReport::from_catalog(&remote))
    }
}
