//! Reconciliation of the local stack against the remote catalog.
//!
//! For each requested product, every remote tag not yet present locally is
//! installed and declared on all the products it covers. Afterwards the most
//! recently published tag that is installed becomes `current`. A tag that
//! fails is reported and skipped; it never stops the remaining work.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::CURRENT_TAG;
use crate::error::InstallationError;
use crate::install::{InstallDriver, LocalStack};
use crate::remote::RemoteCatalog;

/// A tag that could not be installed or declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFailure {
    pub tag: String,
    pub error: String,
}

/// Outcome of reconciling one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductReport {
    pub product: String,
    /// Remote tags that were missing locally at the start.
    pub candidates: Vec<String>,
    /// Candidates installed and declared successfully.
    pub installed: Vec<String>,
    pub failed: Vec<TagFailure>,
    /// Tag whose products now carry `current`.
    pub current: Option<String>,
    /// Set when declaring `current` failed.
    pub current_error: Option<String>,
}

impl ProductReport {
    fn new(product: &str) -> Self {
        Self {
            product: product.to_string(),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.current_error.is_none()
    }
}

/// Outcome of a full reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub products: Vec<ProductReport>,
}

impl ReconcileReport {
    /// Number of failed tag installs and `current` declarations.
    pub fn failure_count(&self) -> usize {
        self.products
            .iter()
            .map(|p| p.failed.len() + usize::from(p.current_error.is_some()))
            .sum()
    }

    pub fn installed_count(&self) -> usize {
        self.products.iter().map(|p| p.installed.len()).sum()
    }
}

/// Tags published remotely for `product` but absent from the local catalog.
pub fn candidate_tags<D: InstallDriver>(
    remote: &RemoteCatalog,
    local: &LocalStack<D>,
    product: &str,
) -> BTreeSet<String> {
    let installed = local.catalog().tags_of(product);
    remote
        .tags_of(product)
        .difference(&installed)
        .cloned()
        .collect()
}

/// Drives a [`LocalStack`] towards the state described by a [`RemoteCatalog`].
pub struct ReconciliationEngine<'a, D: InstallDriver> {
    remote: &'a RemoteCatalog,
    local: &'a mut LocalStack<D>,
}

impl<'a, D: InstallDriver> ReconciliationEngine<'a, D> {
    pub fn new(remote: &'a RemoteCatalog, local: &'a mut LocalStack<D>) -> Self {
        Self { remote, local }
    }

    /// Reconcile every product in order.
    pub fn reconcile<S: AsRef<str>>(&mut self, products: &[S]) -> ReconcileReport {
        let products = products
            .iter()
            .map(|product| self.reconcile_product(product.as_ref()))
            .collect();
        ReconcileReport { products }
    }

    /// Install missing tags for `product` and re-elect its `current` tag.
    pub fn reconcile_product(&mut self, product: &str) -> ProductReport {
        tracing::info!("Considering {}", product);
        let mut report = ProductReport::new(product);

        let server_tags = self.remote.tags_of(product);
        let candidates = candidate_tags(self.remote, self.local, product);
        report.candidates = candidates.iter().cloned().collect();

        for tag in &candidates {
            tracing::info!("  Installing {} tagged {}", product, tag);
            match self.install_tag(product, tag) {
                Ok(()) => report.installed.push(tag.clone()),
                Err(err) => {
                    tracing::warn!(
                        "  Failed to install {} tagged {}; skipping: {}",
                        product,
                        tag,
                        err
                    );
                    report.failed.push(TagFailure {
                        tag: tag.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let local_tags = self.local.catalog().tags_of(product);
        let available: BTreeSet<String> = server_tags.intersection(&local_tags).cloned().collect();
        if let Some(current) = self.remote.most_recent(&available) {
            tracing::info!("  Marking {} {} as current", product, current);
            report.current = Some(current.to_string());
            if let Err(err) = self.apply_tag(current, CURRENT_TAG) {
                tracing::warn!("  Failed to mark {} {} as current: {}", product, current, err);
                report.current_error = Some(err.to_string());
            }
        }

        report
    }

    fn install_tag(&mut self, product: &str, tag: &str) -> Result<(), InstallationError> {
        self.local.install_distribution(product, None, Some(tag))?;

        if !self.local.declared_tags()?.contains(tag) {
            tracing::info!("  Adding global tag {}", tag);
            self.local.register_global_tag(tag)?;
        }

        tracing::info!("  Applying tag {}", tag);
        self.apply_tag(tag, tag)
    }

    /// Declare `tag` on every product the remote lists under `release`.
    ///
    /// A tag holds one version per product, so when `release` lists a
    /// product more than once only its greatest version is declared.
    fn apply_tag(&mut self, release: &str, tag: &str) -> Result<(), InstallationError> {
        let mut targets: BTreeMap<String, String> = BTreeMap::new();
        for (product, version) in self.remote.products_tagged(release) {
            if let Some(previous) = targets.insert(product.clone(), version.clone()) {
                tracing::warn!(
                    "  {} lists {} at both {} and {}; declaring {}",
                    release,
                    product,
                    previous,
                    version,
                    version
                );
            }
        }
        for (product, version) in &targets {
            self.local.declare_tag(product, version, tag)?;
        }
        Ok(())
    }
}
