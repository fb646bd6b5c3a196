//! Product catalog: product -> version -> tags.
//!
//! The same structure backs both the remote distribution server view and the
//! local installation view. Versions must be registered before tags can be
//! attached, so "no tags" and "no such version" stay distinguishable.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CatalogError;

/// Tag reserved for the most recently published installed release.
pub const CURRENT_TAG: &str = "current";

/// Session-active marker emitted by `eups list`; never tracked.
pub const SETUP_TAG: &str = "setup";

/// A single product and the tags attached to each of its versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    name: String,
    versions: BTreeMap<String, BTreeSet<String>>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `version` if it is not already known.
    pub fn add_version(&mut self, version: &str) {
        self.versions.entry(version.to_string()).or_default();
    }

    /// Attach `tag` to a registered version.
    ///
    /// # Panics
    /// Panics if `version` has not been registered with [`Product::add_version`].
    pub fn add_tag(&mut self, version: &str, tag: &str) {
        let tags = self
            .versions
            .get_mut(version)
            .unwrap_or_else(|| panic!("tag '{tag}' attached to unregistered version '{version}'"));
        tags.insert(tag.to_string());
    }

    /// All versions, or only those carrying `tag`.
    pub fn versions(&self, tag: Option<&str>) -> BTreeSet<String> {
        self.versions
            .iter()
            .filter(|(_, tags)| tag.is_none_or(|t| tags.contains(t)))
            .map(|(version, _)| version.clone())
            .collect()
    }

    /// Union of tags across every version.
    pub fn tags(&self) -> BTreeSet<String> {
        self.versions.values().flatten().cloned().collect()
    }

    pub fn tags_for_version(&self, version: &str) -> Option<&BTreeSet<String>> {
        self.versions.get(version)
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }
}

/// A collection of products keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    products: BTreeMap<String, Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `(product, version)` and, if given, attach `tag` to it.
    pub fn insert(&mut self, product: &str, version: &str, tag: Option<&str>) {
        let entry = self
            .products
            .entry(product.to_string())
            .or_insert_with(|| Product::new(product));
        entry.add_version(version);
        if let Some(tag) = tag {
            entry.add_tag(version, tag);
        }
    }

    pub fn product(&self, product: &str) -> Option<&Product> {
        self.products.get(product)
    }

    /// Product names in sorted order.
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn versions_tagged(&self, product: &str, tag: &str) -> BTreeSet<String> {
        self.products
            .get(product)
            .map(|p| p.versions(Some(tag)))
            .unwrap_or_default()
    }

    pub fn all_versions(&self, product: &str) -> BTreeSet<String> {
        self.products
            .get(product)
            .map(|p| p.versions(None))
            .unwrap_or_default()
    }

    /// Every tag applied to any version of `product`.
    pub fn tags_of(&self, product: &str) -> BTreeSet<String> {
        self.products
            .get(product)
            .map(Product::tags)
            .unwrap_or_default()
    }

    /// Tags applied to one specific version of `product`.
    pub fn tags_of_version(
        &self,
        product: &str,
        version: &str,
    ) -> Result<&BTreeSet<String>, CatalogError> {
        self.products
            .get(product)
            .and_then(|p| p.tags_for_version(version))
            .ok_or_else(|| CatalogError::NotFound {
                product: product.to_string(),
                version: version.to_string(),
            })
    }

    /// `(product, version)` pairs carrying `tag`, sorted by product then version.
    ///
    /// A product listed under one tag at several versions yields one pair per
    /// version.
    pub fn products_tagged(&self, tag: &str) -> Vec<(String, String)> {
        self.products
            .values()
            .flat_map(|p| {
                p.versions(Some(tag))
                    .into_iter()
                    .map(move |version| (p.name().to_string(), version))
            })
            .collect()
    }

    pub fn has_version(&self, product: &str, version: &str) -> bool {
        self.products
            .get(product)
            .is_some_and(|p| p.has_version(version))
    }

    /// Version of `product` currently tagged [`CURRENT_TAG`], if any.
    pub fn latest_tagged(&self, product: &str) -> Option<String> {
        self.versions_tagged(product, CURRENT_TAG)
            .into_iter()
            .next()
    }

    /// Attach `tag` to `version` and detach it from every other version of
    /// `product`, matching how EUPS resolves a tag to exactly one version.
    pub fn move_tag(&mut self, product: &str, version: &str, tag: &str) -> Result<(), CatalogError> {
        let entry = self
            .products
            .get_mut(product)
            .filter(|p| p.has_version(version))
            .ok_or_else(|| CatalogError::NotFound {
                product: product.to_string(),
                version: version.to_string(),
            })?;
        for tags in entry.versions.values_mut() {
            tags.remove(tag);
        }
        entry.add_tag(version, tag);
        Ok(())
    }
}
