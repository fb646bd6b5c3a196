//! Build a [`RemoteCatalog`] from the distribution server.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use super::index::{compile_tag_pattern, parse_tag_index, parse_version_list};
use super::transport::CatalogTransport;
use crate::catalog::ProductCatalog;
use crate::error::FetchError;

/// Products published on the server plus the publication date of each tag.
#[derive(Debug, Clone, Default)]
pub struct RemoteCatalog {
    catalog: ProductCatalog,
    tag_dates: BTreeMap<String, DateTime<Utc>>,
}

impl RemoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tag's publication date.
    pub fn add_tag(&mut self, tag: &str, published: DateTime<Utc>) {
        self.tag_dates.insert(tag.to_string(), published);
    }

    /// Record that `tag` covers `product` at `version`.
    pub fn insert(&mut self, product: &str, version: &str, tag: &str) {
        self.catalog.insert(product, version, Some(tag));
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn tags_of(&self, product: &str) -> BTreeSet<String> {
        self.catalog.tags_of(product)
    }

    pub fn products_tagged(&self, tag: &str) -> Vec<(String, String)> {
        self.catalog.products_tagged(tag)
    }

    pub fn tag_date(&self, tag: &str) -> Option<DateTime<Utc>> {
        self.tag_dates.get(tag).copied()
    }

    /// Every fetched tag with its publication date, oldest first.
    pub fn tags_by_date(&self) -> Vec<(&str, DateTime<Utc>)> {
        let mut tags: Vec<_> = self
            .tag_dates
            .iter()
            .map(|(tag, date)| (tag.as_str(), *date))
            .collect();
        tags.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        tags
    }

    /// The most recently published tag among `tags`.
    ///
    /// Equal publication dates resolve to the lexicographically greatest tag
    /// name. Tags with no recorded date are ignored.
    pub fn most_recent<'a, I>(&self, tags: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        tags.into_iter()
            .filter_map(|tag| self.tag_date(tag).map(|date| (date, tag.as_str())))
            .max()
            .map(|(_, tag)| tag)
    }
}

/// Fetches the tag index and version lists from `<base>/tags`.
pub struct RemoteCatalogFetcher<'a, T: CatalogTransport> {
    transport: &'a T,
    base_url: String,
}

impl<'a, T: CatalogTransport> RemoteCatalogFetcher<'a, T> {
    pub fn new(transport: &'a T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn tags_url(&self) -> String {
        format!("{}/tags", self.base_url)
    }

    /// Fetch every tag whose list file name matches `pattern`.
    ///
    /// Any transport failure or malformed list aborts the whole fetch.
    pub fn fetch(&self, pattern: &str) -> Result<RemoteCatalog, FetchError> {
        let pattern = compile_tag_pattern(pattern)?;
        let index_url = self.tags_url();
        let index = self.transport.get(&index_url)?;
        let links = parse_tag_index(&index.body, &pattern);
        tracing::info!(count = links.len(), url = %index_url, "Matched remote tags");

        let mut remote = RemoteCatalog::new();
        for link in links {
            let url = format!("{}/{}", index_url, link.href);
            let response = self.transport.get(&url)?;

            let raw_date = response
                .last_modified
                .ok_or_else(|| FetchError::MissingLastModified { url: url.clone() })?;
            let published = parse_last_modified(&raw_date).ok_or_else(|| {
                FetchError::InvalidLastModified {
                    url: url.clone(),
                    value: raw_date.clone(),
                }
            })?;
            remote.add_tag(&link.tag, published);

            let entries = parse_version_list(&link.tag, &response.body)?;
            tracing::debug!(tag = %link.tag, %published, products = entries.len(), "Fetched tag");
            for (product, version) in entries {
                remote.insert(&product, &version, &link.tag);
            }
        }

        Ok(remote)
    }
}

/// Parse an HTTP `Last-Modified` value such as `Wed, 13 May 2020 05:41:51 GMT`.
pub fn parse_last_modified(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}
