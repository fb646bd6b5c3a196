//! Parsing of `eups list --raw` output into a local catalog.

use crate::catalog::{ProductCatalog, SETUP_TAG};
use crate::error::InstallationError;

/// Build a catalog from `product|version|tag1:tag2` lines.
///
/// Every listed version is registered even when its only tag is `setup`,
/// which is dropped.
pub fn parse_inventory(output: &str) -> Result<ProductCatalog, InstallationError> {
    let mut catalog = ProductCatalog::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('|');
        let (Some(product), Some(version), Some(tags), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(InstallationError::Inventory {
                line: line.to_string(),
            });
        };

        catalog.insert(product, version, None);
        for tag in tags.split(':').filter(|t| !t.is_empty() && *t != SETUP_TAG) {
            catalog.insert(product, version, Some(tag));
        }
    }

    Ok(catalog)
}
