//! Remote distribution server access.
//!
//! Fetches the tag index, filters it by pattern, and loads each tag's version
//! list into a [`RemoteCatalog`] along with its publication date.

mod fetcher;
mod index;
mod transport;

pub use fetcher::{RemoteCatalog, RemoteCatalogFetcher, parse_last_modified};
pub use index::{LIST_SUFFIX, TagLink, compile_tag_pattern, parse_tag_index, parse_version_list};
pub use transport::{CatalogTransport, HttpTransport, TransportResponse};
