//! Tag index and version-list parsing.
//!
//! The server publishes `<base>/tags` as an HTML directory listing whose
//! anchors name `<tag>.list` files. Each list file looks like:
//!
//! ```text
//! EUPS distribution w_2020_20 version list. Version 1.0
//! #name            flavor    version
//! #-----------------------------------
//! afw              generic   19.0.0-12-g2b6b8d3+1
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::FetchError;

/// Suffix of per-tag version list files.
pub const LIST_SUFFIX: &str = ".list";

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>\s*([^<]*?)\s*</a>"#)
        .expect("anchor pattern is valid")
});

/// A `<tag>.list` link found in the tag index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLink {
    pub tag: String,
    pub href: String,
}

/// Compile a tag pattern with prefix-match semantics.
///
/// The pattern must match at the start of the list file name but may leave a
/// suffix unmatched, so `w_2020` selects `w_2020_18.list`.
pub fn compile_tag_pattern(pattern: &str) -> Result<Regex, FetchError> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|source| FetchError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Extract the tag links whose text ends in `.list` and matches `pattern`.
pub fn parse_tag_index(html: &str, pattern: &Regex) -> Vec<TagLink> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            let href = caps.get(1)?.as_str();
            let text = caps.get(2)?.as_str();
            let tag = text.strip_suffix(LIST_SUFFIX)?;
            if tag.is_empty() || !pattern.is_match(text) {
                return None;
            }
            Some(TagLink {
                tag: tag.to_string(),
                href: href.to_string(),
            })
        })
        .collect()
}

/// Parse a version list into `(product, version)` pairs.
///
/// The distribution header, `#` comments and blank lines are skipped. Any
/// other line must have exactly three columns; the flavor column is dropped.
pub fn parse_version_list(tag: &str, body: &str) -> Result<Vec<(String, String)>, FetchError> {
    let header = format!("EUPS distribution {tag} version list");
    let mut entries = Vec::new();

    for (index, line) in body.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.contains(&header) {
            continue;
        }

        let columns: Vec<&str> = trimmed.split_whitespace().collect();
        let &[product, _flavor, version] = columns.as_slice() else {
            return Err(FetchError::MalformedLine {
                tag: tag.to_string(),
                line_number: index + 1,
                line: line.to_string(),
            });
        };
        entries.push((product.to_string(), version.to_string()));
    }

    Ok(entries)
}
