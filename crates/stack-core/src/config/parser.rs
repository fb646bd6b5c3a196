//! TOML parser with helpful error messages

use super::StackConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a config file with detailed error messages
pub fn parse_config(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse config content from string
pub fn parse_config_str(content: &str) -> Result<StackConfig> {
    let config: StackConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Point at the offending line when the TOML error carries a span
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {}", error);
    };
    let line = error_line(content, span.start);
    anyhow::anyhow!(
        "TOML parsing error at line {}:\n{}\n\nError: {}",
        line,
        excerpt(content, line),
        error.message()
    )
}

/// One-based line holding byte `offset`.
fn error_line(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// The lines around `line`, numbered, with `line` marked.
fn excerpt(content: &str, line: usize) -> String {
    let first = line.saturating_sub(2).max(1);
    content
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text))
        .skip(first - 1)
        .take_while(|(number, _)| *number <= line + 2)
        .map(|(number, text)| {
            let marker = if number == line { ">>>" } else { "   " };
            format!("{marker} {number:4} | {text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
