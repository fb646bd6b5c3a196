//! Maintenance configuration.
//!
//! Read from `config.toml` (by default under the user config directory,
//! e.g. `~/.config/shared-stack/config.toml`). Every key is optional; command
//! line flags override whatever the file sets.

mod parser;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::install::conda::CondaPackage;
use crate::remote::compile_tag_pattern;

pub use parser::{parse_config, parse_config_str};

pub const DEFAULT_ROOT: &str = "/ssd/lsstsw/stack";
pub const DEFAULT_PKGROOT: &str = "https://eups.lsst.codes/stack/src";
pub const DEFAULT_TAG_PATTERN: &str = r"(sims_)?w_2020_(18|19|[2-5]\d)";
pub const DEFAULT_NEWINSTALL_URL: &str =
    "https://raw.githubusercontent.com/lsst/lsst/master/scripts/newinstall.sh";
pub const DEFAULT_CONDA_ENV_NAME: &str = "lsst-scipipe";

const DEFAULT_PRODUCTS: [&str; 2] = ["lsst_sims", "lsst_distrib"];

const DEFAULT_CONDA_PACKAGES: [&str; 15] = [
    "jupyter",
    "pep8",
    "pyflakes",
    "panel",
    "holoviews",
    "hvplot",
    "bokeh",
    "pyviz_comms",
    "fastparquet",
    "numba",
    "datashaderpyct",
    "dask-jobqueue",
    "cx_Oracle",
    "ipdb",
    "psycopg2",
];

/// Everything a maintenance run needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Stack directory to create or update
    pub root: PathBuf,

    /// Distribution server base URL
    pub pkgroot: String,

    /// Top-level products to keep installed
    pub products: Vec<String>,

    /// Only tags whose list file name matches this prefix pattern are fetched
    pub tag_pattern: String,

    /// Parent directory for the per-run scratch directory (system temp if unset)
    pub scratch_dir: Option<PathBuf>,

    /// Log commands and their environment
    pub debug: bool,

    /// Bootstrap script used for brand-new stacks
    pub newinstall_url: String,

    /// Python major version passed to the bootstrap script
    pub python_version: String,

    /// Conda environment created by the bootstrap script
    pub conda_env_name: String,

    /// Extra conda packages added after bootstrap
    pub conda_packages: Vec<CondaPackage>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            pkgroot: DEFAULT_PKGROOT.to_string(),
            products: DEFAULT_PRODUCTS.iter().map(|p| p.to_string()).collect(),
            tag_pattern: DEFAULT_TAG_PATTERN.to_string(),
            scratch_dir: None,
            debug: false,
            newinstall_url: DEFAULT_NEWINSTALL_URL.to_string(),
            python_version: "3".to_string(),
            conda_env_name: DEFAULT_CONDA_ENV_NAME.to_string(),
            conda_packages: DEFAULT_CONDA_PACKAGES
                .iter()
                .map(|name| CondaPackage::new(*name))
                .collect(),
        }
    }
}

impl StackConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("shared-stack").join("config.toml"))
    }

    /// Load `path`, or defaults when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        parse_config(path)
    }

    /// Load from the default location, or defaults when there is none.
    pub fn load_default() -> anyhow::Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.pkgroot)
            .with_context(|| format!("Invalid pkgroot URL: {}", self.pkgroot))?;
        url::Url::parse(&self.newinstall_url)
            .with_context(|| format!("Invalid newinstall_url: {}", self.newinstall_url))?;
        compile_tag_pattern(&self.tag_pattern)?;
        if self.products.is_empty() {
            anyhow::bail!("At least one product must be configured");
        }
        if self.products.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("Product names must not be empty");
        }
        Ok(())
    }
}
