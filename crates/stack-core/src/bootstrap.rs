//! Creation of a brand-new stack with `newinstall.sh`.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::StackConfig;
use crate::error::BootstrapError;
use crate::install::conda::Conda;
use crate::install::{EUPS_USERDATA, Environment, EupsDriver, run_checked};
use crate::remote::CatalogTransport;

/// Name the bootstrap script is saved under inside the new stack.
pub const NEWINSTALL_SCRIPT: &str = "newinstall.sh";

/// Startup line disabling EUPS lock files, which misbehave on shared stacks.
pub const DISABLE_LOCKS: &str = "hooks.config.site.lockDirectoryBase = None";

/// Bootstraps a stack directory that does not exist yet.
pub struct StackBootstrap<'a, T: CatalogTransport> {
    config: &'a StackConfig,
    transport: &'a T,
}

impl<'a, T: CatalogTransport> StackBootstrap<'a, T> {
    pub fn new(config: &'a StackConfig, transport: &'a T) -> Self {
        Self { config, transport }
    }

    /// Create `config.root`, run the bootstrap script in it, disable locking
    /// and add the configured conda packages.
    ///
    /// Fails without touching anything if the directory already exists.
    pub fn create(&self, userdata: &Path) -> Result<EupsDriver, BootstrapError> {
        let root = &self.config.root;
        if root.exists() {
            return Err(BootstrapError::AlreadyExists(root.clone()));
        }
        tracing::info!(root = %root.display(), "Bootstrapping new stack");
        std::fs::create_dir_all(root).map_err(|source| io_error(root, source))?;

        let script = self.download_script()?;
        self.run_script(&script)?;

        let environment = Environment::capture(root)?.with_var(
            EUPS_USERDATA,
            userdata.to_string_lossy().into_owned(),
        );
        let driver = EupsDriver::new(root.clone(), environment.clone());
        driver.set_config(DISABLE_LOCKS)?;

        let conda = Conda::new(&self.config.conda_env_name, environment);
        for package in &self.config.conda_packages {
            tracing::info!(package = %package.spec(), "Installing conda package");
            conda.install(package)?;
        }

        Ok(driver)
    }

    fn download_script(&self) -> Result<PathBuf, BootstrapError> {
        let response = self.transport.get(&self.config.newinstall_url)?;
        let path = self.config.root.join(NEWINSTALL_SCRIPT);
        std::fs::write(&path, response.body).map_err(|source| io_error(&path, source))?;
        Ok(path)
    }

    fn run_script(&self, script: &Path) -> Result<(), BootstrapError> {
        let mut cmd = Command::new("/bin/bash");
        cmd.arg(script)
            .arg("-b")
            .arg(format!("-{}", self.config.python_version))
            .current_dir(&self.config.root);
        Environment::inherited()
            .with_var("LSST_CONDA_ENV_NAME", &self.config.conda_env_name)
            .apply(&mut cmd);
        run_checked(cmd)?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BootstrapError {
    BootstrapError::Io {
        path: path.to_path_buf(),
        source,
    }
}
