//! [`InstallDriver`] backed by the `eups` command line tool.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::InstallDriver;
use super::command::run_checked;
use super::environment::Environment;
use super::inventory::parse_inventory;
use crate::catalog::ProductCatalog;
use crate::error::InstallationError;

/// Drives `eups --nolocks ...` against one stack directory.
#[derive(Debug, Clone)]
pub struct EupsDriver {
    stack_dir: PathBuf,
    program: PathBuf,
    environment: Environment,
}

impl EupsDriver {
    /// Create a driver that runs `eups` from the given environment's `PATH`.
    pub fn new(stack_dir: PathBuf, environment: Environment) -> Self {
        Self {
            stack_dir,
            program: PathBuf::from("eups"),
            environment,
        }
    }

    /// Use a specific `eups` executable.
    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    pub fn stack_dir(&self) -> &Path {
        &self.stack_dir
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Site startup file read by EUPS on every invocation.
    pub fn startup_path(&self) -> PathBuf {
        self.stack_dir
            .join("eups")
            .join("current")
            .join("site")
            .join("startup.py")
    }

    /// Append `line` to the site startup file.
    pub fn set_config(&self, line: &str) -> Result<(), InstallationError> {
        let path = self.startup_path();
        let startup_error = |source| InstallationError::Startup {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(startup_error)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(startup_error)?;
        writeln!(file, "{line}").map_err(startup_error)?;
        tracing::debug!(path = %path.display(), line, "Updated startup file");
        Ok(())
    }

    fn run(&self, args: &[&str]) -> Result<String, InstallationError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--nolocks").args(args).current_dir(&self.stack_dir);
        self.environment.apply(&mut cmd);
        run_checked(cmd)
    }
}

impl InstallDriver for EupsDriver {
    fn read_inventory(&self) -> Result<ProductCatalog, InstallationError> {
        let output = self.run(&["list", "--raw"])?;
        parse_inventory(&output)
    }

    fn install_distribution(
        &mut self,
        product: &str,
        version: Option<&str>,
        tag: Option<&str>,
    ) -> Result<(), InstallationError> {
        let mut args = vec!["distrib", "install", "--no-server-tags", product];
        if let Some(version) = version {
            args.push(version);
        }
        if let Some(tag) = tag {
            args.extend(["-t", tag]);
        }
        let output = self.run(&args)?;
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!("    {}", line);
        }
        Ok(())
    }

    fn declare_tag(
        &mut self,
        product: &str,
        version: &str,
        tag: &str,
    ) -> Result<(), InstallationError> {
        self.run(&["declare", "-t", tag, product, version])?;
        Ok(())
    }

    fn register_global_tag(&mut self, tag: &str) -> Result<(), InstallationError> {
        self.set_config(&format!("hooks.config.Eups.globalTags += [\"{tag}\"]"))
    }

    fn list_declared_tags(&self) -> Result<BTreeSet<String>, InstallationError> {
        let output = self.run(&["tags"])?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }
}
