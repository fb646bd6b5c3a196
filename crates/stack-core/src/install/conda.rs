//! Convenience packages installed into the stack's conda environment.

use std::process::Command;

use serde::{Deserialize, Serialize};

use super::command::run_checked;
use super::environment::Environment;
use crate::error::InstallationError;

/// A conda package, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondaPackage {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl CondaPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
        }
    }

    /// `name` or `name=version` as conda expects it.
    pub fn spec(&self) -> String {
        match &self.version {
            Some(version) => format!("{}={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Runs `conda` inside one named environment.
#[derive(Debug, Clone)]
pub struct Conda {
    env_name: String,
    environment: Environment,
}

impl Conda {
    pub fn new(env_name: impl Into<String>, environment: Environment) -> Self {
        Self {
            env_name: env_name.into(),
            environment,
        }
    }

    fn arguments(&self, action: &str, package: &CondaPackage) -> Vec<String> {
        let mut args = vec![
            action.to_string(),
            "--name".to_string(),
            self.env_name.clone(),
            "--yes".to_string(),
        ];
        if action == "install" {
            args.insert(1, "--no-update-deps".to_string());
        }
        args.push(package.spec());
        args
    }

    /// Run `conda <action>` ("install", "remove", ...) on `package`.
    pub fn run(&self, action: &str, package: &CondaPackage) -> Result<String, InstallationError> {
        let mut cmd = Command::new("conda");
        cmd.args(self.arguments(action, package));
        self.environment.apply(&mut cmd);
        run_checked(cmd)
    }

    pub fn install(&self, package: &CondaPackage) -> Result<String, InstallationError> {
        self.run("install", package)
    }
}
