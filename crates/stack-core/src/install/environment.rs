//! Capture of the environment a stack's `loadLSST.bash` establishes.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use super::command::run_checked;
use crate::error::InstallationError;

/// Script at the stack root that sets up EUPS and conda.
pub const LOAD_SCRIPT: &str = "loadLSST.bash";

/// Variable pointing EUPS at a private cache directory.
pub const EUPS_USERDATA: &str = "EUPS_USERDATA";

/// A complete process environment used for every stack command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn inherited() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Source `<stack_dir>/loadLSST.bash` in bash and record the result.
    pub fn capture(stack_dir: &Path) -> Result<Self, InstallationError> {
        let script = stack_dir.join(LOAD_SCRIPT);
        let mut cmd = Command::new("bash");
        cmd.arg("-c")
            .arg(format!("source '{}' && env -0", script.display()))
            .current_dir(stack_dir);
        let output = run_checked(cmd)?;
        Ok(Self::parse_nul_separated(&output))
    }

    /// Parse `env -0` output. Entries without `=` are dropped.
    pub fn parse_nul_separated(output: &str) -> Self {
        let vars = output
            .split('\0')
            .filter_map(|entry| entry.split_once('='))
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { vars }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Replace `cmd`'s environment with exactly this one.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.env_clear().envs(&self.vars);
    }
}
