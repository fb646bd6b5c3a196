//! Checked subprocess execution.

use std::process::Command;

use crate::error::InstallationError;

/// Render a command line for logs and error messages.
pub(crate) fn describe(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `cmd` to completion and return its stdout.
///
/// A nonzero exit status becomes [`InstallationError::Failed`] carrying the
/// command line and everything it printed.
pub(crate) fn run_checked(mut cmd: Command) -> Result<String, InstallationError> {
    let command = describe(&cmd);
    tracing::debug!(%command, "Running");

    let output = cmd.output().map_err(|source| InstallationError::Spawn {
        command: command.clone(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(%command, stdout = %stdout.trim(), stderr = %stderr.trim(), "Command failed");
        return Err(InstallationError::Failed {
            command,
            status: output.status,
            output: format!("{}{}", stdout, stderr),
        });
    }

    Ok(stdout)
}
