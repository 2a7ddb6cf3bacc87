//! Command executor: run a shell command on an endpoint, locally or over SSH.

use common::{CommandLine, Endpoint, ProcessOutput, ProcessRunner, ShellCommand, SyncOptions};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("command to execute cannot be empty")]
    EmptyCommand,
    #[error("host address must be provided for remote command execution")]
    MissingHost,
    #[error("failed to run `{command}`")]
    Spawn {
        command: CommandLine,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "`{command}` exited with {}\nOutput:\n{}",
        describe_exit(.code),
        common::output::default_preview(.output)
    )]
    Failed {
        command: CommandLine,
        code: Option<i32>,
        /// Full combined output, the message only shows a preview
        output: Vec<u8>,
    },
}

impl ExecError {
    /// Full output of a command that ran and failed
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            ExecError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }

    /// The process invocation, if one was attempted
    pub fn command(&self) -> Option<&CommandLine> {
        match self {
            ExecError::Spawn { command, .. } | ExecError::Failed { command, .. } => Some(command),
            _ => None,
        }
    }
}

pub(crate) fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// The process invocation that runs `command` on `endpoint`.
///
/// Local endpoints go through `sh -c`; remote ones through `ssh` with the endpoint's key, port and
/// the host key policy from `options`.
pub fn command_line(
    command: &ShellCommand,
    endpoint: &Endpoint,
    options: &SyncOptions,
) -> Result<CommandLine, ExecError> {
    if command.is_blank() {
        return Err(ExecError::EmptyCommand);
    }
    if !endpoint.is_remote() {
        return Ok(CommandLine::shell(command));
    }
    let session = remote::SshSession::from_endpoint(endpoint).ok_or(ExecError::MissingHost)?;
    if session.host.trim().is_empty() {
        return Err(ExecError::MissingHost);
    }
    Ok(remote::remote_command(
        &session,
        remote::HostKeyPolicy::from_options(options),
        command,
    ))
}

/// Run `command` on `endpoint` and wait for it to exit.
///
/// Spawns exactly one process. A blank command fails before anything is spawned. A non-zero exit
/// is an error carrying the combined output.
#[instrument(skip(runner, options), fields(endpoint = %endpoint))]
pub async fn execute<R: ProcessRunner>(
    runner: &R,
    command: &ShellCommand,
    endpoint: &Endpoint,
    options: &SyncOptions,
) -> Result<ProcessOutput, ExecError> {
    let line = command_line(command, endpoint, options)?;
    if endpoint.is_remote() {
        tracing::info!("executing remote command on {}", endpoint.ssh_destination());
    } else {
        tracing::info!("executing local command");
    }
    tracing::debug!("command line: {}", line);
    let output = match runner.run(&line).await {
        Ok(output) => output,
        Err(source) => {
            return Err(ExecError::Spawn {
                command: line,
                source,
            });
        }
    };
    if !output.success() {
        return Err(ExecError::Failed {
            command: line,
            code: output.code,
            output: output.output,
        });
    }
    Ok(output)
}
