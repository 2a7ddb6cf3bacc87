//! Spawning external processes.
//!
//! Everything that leaves the process (shell commands, ssh, the sync tool) goes through a
//! [`ProcessRunner`], one child per call, awaited to completion before the call returns.

use std::process::Stdio;
use std::time::Duration;

use tracing::instrument;

use crate::command::CommandLine;

/// Exit code and captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    /// Standard output followed by standard error
    pub output: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

/// Runs a [`CommandLine`] and waits for it to exit.
///
/// An `Err` means the process could not be spawned or waited on; a process that ran and exited
/// non-zero is an `Ok` with a failing [`ProcessOutput`].
pub trait ProcessRunner {
    fn run(
        &self,
        command: &CommandLine,
    ) -> impl std::future::Future<Output = std::io::Result<ProcessOutput>> + Send;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill processes still running after `timeout` (None = wait forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// SIGKILL the process group led by `pid`
fn kill_process_group(pid: u32) {
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    let pgid = nix::unistd::Pid::from_raw(raw);
    match nix::sys::signal::killpg(pgid, nix::sys::signal::Signal::SIGKILL) {
        Ok(()) => tracing::debug!("killed process group {}", raw),
        // the whole group may already be gone
        Err(nix::errno::Errno::ESRCH) => {}
        Err(errno) => tracing::warn!("failed to kill process group {}: {}", raw, errno),
    }
}

impl ProcessRunner for SystemRunner {
    #[instrument(skip(self), fields(command = %command))]
    async fn run(&self, command: &CommandLine) -> std::io::Result<ProcessOutput> {
        tracing::debug!("spawning process");
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if self.timeout.is_some() {
            // own process group so the deadline can take down everything the child started;
            // without a deadline the child stays in our group and receives terminal signals
            cmd.process_group(0);
        }
        let child = cmd.spawn()?;
        let pid = child.id();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    tracing::warn!("process exceeded {}", humantime::format_duration(limit));
                    if let Some(pid) = pid {
                        kill_process_group(pid);
                    }
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!(
                            "'{}' did not finish within {}",
                            command.program,
                            humantime::format_duration(limit)
                        ),
                    ));
                }
            },
            None => child.wait_with_output().await?,
        };
        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        tracing::debug!(code = ?output.status.code(), bytes = combined.len(), "process exited");
        Ok(ProcessOutput {
            code: output.status.code(),
            output: combined,
        })
    }
}
