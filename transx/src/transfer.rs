//! Transfer engine: synchronize the source tree to the destination with the sync tool.
//!
//! The sync tool addresses at most one remote endpoint per invocation, which gives two shapes:
//!
//! - **direct**: one invocation `<tool> [flags] [-e <ssh>] <source> <destination>`
//! - **relay** (both endpoints remote): a download into a fresh local staging directory followed
//!   by an upload from it, the staging directory being removed on every exit path
//!
//! ```text
//! direct:  source ───────────────────────────────> destination
//! relay:   source ──download──> staging (local) ──upload──> destination
//! ```
//!
//! With `delete` disabled a transfer only adds and updates files and can be re-run safely. With
//! `delete` enabled the destination converges to the source and extraneous files are removed.

use std::path::PathBuf;

use common::{CommandLine, Endpoint, MigrationTask, ProcessRunner, SyncOptions, ValidationError};
use tracing::instrument;

/// Prefix of relay staging directories created under the system temp directory
pub const STAGING_PREFIX: &str = "transx-relay-";

/// Which sync tool invocation of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    Direct,
    /// Relay: source to staging directory
    Download,
    /// Relay: staging directory to destination
    Upload,
}

impl std::fmt::Display for Hop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hop::Direct => write!(f, "transfer"),
            Hop::Download => write!(f, "relay download"),
            Hop::Upload => write!(f, "relay upload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("transfer task validation failed")]
    Invalid(#[from] ValidationError),
    #[error("failed to create staging directory for relay transfer")]
    StagingCreate(#[source] std::io::Error),
    #[error("failed to remove staging directory {}", .path.display())]
    StagingCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{hop} from '{from}' to '{to}' could not start\nCommand: {command}")]
    Spawn {
        hop: Hop,
        from: String,
        to: String,
        command: CommandLine,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{hop} from '{from}' to '{to}' exited with {}\nCommand: {command}\nOutput:\n{}",
        crate::exec::describe_exit(.code),
        common::output::default_preview(.output)
    )]
    Sync {
        hop: Hop,
        from: String,
        to: String,
        command: CommandLine,
        code: Option<i32>,
        /// Full combined output of the sync tool
        output: Vec<u8>,
    },
}

impl TransferError {
    /// The invocation that failed, if the failure came from the sync tool
    pub fn hop(&self) -> Option<Hop> {
        match self {
            TransferError::Spawn { hop, .. } | TransferError::Sync { hop, .. } => Some(*hop),
            _ => None,
        }
    }

    pub fn output(&self) -> Option<&[u8]> {
        match self {
            TransferError::Sync { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Sync tool flags for `options`, always in the same order:
/// `-a -z -v --delete --progress -n`, then excludes, then includes.
///
/// Blank include and exclude patterns are dropped.
pub fn sync_flags(options: &SyncOptions) -> Vec<String> {
    let mut flags: Vec<String> = [
        (options.archive, "-a"),
        (options.compress, "-z"),
        (options.verbose, "-v"),
        (options.delete, "--delete"),
        (options.progress, "--progress"),
        (options.dry_run, "-n"),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, flag)| flag.to_string())
    .collect();
    for pattern in options.exclude.iter().filter(|p| !p.trim().is_empty()) {
        flags.push(format!("--exclude={pattern}"));
    }
    for pattern in options.include.iter().filter(|p| !p.trim().is_empty()) {
        flags.push(format!("--include={pattern}"));
    }
    flags
}

/// Remote-shell hook for one invocation from `origin` to `target`.
///
/// The remote origin's SSH settings win; otherwise the remote target's apply. Neither side remote
/// means no hook.
pub fn remote_shell(origin: &Endpoint, target: &Endpoint, options: &SyncOptions) -> Option<String> {
    let active = if origin.is_remote() {
        origin
    } else if target.is_remote() {
        target
    } else {
        return None;
    };
    let session = remote::SshSession::from_endpoint(active)?;
    remote::remote_shell_hook(&session, remote::HostKeyPolicy::from_options(options))
}

/// Complete sync tool invocation copying `origin` to `target`
pub fn sync_command(options: &SyncOptions, origin: &Endpoint, target: &Endpoint) -> CommandLine {
    let mut line = CommandLine::new(options.sync_tool()).args(sync_flags(options));
    if let Some(hook) = remote_shell(origin, target, options) {
        line = line.arg("-e").arg(hook);
    }
    line.arg(origin.resolve_sync_address())
        .arg(target.resolve_sync_address())
}

async fn run_hop<R: ProcessRunner>(
    runner: &R,
    hop: Hop,
    options: &SyncOptions,
    origin: &Endpoint,
    target: &Endpoint,
) -> Result<(), TransferError> {
    let command = sync_command(options, origin, target);
    let from = origin.resolve_sync_address();
    let to = target.resolve_sync_address();
    tracing::info!("{}: {} -> {}", hop, from, to);
    tracing::debug!("sync command: {}", command);
    let output = match runner.run(&command).await {
        Ok(output) => output,
        Err(source) => {
            return Err(TransferError::Spawn {
                hop,
                from,
                to,
                command,
                source,
            });
        }
    };
    if !output.success() {
        tracing::warn!("{} failed with exit code {:?}", hop, output.code);
        return Err(TransferError::Sync {
            hop,
            from,
            to,
            command,
            code: output.code,
            output: output.output,
        });
    }
    tracing::debug!(
        "{} output: {}",
        hop,
        common::output::default_preview(&output.output)
    );
    Ok(())
}

/// Download into the staging directory, then upload from it. The upload never starts unless the
/// download succeeded.
async fn relay_hops<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
    staged: &Endpoint,
) -> Result<(), TransferError> {
    let options = &task.sync_options;
    run_hop(runner, Hop::Download, options, &task.source, staged).await?;
    run_hop(runner, Hop::Upload, options, staged, &task.destination).await
}

async fn relay<R: ProcessRunner>(runner: &R, task: &MigrationTask) -> Result<(), TransferError> {
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir()
        .map_err(TransferError::StagingCreate)?;
    let path = staging.path().to_path_buf();
    tracing::debug!("created staging directory {}", path.display());
    // trailing slash: sync the contents of the staging directory, not the directory itself
    let staged = Endpoint::local(format!("{}/", path.display()));
    let res = relay_hops(runner, task, &staged).await;
    let cleanup = staging.close();
    match &cleanup {
        Ok(()) => tracing::debug!("removed staging directory {}", path.display()),
        Err(error) => tracing::warn!(
            "failed to remove staging directory {}: {}",
            path.display(),
            error
        ),
    }
    match (res, cleanup) {
        (Err(error), _) => Err(error),
        (Ok(()), Err(source)) => Err(TransferError::StagingCleanup { path, source }),
        (Ok(()), Ok(())) => {
            tracing::info!("relay transfer completed");
            Ok(())
        }
    }
}

/// Synchronize `task.source` into `task.destination`.
///
/// The task is validated first and nothing is spawned if it is invalid. Direct mode runs the sync
/// tool once; relay mode runs it twice through a staging directory that is removed afterwards
/// whether or not the hops succeeded.
#[instrument(skip_all, fields(mode = %task.mode()))]
pub async fn transfer<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
) -> Result<(), TransferError> {
    common::validate(task)?;
    if task.is_relay_mode() {
        tracing::info!("both endpoints are remote, relaying through this machine");
        return relay(runner, task).await;
    }
    run_hop(
        runner,
        Hop::Direct,
        &task.sync_options,
        &task.source,
        &task.destination,
    )
    .await
}
