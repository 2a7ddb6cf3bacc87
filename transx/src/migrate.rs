//! Migration orchestrator: backup, transfer and restore phases.
//!
//! Each phase can run on its own through [`run_phase`]; [`migrate`] runs all three in order and
//! stops at the first failure. Completed phases are never rolled back: a backup artifact stays
//! where the backup command put it and transferred data stays at the destination.

use std::time::Duration;

use common::{MigrationMode, MigrationTask, ProcessRunner, ShellCommand, Side};
use tracing::instrument;

use crate::exec::{self, ExecError};
use crate::transfer::{self, TransferError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Backup,
    Transfer,
    Restore,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Backup => write!(f, "backup"),
            Phase::Transfer => write!(f, "transfer"),
            Phase::Restore => write!(f, "restore"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseStatus {
    #[default]
    NotRun,
    /// No command configured for the phase
    Skipped,
    Completed,
}

impl std::fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhaseStatus::NotRun => write!(f, "not run"),
            PhaseStatus::Skipped => write!(f, "skipped"),
            PhaseStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("backup on source '{endpoint}' failed")]
    Backup {
        endpoint: String,
        #[source]
        source: ExecError,
    },
    #[error("data transfer failed")]
    Transfer(#[from] TransferError),
    #[error("restore on destination '{endpoint}' failed")]
    Restore {
        endpoint: String,
        #[source]
        source: ExecError,
    },
}

impl Error {
    pub fn phase(&self) -> Phase {
        match self {
            Error::Backup { .. } => Phase::Backup,
            Error::Transfer(_) => Phase::Transfer,
            Error::Restore { .. } => Phase::Restore,
        }
    }

    /// Full combined output of the failed process, if it ran
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            Error::Backup { source, .. } | Error::Restore { source, .. } => source.output(),
            Error::Transfer(error) => error.output(),
        }
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct Report {
    pub source: String,
    pub destination: String,
    pub mode: MigrationMode,
    pub backup: PhaseStatus,
    pub transfer: PhaseStatus,
    pub restore: PhaseStatus,
    pub elapsed: Duration,
}

impl Report {
    fn new(task: &MigrationTask) -> Self {
        Self {
            source: task.source.to_string(),
            destination: task.destination.to_string(),
            mode: task.mode(),
            backup: PhaseStatus::NotRun,
            transfer: PhaseStatus::NotRun,
            restore: PhaseStatus::NotRun,
            elapsed: Duration::ZERO,
        }
    }

    pub fn status(&self, phase: Phase) -> PhaseStatus {
        match phase {
            Phase::Backup => self.backup,
            Phase::Transfer => self.transfer,
            Phase::Restore => self.restore,
        }
    }

    fn set(&mut self, phase: Phase, status: PhaseStatus) {
        match phase {
            Phase::Backup => self.backup = status,
            Phase::Transfer => self.transfer = status,
            Phase::Restore => self.restore = status,
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "source: {}", self.source)?;
        writeln!(f, "destination: {}", self.destination)?;
        writeln!(f, "mode: {}", self.mode)?;
        writeln!(f, "backup: {}", self.backup)?;
        writeln!(f, "transfer: {}", self.transfer)?;
        writeln!(f, "restore: {}", self.restore)?;
        // whole milliseconds keep the summary short
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(f, "total time: {}", humantime::format_duration(elapsed))
    }
}

fn log_output(phase: Phase, output: &common::ProcessOutput) {
    if output.output.is_empty() {
        return;
    }
    tracing::info!(
        "{} command output: {}",
        phase,
        common::output::default_preview(&output.output)
    );
}

/// Run the source's backup command on the source endpoint.
///
/// Returns [`PhaseStatus::Skipped`] without spawning anything when no command is configured.
#[instrument(skip_all)]
pub async fn backup<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
) -> Result<PhaseStatus, Error> {
    let command = ShellCommand::new(task.source.backup_command.as_str());
    if command.is_blank() {
        tracing::info!("no backup command for {}, skipping backup", Side::Source);
        return Ok(PhaseStatus::Skipped);
    }
    tracing::info!("backup command: {}", command);
    let output = exec::execute(runner, &command, &task.source, &task.sync_options)
        .await
        .map_err(|source| Error::Backup {
            endpoint: task.source.to_string(),
            source,
        })?;
    log_output(Phase::Backup, &output);
    Ok(PhaseStatus::Completed)
}

/// Synchronize the source data into the destination.
pub async fn transfer<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
) -> Result<PhaseStatus, Error> {
    transfer::transfer(runner, task).await?;
    Ok(PhaseStatus::Completed)
}

/// Run the destination's restore command on the destination endpoint.
///
/// Returns [`PhaseStatus::Skipped`] without spawning anything when no command is configured.
#[instrument(skip_all)]
pub async fn restore<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
) -> Result<PhaseStatus, Error> {
    let command = ShellCommand::new(task.destination.restore_command.as_str());
    if command.is_blank() {
        tracing::info!(
            "no restore command for {}, skipping restore",
            Side::Destination
        );
        return Ok(PhaseStatus::Skipped);
    }
    tracing::info!("restore command: {}", command);
    let output = exec::execute(runner, &command, &task.destination, &task.sync_options)
        .await
        .map_err(|source| Error::Restore {
            endpoint: task.destination.to_string(),
            source,
        })?;
    log_output(Phase::Restore, &output);
    Ok(PhaseStatus::Completed)
}

async fn run_one<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
    phase: Phase,
) -> Result<PhaseStatus, Error> {
    tracing::info!("starting {}", phase);
    let status = match phase {
        Phase::Backup => backup(runner, task).await?,
        Phase::Transfer => transfer(runner, task).await?,
        Phase::Restore => restore(runner, task).await?,
    };
    tracing::info!("{} {}", phase, status);
    Ok(status)
}

async fn run_phases<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
    phases: &[Phase],
) -> Result<Report, Error> {
    let start = std::time::Instant::now();
    let mut report = Report::new(task);
    tracing::info!(
        "migrating {} -> {} ({})",
        report.source,
        report.destination,
        report.mode
    );
    for &phase in phases {
        let status = run_one(runner, task, phase).await?;
        report.set(phase, status);
    }
    report.elapsed = start.elapsed();
    Ok(report)
}

/// Run exactly one phase; no other phase is triggered.
pub async fn run_phase<R: ProcessRunner>(
    runner: &R,
    task: &MigrationTask,
    phase: Phase,
) -> Result<Report, Error> {
    run_phases(runner, task, &[phase]).await
}

/// Backup, transfer and restore, in that order.
///
/// Backup and restore are skipped when their commands are blank; the transfer always runs. The
/// first failure aborts the remaining phases.
#[instrument(skip_all, fields(mode = %task.mode()))]
pub async fn migrate<R: ProcessRunner>(runner: &R, task: &MigrationTask) -> Result<Report, Error> {
    run_phases(runner, task, &[Phase::Backup, Phase::Transfer, Phase::Restore]).await
}
