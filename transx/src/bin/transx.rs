use anyhow::Result;
use clap::Parser;
use tracing::instrument;

use transx::migrate::{self, Phase, Report};

/// Which phases to run
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum PhaseSelection {
    /// Backup, transfer and restore
    All,
    Backup,
    Transfer,
    Restore,
}

impl PhaseSelection {
    fn phase(self) -> Option<Phase> {
        match self {
            PhaseSelection::All => None,
            PhaseSelection::Backup => Some(Phase::Backup),
            PhaseSelection::Transfer => Some(Phase::Transfer),
            PhaseSelection::Restore => Some(Phase::Restore),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "transx",
    version,
    about = "Migrate data between local and remote endpoints - backup, transfer, restore",
    long_about = "`transx` migrates a data directory described by a JSON task file.

It runs the source's backup command, synchronizes the data with rsync (relaying through a local \
staging directory when both endpoints are remote) and runs the destination's restore command.

EXAMPLE:
    # Full migration with a summary at the end
    transx task.json --summary

    # Preview the transfer without changing anything
    transx task.json --phase transfer --dry-run -v"
)]
struct Args {
    // Migration options
    /// Phase to run
    #[arg(
        long,
        value_enum,
        default_value_t = PhaseSelection::All,
        help_heading = "Migration options"
    )]
    phase: PhaseSelection,

    /// Pass dry-run to the sync tool, no files are changed by the transfer
    ///
    /// Backup and restore commands still run when their phase is selected.
    #[arg(long, help_heading = "Migration options")]
    dry_run: bool,

    /// Print the detected migration mode and exit without running anything
    #[arg(long, help_heading = "Migration options")]
    print_mode: bool,

    /// Kill any spawned command still running after this long
    ///
    /// Applies to backup and restore commands and to each sync tool invocation. Accepts a human
    /// readable duration, e.g. "90s", "30min", "2h". No limit by default.
    #[arg(long, value_name = "DURATION", help_heading = "Migration options")]
    command_timeout: Option<humantime::Duration>,

    // Progress & output
    /// Verbose level (implies "summary"): -v INFO / -vv DEBUG / -vvv TRACE (default: ERROR)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, help_heading = "Progress & output")]
    verbose: u8,

    /// Print summary at the end
    #[arg(long, help_heading = "Progress & output")]
    summary: bool,

    /// Quiet mode, don't report errors
    #[arg(short = 'q', long = "quiet", help_heading = "Progress & output")]
    quiet: bool,

    // ARGUMENTS
    /// JSON file describing the migration task
    #[arg()]
    task_file: std::path::PathBuf,
}

/// What a run produced
#[derive(Debug)]
enum Outcome {
    Mode(common::MigrationMode),
    Migrated(Report),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Mode(mode) => write!(f, "{mode}"),
            Outcome::Migrated(report) => write!(f, "{report}"),
        }
    }
}

#[instrument]
async fn async_main(args: Args, exec: common::ExecConfig) -> Result<Outcome> {
    let mut task = transx::task_file::load(&args.task_file).await?;
    if args.print_mode {
        return Ok(Outcome::Mode(task.mode()));
    }
    if args.dry_run {
        task.sync_options.dry_run = true;
    }
    if task.sync_options.insecure_skip_host_key_verification {
        tracing::warn!("host key verification is relaxed for this migration");
    }
    let runner = exec.runner();
    let report = match args.phase.phase() {
        Some(phase) => migrate::run_phase(&runner, &task, phase).await?,
        None => migrate::migrate(&runner, &task).await?,
    };
    Ok(Outcome::Migrated(report))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let exec = common::ExecConfig {
        command_timeout: args.command_timeout.map(Into::into),
    };
    let output = common::OutputConfig {
        quiet: args.quiet,
        verbose: args.verbose,
        print_summary: args.summary || args.print_mode,
    };
    let func = {
        let args = args.clone();
        || async_main(args, exec)
    };
    let res = common::run(output, func);
    if res.is_none() {
        std::process::exit(1);
    }
    Ok(())
}
