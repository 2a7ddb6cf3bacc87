//! Common types and process plumbing for the transx migration tools
//!
//! This crate holds everything the migration engine needs that is independent of SSH and of the
//! sync tool itself:
//!
//! - [`Endpoint`], [`SyncOptions`] and [`MigrationTask`]: the data model of one migration
//! - [`validate()`] and [`MigrationMode`]: structural checks and topology detection
//! - [`ShellCommand`] and [`CommandLine`]: what gets executed
//! - [`ProcessRunner`] and [`SystemRunner`]: how it gets executed
//! - [`run`]: logging and runtime bootstrap shared by the binaries
//!
//! # Endpoints
//!
//! An endpoint is remote exactly when its host address is non-empty after trimming. That single
//! predicate decides the migration mode:
//!
//! | source | destination | mode |
//! |--------|-------------|------|
//! | local  | local       | [`MigrationMode::Local`] |
//! | local  | remote      | [`MigrationMode::LocalToRemote`] |
//! | remote | local       | [`MigrationMode::RemoteToLocal`] |
//! | remote | remote      | [`MigrationMode::Relay`] |

pub mod command;
pub mod config;
pub mod endpoint;
pub mod home;
pub mod output;
pub mod runner;
pub mod validate;

pub use command::{CommandLine, ShellCommand};
pub use config::{ExecConfig, OutputConfig};
pub use endpoint::{Endpoint, MigrationMode, MigrationTask, Side, SyncOptions, is_relay_mode};
pub use runner::{ProcessOutput, ProcessRunner, SystemRunner};
pub use validate::{ValidationError, validate};

fn init_tracing(output: &OutputConfig) {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new(output.log_directive()),
    };
    // ignore the error if a subscriber is already installed (e.g. in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Set up logging, run `func` to completion on a single-threaded runtime and report the outcome.
///
/// Returns `None` if the runtime could not be built or `func` failed; the error is printed to
/// stderr unless `output.quiet` is set. The summary is printed when requested or when running
/// verbosely.
pub fn run<Fut, Summary>(output: OutputConfig, func: impl FnOnce() -> Fut) -> Option<Summary>
where
    Summary: std::fmt::Display,
    Fut: std::future::Future<Output = anyhow::Result<Summary>>,
{
    init_tracing(&output);
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            if !output.quiet {
                eprintln!("failed to start runtime: {error:#}");
            }
            return None;
        }
    };
    let res = runtime.block_on(func());
    match res {
        Ok(summary) => {
            if output.print_summary || output.verbose > 0 {
                println!("{summary}");
            }
            Some(summary)
        }
        Err(error) => {
            tracing::error!("{:#}", &error);
            if !output.quiet {
                eprintln!("{error:#}");
            }
            None
        }
    }
}
