//! Data migration tool - `transx` (backup, transfer, restore)
//!
//! `transx` moves a data directory from a source endpoint to a destination endpoint, either of
//! which may be this machine or a remote host reached over SSH. A migration has three phases:
//!
//! 1. **Backup**: run the source's `backupCommand` on the source (skipped when empty)
//! 2. **Transfer**: synchronize the source path into the destination path with `rsync`
//! 3. **Restore**: run the destination's `restoreCommand` on the destination (skipped when empty)
//!
//! # Usage
//!
//! ```bash
//! # Full migration described by a task file
//! transx task.json --summary
//!
//! # Only one phase
//! transx task.json --phase transfer -v
//!
//! # Show which mode the task would use and exit
//! transx task.json --print-mode
//! ```
//!
//! # Modes
//!
//! - **local-to-local**, **local-to-remote**, **remote-to-local**: a single `rsync` invocation,
//!   with the remote side's SSH key, port and host key policy passed through `rsync -e`
//! - **relay**: both endpoints are remote; data is downloaded into a temporary staging directory
//!   on this machine and uploaded from there, and the staging directory is removed afterwards
//!
//! # Task File
//!
//! See [`task_file`] for the JSON format. Key paths starting with `~/` are expanded to the home
//! directory and the task is validated before anything runs.
//!
//! # Security
//!
//! Backup and restore commands are executed verbatim through `sh -c` or `ssh`. Only run task files
//! from trusted sources. Setting `insecureSkipHostKeyVerification` accepts unknown host keys
//! without recording them, which removes protection against interception.
//!
//! # Failure Behavior
//!
//! The first failing phase aborts the run and nothing is rolled back. Errors carry the failed
//! command line and its output.

pub mod exec;
pub mod migrate;
pub mod task_file;
pub mod transfer;

#[cfg(test)]
pub mod testutils;
