//! SSH invocation building for transx
//!
//! Nothing here opens a connection. This crate turns a remote [`common::Endpoint`] into the
//! arguments handed to the system `ssh` client, in two shapes:
//!
//! - [`remote_command`]: a full `ssh ... user@host 'command'` invocation used to run backup and
//!   restore commands on a remote endpoint
//! - [`remote_shell_hook`]: the `ssh ...` string passed to the sync tool through `-e`, carrying
//!   only connection options since the sync tool supplies the destination itself
//!
//! ```text
//! ssh [-i key] [-p port] [-o StrictHostKeyChecking=accept-new -o UserKnownHostsFile=/dev/null]
//!     -o ConnectTimeout=30 [-t] user@host 'command'
//! ```

use common::{CommandLine, Endpoint, ShellCommand, SyncOptions};

/// Seconds `ssh` waits for a connection before giving up
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

pub const SSH_PROGRAM: &str = "ssh";

/// How `ssh` treats unknown or changed host keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostKeyPolicy {
    /// Whatever the user's ssh configuration says
    #[default]
    Default,
    /// Accept new keys and do not persist them; exposes first connections to interception
    AcceptNew,
}

impl HostKeyPolicy {
    pub fn from_options(options: &SyncOptions) -> Self {
        if options.insecure_skip_host_key_verification {
            HostKeyPolicy::AcceptNew
        } else {
            HostKeyPolicy::Default
        }
    }
}

/// Connection parameters of one remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSession {
    pub user: Option<String>,
    pub host: String,
    pub port: Option<i64>,
    pub identity: Option<String>,
}

impl SshSession {
    /// Session for a remote endpoint, `None` for a local one
    pub fn from_endpoint(endpoint: &Endpoint) -> Option<Self> {
        if !endpoint.is_remote() {
            return None;
        }
        let user = endpoint.username.trim();
        Some(Self {
            user: (!user.is_empty()).then(|| endpoint.username.clone()),
            host: endpoint.host_address.clone(),
            port: endpoint.port(),
            identity: endpoint.private_key().map(str::to_string),
        })
    }

    /// `user@host`, or `host` when no user is set
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// Key, port and host key options, in that order
    pub fn options(&self, policy: HostKeyPolicy) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(identity) = &self.identity {
            opts.push("-i".to_string());
            opts.push(identity.clone());
        }
        if let Some(port) = self.port {
            opts.push("-p".to_string());
            opts.push(port.to_string());
        }
        if policy == HostKeyPolicy::AcceptNew {
            opts.extend(
                [
                    "-o",
                    "StrictHostKeyChecking=accept-new",
                    "-o",
                    "UserKnownHostsFile=/dev/null",
                ]
                .map(String::from),
            );
        }
        opts
    }
}

/// `ssh` invocation running `command` on the session's host.
///
/// The command text is passed as a single argument; the remote shell interprets it.
pub fn remote_command(
    session: &SshSession,
    policy: HostKeyPolicy,
    command: &ShellCommand,
) -> CommandLine {
    let mut line = CommandLine::new(SSH_PROGRAM)
        .args(session.options(policy))
        .arg("-o")
        .arg(format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"));
    if command.needs_tty() {
        line = line.arg("-t");
    }
    line.arg(session.destination()).arg(command.as_str())
}

/// Remote-shell string for the sync tool's `-e` option.
///
/// `None` when the session needs no options beyond what plain `ssh` does by default, in which case
/// the sync tool's own default is used.
pub fn remote_shell_hook(session: &SshSession, policy: HostKeyPolicy) -> Option<String> {
    let opts = session.options(policy);
    if opts.is_empty() {
        return None;
    }
    let mut parts = vec![SSH_PROGRAM.to_string()];
    parts.extend(opts);
    let hook = shell_words::join(parts);
    tracing::trace!("remote shell hook for {}: {}", session.host, hook);
    Some(hook)
}
