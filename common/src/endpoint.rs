//! Endpoint model: one side of a migration, the sync tool options and the task pairing them.

use serde::{Deserialize, Serialize};

/// Which side of a migration an endpoint plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Destination => write!(f, "destination"),
        }
    }
}

/// One side of a migration: where the data lives and how to reach it.
///
/// An endpoint is remote iff `host_address` is non-empty after trimming whitespace. Every other
/// field is ignored for that decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Endpoint {
    /// User name for SSH authentication (optional, SSH config may supply it)
    pub username: String,
    /// Host name or IP address; empty means the endpoint is on this machine
    pub host_address: String,
    /// SSH port, 0 means the ssh default (22); out-of-range values are rejected by validation
    pub ssh_port: i64,
    /// Filesystem path on the endpoint
    pub data_path: String,
    /// Private key used for SSH authentication
    pub private_key_path: String,
    /// Shell command run on this endpoint before the transfer (source side)
    pub backup_command: String,
    /// Shell command run on this endpoint after the transfer (destination side)
    pub restore_command: String,
}

impl Endpoint {
    /// Create a local endpoint rooted at `data_path`
    pub fn local(data_path: impl Into<String>) -> Self {
        Self {
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    /// Create a remote endpoint for `user@host:data_path`, the user may be empty
    pub fn remote(
        username: impl Into<String>,
        host_address: impl Into<String>,
        data_path: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            host_address: host_address.into(),
            data_path: data_path.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, ssh_port: i64) -> Self {
        self.ssh_port = ssh_port;
        self
    }

    pub fn with_private_key(mut self, private_key_path: impl Into<String>) -> Self {
        self.private_key_path = private_key_path.into();
        self
    }

    pub fn with_backup_command(mut self, command: impl Into<String>) -> Self {
        self.backup_command = command.into();
        self
    }

    pub fn with_restore_command(mut self, command: impl Into<String>) -> Self {
        self.restore_command = command.into();
        self
    }

    pub fn is_remote(&self) -> bool {
        !self.host_address.trim().is_empty()
    }

    /// `user@host` or `host` when no user is configured
    pub fn ssh_destination(&self) -> String {
        if self.username.trim().is_empty() {
            self.host_address.clone()
        } else {
            format!("{}@{}", self.username, self.host_address)
        }
    }

    /// Address in the form the sync tool expects.
    ///
    /// Remote endpoints resolve to `user@host:path` (or `host:path` without a user), local
    /// endpoints resolve to `data_path` unchanged.
    pub fn resolve_sync_address(&self) -> String {
        if self.is_remote() {
            format!("{}:{}", self.ssh_destination(), self.data_path)
        } else {
            self.data_path.clone()
        }
    }

    /// Non-default SSH port, if one is configured
    pub fn port(&self) -> Option<i64> {
        (self.ssh_port != 0).then_some(self.ssh_port)
    }

    /// Private key path, if one is configured
    pub fn private_key(&self) -> Option<&str> {
        let key = self.private_key_path.trim();
        (!key.is_empty()).then_some(key)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.resolve_sync_address())
    }
}

/// Flags for the file synchronization tool and the SSH connections it makes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SyncOptions {
    /// Compress file data during the transfer (`-z`)
    pub compress: bool,
    /// Archive mode, recursive and preserving metadata (`-a`)
    pub archive: bool,
    /// Increase verbosity (`-v`)
    pub verbose: bool,
    /// Delete extraneous files from the destination (`--delete`)
    pub delete: bool,
    /// Show progress during the transfer (`--progress`)
    pub progress: bool,
    /// Trial run with no changes made (`-n`)
    pub dry_run: bool,
    /// Sync tool executable, empty means `rsync` from `PATH`
    pub sync_tool_path: String,
    /// `--include=PATTERN` entries
    pub include: Vec<String>,
    /// `--exclude=PATTERN` entries
    pub exclude: Vec<String>,
    /// Accept new host keys and skip the known hosts file.
    ///
    /// This removes protection against interception on first or changed connections. Only use it
    /// in trusted environments.
    pub insecure_skip_host_key_verification: bool,
}

pub const DEFAULT_SYNC_TOOL: &str = "rsync";

impl SyncOptions {
    pub fn sync_tool(&self) -> &str {
        let path = self.sync_tool_path.trim();
        if path.is_empty() {
            DEFAULT_SYNC_TOOL
        } else {
            path
        }
    }
}

/// How the two endpoints of a task are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationMode {
    /// Both endpoints are on this machine
    Local,
    LocalToRemote,
    RemoteToLocal,
    /// Both endpoints are remote, data is staged on this machine
    Relay,
}

impl MigrationMode {
    pub fn is_relay(&self) -> bool {
        matches!(self, MigrationMode::Relay)
    }
}

impl std::fmt::Display for MigrationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationMode::Local => write!(f, "local-to-local"),
            MigrationMode::LocalToRemote => write!(f, "local-to-remote"),
            MigrationMode::RemoteToLocal => write!(f, "remote-to-local"),
            MigrationMode::Relay => write!(f, "relay"),
        }
    }
}

/// A single migration: source, destination and the options used to move data between them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MigrationTask {
    pub source: Endpoint,
    pub destination: Endpoint,
    #[serde(default)]
    pub sync_options: SyncOptions,
}

impl MigrationTask {
    pub fn new(source: Endpoint, destination: Endpoint) -> Self {
        Self {
            source,
            destination,
            sync_options: SyncOptions::default(),
        }
    }

    pub fn with_sync_options(mut self, sync_options: SyncOptions) -> Self {
        self.sync_options = sync_options;
        self
    }

    /// Classify the task from the shape of its endpoints; recomputed on every call
    pub fn mode(&self) -> MigrationMode {
        match (self.source.is_remote(), self.destination.is_remote()) {
            (false, false) => MigrationMode::Local,
            (false, true) => MigrationMode::LocalToRemote,
            (true, false) => MigrationMode::RemoteToLocal,
            (true, true) => MigrationMode::Relay,
        }
    }

    pub fn is_relay_mode(&self) -> bool {
        self.source.is_remote() && self.destination.is_remote()
    }

    pub fn endpoint(&self, side: Side) -> &Endpoint {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// Replace a leading `~/` in both private key paths with the home directory
    pub fn expand_key_paths(&mut self) -> Result<(), crate::home::HomeDirError> {
        for endpoint in [&mut self.source, &mut self.destination] {
            if let Some(expanded) = crate::home::expand_home(&endpoint.private_key_path)? {
                endpoint.private_key_path = expanded;
            }
        }
        Ok(())
    }
}

/// Free-function form of [`MigrationTask::is_relay_mode`]
pub fn is_relay_mode(task: &MigrationTask) -> bool {
    task.is_relay_mode()
}
