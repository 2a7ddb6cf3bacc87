//! Structural validation of a migration task.
//!
//! Validation never touches the network or the filesystem: whether a key file exists or a host
//! answers is only discovered when a command actually runs.

use crate::endpoint::{Endpoint, MigrationTask, Side};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} path must be provided")]
    MissingPath(Side),
    #[error("{side} SSH port {port} is out of valid range (1-65535)")]
    InvalidPort { side: Side, port: i64 },
    #[error("{0} host address must be provided for a remote endpoint")]
    MissingHost(Side),
}

pub const MAX_PORT: i64 = 65535;

/// Check that both endpoints of `task` are structurally usable.
///
/// Paths of both sides are checked before any port or host, so a missing destination path is
/// reported even when the source is also misconfigured.
pub fn validate(task: &MigrationTask) -> Result<(), ValidationError> {
    check_path(&task.source, Side::Source)?;
    check_path(&task.destination, Side::Destination)?;
    check_remote(&task.source, Side::Source)?;
    check_remote(&task.destination, Side::Destination)?;
    Ok(())
}

fn check_path(endpoint: &Endpoint, side: Side) -> Result<(), ValidationError> {
    if endpoint.resolve_sync_address().trim().is_empty() || endpoint.data_path.trim().is_empty() {
        return Err(ValidationError::MissingPath(side));
    }
    Ok(())
}

fn check_remote(endpoint: &Endpoint, side: Side) -> Result<(), ValidationError> {
    if !endpoint.is_remote() {
        return Ok(());
    }
    if let Some(port) = endpoint.port()
        && !(1..=MAX_PORT).contains(&port)
    {
        return Err(ValidationError::InvalidPort { side, port });
    }
    // unreachable while remoteness is derived from the host address
    if endpoint.host_address.trim().is_empty() {
        return Err(ValidationError::MissingHost(side));
    }
    Ok(())
}
