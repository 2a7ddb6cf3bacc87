//! Home directory expansion for paths taken from task files.

#[derive(Debug, thiserror::Error)]
#[error("cannot expand '{path}': home directory could not be determined")]
pub struct HomeDirError {
    pub path: String,
}

/// Expand a leading `~/` to the current user's home directory.
///
/// Returns `Ok(None)` when the path has no `~/` prefix and should be used unchanged.
pub fn expand_home(path: &str) -> Result<Option<String>, HomeDirError> {
    let Some(rest) = path.strip_prefix("~/") else {
        return Ok(None);
    };
    let home = dirs::home_dir().ok_or_else(|| HomeDirError {
        path: path.to_string(),
    })?;
    Ok(Some(home.join(rest).to_string_lossy().into_owned()))
}
