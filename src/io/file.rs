use std::path::Path;

use crate::error::ViewerError;
use crate::model::PresenceLog;

/// Load a presence database from a JSON file.
pub fn load_log(path: &Path) -> Result<PresenceLog, ViewerError> {
    let json = std::fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;
    Ok(PresenceLog::from_json(&json)?)
}
