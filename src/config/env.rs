//! `.env` support for session credentials
//!
//! Lets `COOKIE_NAME` and `COOKIE_VALUE` live in a `.env` file next to the
//! mirror instead of the shell environment. Variables that are already set
//! are never overridden.

use crate::ConfigError;
use std::path::{Path, PathBuf};

/// Loads the nearest `.env` file (current directory or a parent)
///
/// # Returns
///
/// * `Ok(Some(path))` - The file that was loaded
/// * `Ok(None)` - No `.env` file was found
/// * `Err(ConfigError)` - A file was found but could not be read or parsed
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Loads one specific env file into the process environment
pub fn load_env_file(path: &Path) -> Result<(), ConfigError> {
    dotenvy::from_path(path)?;
    Ok(())
}
