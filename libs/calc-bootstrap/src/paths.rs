use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// Errors for resolving configured directories
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("HOME environment variable is not set")]
    HomeMissing,
    #[error("path must not be empty")]
    Empty,
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Expand `~` prefix to user home directory.
///
/// Returns the path unchanged if no tilde prefix is present.
/// On Windows, uses `USERPROFILE` or `HOME`; elsewhere `HOME`.
///
/// # Errors
/// Returns `PathError::HomeMissing` when the path starts with `~` and no home
/// variable is set.
pub fn expand_tilde(raw: &str) -> Result<PathBuf, PathError> {
    let home = || {
        #[cfg(target_os = "windows")]
        let var = env::var("USERPROFILE").or_else(|_| env::var("HOME"));
        #[cfg(not(target_os = "windows"))]
        let var = env::var("HOME");
        var.map_err(|_| PathError::HomeMissing)
    };

    if raw == "~" {
        return Ok(PathBuf::from(home()?));
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(Path::new(&home()?).join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Expand `raw` and create the directory (and parents) if missing.
///
/// # Errors
/// Returns an error if `raw` is empty, the home directory cannot be
/// resolved, or the directory cannot be created.
pub fn ensure_dir(raw: &str) -> Result<PathBuf, PathError> {
    if raw.trim().is_empty() {
        return Err(PathError::Empty);
    }
    let path = expand_tilde(raw.trim())?;
    fs::create_dir_all(&path).map_err(|source| PathError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
