//! Persisted device selection.
//!
//! # Storage layout
//!
//! ```text
//! <config_dir>/tetherclock/config.json    (mode 0600)
//! ```
//!
//! One JSON document with one field: the last serial pinned via
//! `tetherclock device N`. Absence of the file — or an unreadable file —
//! means "no preference", never an error.
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(base: &Path, …)` — explicit base dir; used in tests with `TempDir`
//! - `fn(…)` — derives the base from `dirs::config_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const APP_DIR_NAME: &str = "tetherclock";
pub const CONFIG_FILE: &str = "config.json";

/// The persisted selection document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    /// Serial pinned by an explicit `device N` command, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_serial: Option<String>,
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<base>/tetherclock/` — pure, no I/O.
pub fn config_dir_at(base: &Path) -> PathBuf {
    base.join(APP_DIR_NAME)
}

/// `<base>/tetherclock/config.json` — pure, no I/O.
pub fn config_path_at(base: &Path) -> PathBuf {
    config_dir_at(base).join(CONFIG_FILE)
}

/// `config_path_at` convenience wrapper over `dirs::config_dir()`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&base_dir()?))
}

// ---------------------------------------------------------------------------
// Load / save / reset
// ---------------------------------------------------------------------------

/// Load the selection from `<base>/tetherclock/config.json`.
///
/// A missing, unreadable or malformed file loads as the default selection.
pub fn load_at(base: &Path) -> Selection {
    let path = config_path_at(base);
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => Selection::default(),
    }
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Selection, ConfigError> {
    Ok(load_at(&base_dir()?))
}

/// Atomically save the selection to `<base>/tetherclock/config.json`.
///
/// Write flow: serialize → `.tmp` sibling → `chmod 0600` → `rename`.
/// The `.tmp` lives in the target directory so the rename never crosses a
/// filesystem boundary.
pub fn save_at(base: &Path, selection: &Selection) -> Result<(), ConfigError> {
    let dir = config_dir_at(base);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(base);
    let tmp_path = path.with_file_name(format!("{CONFIG_FILE}.tmp"));

    let json = serde_json::to_string_pretty(selection)?;
    std::fs::write(&tmp_path, json)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(selection: &Selection) -> Result<(), ConfigError> {
    save_at(&base_dir()?, selection)
}

/// Delete the persisted selection. A missing file is not an error.
pub fn reset_at(base: &Path) -> Result<(), ConfigError> {
    match std::fs::remove_file(config_path_at(base)) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// `reset_at` convenience wrapper.
pub fn reset() -> Result<(), ConfigError> {
    reset_at(&base_dir()?)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn base_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_base() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    #[test]
    fn config_path_is_correct() {
        let base = make_base();
        let path = config_path_at(base.path());
        assert!(path.ends_with("tetherclock/config.json"));
    }

    #[test]
    fn load_absent_file_is_default() {
        let base = make_base();
        assert_eq!(load_at(base.path()), Selection::default());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let base = make_base();
        let selection = Selection {
            selected_serial: Some("R58M12ABCDE".to_owned()),
        };
        save_at(base.path(), &selection).expect("save");
        assert_eq!(load_at(base.path()), selection);
    }

    #[test]
    fn malformed_file_loads_as_default() {
        let base = make_base();
        let dir = config_dir_at(base.path());
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(config_path_at(base.path()), "{not json").expect("write");
        assert_eq!(load_at(base.path()), Selection::default());
    }

    #[test]
    fn atomic_write_cleans_up_tmp() {
        let base = make_base();
        save_at(base.path(), &Selection::default()).expect("save");
        let tmp = config_path_at(base.path()).with_file_name("config.json.tmp");
        assert!(!tmp.exists(), ".tmp must be gone after successful save");
    }

    #[test]
    fn saved_file_has_restrictive_mode() {
        let base = make_base();
        save_at(base.path(), &Selection::default()).expect("save");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(config_path_at(base.path()))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn reset_removes_file_and_tolerates_absence() {
        let base = make_base();
        save_at(
            base.path(),
            &Selection {
                selected_serial: Some("emulator-5554".to_owned()),
            },
        )
        .expect("save");
        reset_at(base.path()).expect("reset");
        assert!(!config_path_at(base.path()).exists());
        reset_at(base.path()).expect("reset on absent file");
        assert_eq!(load_at(base.path()), Selection::default());
    }
}
