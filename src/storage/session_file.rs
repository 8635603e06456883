use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::AuthSession;
use crate::{LinkcardError, Result};

const SESSION_VERSION: i32 = 1;

/// On-disk layout of a persisted session.
#[derive(Serialize, Deserialize)]
struct SessionFileData {
    version: i32,
    session: AuthSession,
}

/// Persists the signed-in session as versioned JSON.
///
/// Writes go to a temporary file next to the target which is then renamed
/// over it, so a reader never observes a half-written session.
pub struct SessionFile {
    label: String,
    path: PathBuf,
}

impl SessionFile {
    /// Create a session file with a diagnostic label and file path
    pub fn new(label: impl Into<String>, path: &Path) -> Self {
        Self {
            label: label.into(),
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been stored yet.
    pub fn read(&self) -> Result<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let file = File::open(&self.path)?;
        let data: SessionFileData =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| {
                LinkcardError::Storage(self.label.clone(), err.to_string())
            })?;
        if data.version != SESSION_VERSION {
            return Err(LinkcardError::Storage(
                self.label.clone(),
                format!(
                    "Session version mismatch: expected {}, got {}",
                    SESSION_VERSION, data.version
                ),
            ));
        }
        log::debug!("session/{}: loaded from {:?}", self.label, self.path);
        Ok(Some(data.session))
    }

    pub fn write(&self, session: &AuthSession) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            LinkcardError::Storage(
                self.label.clone(),
                "Failed to get parent directory".to_owned(),
            )
        })?;
        fs::create_dir_all(parent)?;

        let data = SessionFileData {
            version: SESSION_VERSION,
            session: session.clone(),
        };
        let tmp = TmpFile::create_in(parent)?;
        (&tmp.file).write_all(&serde_json::to_vec(&data)?)?;
        tmp.file.sync_all()?;
        restrict_permissions(&tmp.path)?;
        tmp.persist(&self.path)?;

        log::info!("session/{}: written to {:?}", self.label, self.path);
        Ok(())
    }

    pub fn erase(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::info!("session/{}: erased", self.label);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct TmpFile {
    file: File,
    path: PathBuf,
}

impl TmpFile {
    fn create_in(dir: &Path) -> std::io::Result<Self> {
        let name: String = std::iter::repeat_with(fastrand::alphanumeric)
            .take(10)
            .collect();
        let path = dir.join(format!(".{}.tmp", name));
        let file = File::create(&path)?;
        Ok(Self { file, path })
    }

    fn persist(self, dest: &Path) -> std::io::Result<()> {
        fs::rename(&self.path, dest)
    }
}

impl Drop for TmpFile {
    fn drop(&mut self) {
        // After a successful rename the path no longer exists.
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
