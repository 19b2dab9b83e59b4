use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("results path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot prepare results directory {}: {source}", path.display())]
    Prepare {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to store {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory that receives exported result files.
///
/// Only obtainable through [`ResultsDir::open`], so a value always names an
/// existing, writable directory.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    dir: PathBuf,
}

impl ResultsDir {
    /// Creates `dir` if missing and checks it accepts new files.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let dir = dir.into();
        if dir.exists() && !dir.is_dir() {
            return Err(PersistError::NotADirectory(dir));
        }
        let prepare = |source| PersistError::Prepare {
            path: dir.clone(),
            source,
        };
        fs::create_dir_all(&dir).map_err(prepare)?;
        NamedTempFile::new_in(&dir).map_err(prepare)?;
        Ok(Self { dir })
    }

    /// Stores `content` as `filename`, replacing any file of that name.
    ///
    /// Readers see either the old file or the complete new one.
    pub fn store(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        let failed = |source| PersistError::Store {
            path: target.clone(),
            source,
        };

        let mut staged = NamedTempFile::new_in(&self.dir).map_err(failed)?;
        staged.write_all(content).map_err(failed)?;
        staged.as_file().sync_all().map_err(failed)?;
        staged.persist(&target).map_err(|err| failed(err.error))?;
        Ok(target)
    }
}
