//! Artifact delivery.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Where the finished container goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// Parse a command-line destination. `-` means standard output.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(arg))
        }
    }

    /// Check the destination before any encoding starts.
    ///
    /// # Errors
    ///
    /// Returns `OutputTarget` if the path is a directory or its parent
    /// directory does not exist.
    pub fn validate(&self) -> Result<()> {
        let OutputTarget::File(path) = self else {
            return Ok(());
        };

        if path.as_os_str().is_empty() {
            return Err(Error::OutputTarget("empty output path".to_string()));
        }
        if path.is_dir() {
            return Err(Error::OutputTarget(format!(
                "{} is a directory",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty())
            && !parent.is_dir()
        {
            return Err(Error::OutputTarget(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }
        Ok(())
    }

    /// Write the whole container to the destination.
    ///
    /// # Errors
    ///
    /// Returns `SinkWrite` on any I/O failure. A partially written file is
    /// removed so it cannot be mistaken for a valid artifact.
    pub fn write_artifact(&self, bytes: &[u8]) -> Result<()> {
        match self {
            OutputTarget::File(path) => write_file(path, bytes),
            OutputTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(bytes)
                    .and_then(|_| stdout.flush())
                    .map_err(|source| Error::SinkWrite {
                        path: PathBuf::from("<stdout>"),
                        source,
                    })
            }
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::File(path) => {
                let shown = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
                write!(f, "{}", shown.display())
            }
            OutputTarget::Stdout => write!(f, "<stdout>"),
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let sink_error = |source| Error::SinkWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(path).map_err(sink_error)?;
    if let Err(source) = file.write_all(bytes).and_then(|_| file.sync_all()) {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            debug!("Failed to remove partial artifact {}: {}", path.display(), e);
        }
        return Err(sink_error(source));
    }
    Ok(())
}
