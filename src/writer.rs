use crate::{
    config::Config,
    error::{Error, Result},
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::debug;

/// Writes rendered PDFs to the output directory with atomic operations.
pub(crate) struct Writer {
    output_dir: PathBuf,
    backup_existing: bool,
}

impl Writer {
    /// Creates a new writer from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            backup_existing: config.backup_existing,
        }
    }

    /// Creates the output directory if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub(crate) fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))
    }

    /// Returns the output file path for a group key.
    pub(crate) fn output_path(&self, key: &str) -> PathBuf {
        self.output_dir.join(format!("{key}.pdf"))
    }

    /// Writes one PDF and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup, the temporary file or the final
    /// rename fails.
    pub(crate) fn write_pdf(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.output_path(key);
        self.write_file_atomic(&path, bytes)?;

        debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Writes a file atomically with optional backup.
    ///
    /// # Process
    ///
    /// 1. Creates backup if file exists and backup is enabled
    /// 2. Writes content to temporary file
    /// 3. Syncs temporary file to disk
    /// 4. Atomically renames temporary file to target path
    fn write_file_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        if path.exists() && self.backup_existing {
            self.backup_file(path)?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        let written = temp_file
            .write_all(content)
            .and_then(|()| temp_file.sync_all());
        drop(temp_file);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(&temp_path, e));
        }

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Moves an existing file aside as `<name>.<nanos>.bak`.
    fn backup_file(&self, path: &Path) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)?
            .as_nanos();

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_path = self.output_dir.join(format!("{filename}.{timestamp}.bak"));

        fs::rename(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }
}
