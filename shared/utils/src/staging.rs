use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::import::SourceFile;
use crate::validation::{file_extension, validate_file_size, validate_file_type};

/// An uploaded file persisted to disk for the lifetime of one import.
///
/// The temporary file is removed when the value is dropped, on success and
/// failure alike.
#[derive(Debug)]
pub struct StagedUpload {
    file_name: String,
    temp: NamedTempFile,
}

impl StagedUpload {
    /// Validate an upload and write it to the staging directory.
    pub fn stage(file_name: &str, bytes: &[u8], config: &ImportConfig) -> ImportResult<Self> {
        validate_file_type(file_name, &config.allowed_extensions)?;
        validate_file_size(file_name, bytes.len() as u64, config.max_file_size)?;

        // The extension is kept so the reader can pick a format from the path too.
        let suffix = file_extension(file_name)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let mut builder = tempfile::Builder::new();
        builder.prefix("academic-upload-").suffix(&suffix);

        let mut temp = match &config.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| ImportError::source_read(file_name, e))?;

        temp.write_all(bytes)
            .and_then(|_| temp.flush())
            .map_err(|e| ImportError::source_read(file_name, e))?;

        tracing::debug!(
            file_name,
            size = bytes.len(),
            path = %temp.path().display(),
            "Staged upload"
        );

        Ok(Self {
            file_name: file_name.to_string(),
            temp,
        })
    }

    /// Stage a file that already exists on disk, e.g. one named on the command line.
    pub fn stage_path(path: &Path, config: &ImportConfig) -> ImportResult<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        validate_file_type(&file_name, &config.allowed_extensions)?;
        let size = std::fs::metadata(path)
            .map_err(|e| ImportError::source_read(&file_name, e))?
            .len();
        validate_file_size(&file_name, size, config.max_file_size)?;

        let bytes = std::fs::read(path).map_err(|e| ImportError::source_read(&file_name, e))?;
        Self::stage(&file_name, &bytes, config)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Source descriptor that classifies by the declared upload name.
    pub fn source(&self) -> ImportResult<SourceFile> {
        SourceFile::new(self.path(), &self.file_name)
    }
}
