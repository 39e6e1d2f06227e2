use std::io;
use std::path::{Path, PathBuf};

const ARTIFACT_EXTENSION: &str = ".mp3";
const PARTIAL_EXTENSION: &str = ".part";

/// Local filesystem store for assembled podcast files
pub struct ArtifactRepository {
    output_dir: PathBuf,
}

impl ArtifactRepository {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Artifact names are flat `.mp3` filenames, never paths
    pub fn is_valid_filename(filename: &str) -> bool {
        filename.len() > ARTIFACT_EXTENSION.len()
            && filename.ends_with(ARTIFACT_EXTENSION)
            && !filename.starts_with('.')
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    fn path_for(&self, filename: &str) -> io::Result<PathBuf> {
        if !Self::is_valid_filename(filename) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid artifact filename: {}", filename),
            ));
        }
        Ok(self.output_dir.join(filename))
    }

    /// Create the output directory and drop partial writes left by an
    /// interrupted run
    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let mut entries = tokio::fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_name().to_string_lossy().ends_with(PARTIAL_EXTENSION) {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => tracing::info!(path = %path.display(), "Removed partial artifact"),
                Err(e) => tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to remove partial artifact"
                ),
            }
        }

        Ok(())
    }

    /// Write the artifact, making it visible under its final name only once complete
    pub async fn write(&self, filename: &str, data: &[u8]) -> io::Result<u64> {
        let path = self.path_for(filename)?;
        let partial = self
            .output_dir
            .join(format!("{}{}", filename, PARTIAL_EXTENSION));

        tokio::fs::write(&partial, data).await?;
        if let Err(e) = tokio::fs::rename(&partial, &path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            size_bytes = data.len(),
            "Artifact written"
        );

        Ok(data.len() as u64)
    }

    pub async fn read(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        let path = match self.path_for(filename) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Synchronous delete, for use from cache eviction callbacks
    pub fn delete_blocking(&self, filename: &str) {
        let Ok(path) = self.path_for(filename) else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "Expired artifact deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to delete expired artifact"
            ),
        }
    }

    pub async fn is_ready(&self) -> bool {
        tokio::fs::metadata(&self.output_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
