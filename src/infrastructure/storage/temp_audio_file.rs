use std::io;
use std::path::Path;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

const DEFAULT_SUFFIX: &str = ".audio";
const PREFIX: &str = "upload-";

/// An uploaded audio file spooled to a private temporary file.
///
/// The file is removed when this value is dropped or closed, so it cannot
/// outlive the request that created it.
#[derive(Debug)]
pub struct TempAudioFile {
    file: NamedTempFile,
    size: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to create temporary file: {0}")]
    Create(#[source] io::Error),
    #[error("failed to write upload: {0}")]
    Write(#[source] io::Error),
}

impl TempAudioFile {
    /// Writes `stream` to a new temp file in `dir` (or the system temp dir)
    /// whose suffix mirrors the extension of `filename`.
    pub async fn spool(
        dir: Option<&Path>,
        filename: &str,
        mut stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<Self, UploadError> {
        let suffix = upload_suffix(filename);
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX).suffix(&suffix);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(UploadError::Create)?;

        let handle = file.as_file().try_clone().map_err(UploadError::Create)?;
        let mut writer = tokio::fs::File::from_std(handle);
        let mut size: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(UploadError::Write)?;
            writer.write_all(&bytes).await.map_err(UploadError::Write)?;
            size += bytes.len() as u64;
        }
        writer.flush().await.map_err(UploadError::Write)?;

        tracing::debug!(path = %file.path().display(), bytes = size, "Upload spooled to temp file");

        Ok(Self { file, size })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Deletes the file, reporting any error instead of ignoring it as drop does.
    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }
}

/// `.wav` for `clip.wav`, `.audio` when the name has no extension.
pub fn upload_suffix(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_SUFFIX.to_string())
}
