//! Local staging of uploaded files

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::types::JobId;

/// Name used when the client sends no usable filename
const FALLBACK_FILENAME: &str = "upload.bin";

/// A staged upload on local disk
///
/// The file is removed by [`StagedFile::remove`], or when the guard is
/// dropped without a successful removal (errors, panics, cancelled tasks).
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file_name: String,
    removed: bool,
}

impl StagedFile {
    /// Take ownership of an existing file staged for `file_name`
    pub fn new(path: PathBuf, file_name: impl Into<String>) -> Self {
        Self {
            path,
            file_name: file_name.into(),
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitized client filename, without the job id prefix
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Delete the file. A file that is already gone counts as removed.
    ///
    /// On error the guard stays armed and tries again when dropped.
    pub async fn remove(&mut self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        self.removed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed staged file {} on drop", self.path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!("Failed to remove staged file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Reduce a client-supplied filename to a safe single path component
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(&['/', '\\'][..])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned
    }
}

/// Whether `name` has the `<job_id>-` prefix given to staged files
fn is_staged_name(name: &str) -> bool {
    match (name.get(..36), name.get(36..37)) {
        (Some(id), Some("-")) => id.parse::<JobId>().is_ok(),
        _ => false,
    }
}

/// Stream an upload into `<staging_dir>/<job_id>-<filename>`
///
/// Any failure removes the partial file. A body over the size limit is
/// reported as [`Error::PayloadTooLarge`].
pub async fn stage_upload<S, E>(
    staging_dir: &Path,
    job_id: &JobId,
    filename: &str,
    body: S,
) -> Result<StagedFile>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<Error>,
{
    let mut body = std::pin::pin!(body);
    let file_name = sanitize_filename(filename);
    let path = staging_dir.join(format!("{}-{}", job_id, file_name));

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| Error::staging(filename, e.to_string()))?;
    let staged = StagedFile::new(path, file_name);

    let mut size = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| match e.into() {
            too_large @ Error::PayloadTooLarge(_) => too_large,
            other => Error::staging(filename, format!("Upload interrupted: {}", other)),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::staging(filename, e.to_string()))?;
        size += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| Error::staging(filename, e.to_string()))?;

    tracing::info!(
        job_id = %job_id,
        "Staged '{}' ({} bytes) at {}",
        filename,
        size,
        staged.path().display()
    );

    Ok(staged)
}

/// Delete files left in the staging directory by a previous run
///
/// Only files named like a staged upload are touched. Only call before any
/// job is dispatched.
pub async fn purge_staging_dir(staging_dir: &Path) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(staging_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if !entry.file_name().to_str().is_some_and(is_staged_name) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Could not remove orphaned file {}: {}", entry.path().display(), e),
        }
    }

    if removed > 0 {
        tracing::info!("Removed {} orphaned staged files from {}", removed, staging_dir.display());
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = std::io::Result<Bytes>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(*p)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("movie.torrent"), "movie.torrent");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\a b.iso"), "a_b.iso");
        assert_eq!(sanitize_filename(""), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("dir/"), FALLBACK_FILENAME);
        assert_eq!(sanitize_filename("фильм 2.torrent"), "фильм_2.torrent");
        assert_eq!(sanitize_filename("a\u{0}b\tc.iso"), "a_b_c.iso");
    }

    #[tokio::test]
    async fn test_stage_writes_all_chunks() {
        let dir = TempDir::new().unwrap();
        let id = JobId::new();

        let staged = stage_upload(dir.path(), &id, "x.torrent", chunks(&[b"hello ", b"world"]))
            .await
            .unwrap();

        assert_eq!(
            staged.path(),
            dir.path().join(format!("{}-x.torrent", id)).as_path()
        );
        assert_eq!(staged.file_name(), "x.torrent");
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_interrupted_stream_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
        ]);

        let result = stage_upload(dir.path(), &JobId::new(), "x.bin", body).await;

        assert!(matches!(result, Err(Error::Staging { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_staging_dir_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let result = stage_upload(&missing, &JobId::new(), "x.bin", chunks(&[b"data"])).await;
        assert!(matches!(result, Err(Error::Staging { .. })));
    }

    #[tokio::test]
    async fn test_guard_removes_on_drop_and_remove() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"a").unwrap();
        std::fs::write(&b, b"b").unwrap();

        drop(StagedFile::new(a.clone(), "a"));
        assert!(!a.exists());

        let mut staged = StagedFile::new(b.clone(), "b");
        staged.remove().await.unwrap();
        assert!(!b.exists());
        // Second removal of a missing file is fine
        staged.remove().await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_staging_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(format!("{}-old.torrent", JobId::new())), b"1").unwrap();
        std::fs::write(dir.path().join(format!("{}-upload.bin", JobId::new())), b"2").unwrap();
        std::fs::create_dir(dir.path().join(format!("{}-dir", JobId::new()))).unwrap();

        assert_eq!(purge_staging_dir(dir.path()).await.unwrap(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(purge_staging_dir(&dir.path().join("missing")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_leaves_foreign_files() {
        let dir = TempDir::new().unwrap();
        let foreign = [
            "someone-elses-file.db".to_string(),
            "not-a-uuid-at-all-but-long-enough-to-slice.txt".to_string(),
            // Job id without the separator
            format!("{}.json", JobId::new()),
        ];
        for name in &foreign {
            std::fs::write(dir.path().join(name), b"keep").unwrap();
        }
        let staged = dir.path().join(format!("{}-x.torrent", JobId::new()));
        std::fs::write(&staged, b"orphan").unwrap();

        assert_eq!(purge_staging_dir(dir.path()).await.unwrap(), 1);
        assert!(!staged.exists());
        for name in &foreign {
            assert!(dir.path().join(name).exists(), "{} was removed", name);
        }
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let dir = TempDir::new().unwrap();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::PayloadTooLarge("length limit exceeded".to_string())),
        ]);

        let result = stage_upload(dir.path(), &JobId::new(), "big.iso", body).await;

        assert!(matches!(result, Err(Error::PayloadTooLarge(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
