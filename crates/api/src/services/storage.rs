//! File storage for source documents, deliverables and invoices.
//!
//! Paths handed out and stored in the database are relative to the storage
//! root and always use `/` separators.

use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

const MAX_NAME_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores an uploaded source document for a request.
    pub async fn save_source(
        &self,
        request_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let relative = format!("sources/{}/{}", request_id, safe_file_name(file_name));
        self.write(&relative, bytes).await?;
        Ok(relative)
    }

    /// Stores a deliverable under the job's directory with a timestamp prefix.
    ///
    /// A second delivery within the same second gets a `-N` counter after the
    /// timestamp instead of replacing the earlier file.
    pub async fn save_deliverable(
        &self,
        job_id: Uuid,
        file_name: &str,
        bytes: &[u8],
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let stamp = now.format("%Y%m%d%H%M%S").to_string();
        let name = safe_file_name(file_name);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let relative = if attempt == 0 {
                format!("deliverables/{}/{}_{}", job_id, stamp, name)
            } else {
                format!("deliverables/{}/{}-{}_{}", job_id, stamp, attempt, name)
            };
            if self.write_new(&relative, bytes).await? {
                return Ok(relative);
            }
        }
        Err(StorageError::InvalidPath(format!(
            "deliverables/{}/{}_{}: too many files with this name",
            job_id, stamp, name
        )))
    }

    /// Writes only if nothing exists at `relative`. Returns false when taken.
    async fn write_new(&self, relative: &str, bytes: &[u8]) -> Result<bool, StorageError> {
        use tokio::io::AsyncWriteExt;

        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(true)
    }

    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Maps a stored relative path onto the root, refusing anything that
    /// could escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if relative.is_empty() || escapes {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

/// Last path segment of an uploaded name, restricted to a portable character set.
pub fn safe_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// File name shown to users for a stored path.
pub fn display_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("report final.docx"), "report_final.docx");
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\docs\\brief.txt"), "brief.txt");
        assert_eq!(safe_file_name(".."), "file");
        assert_eq!(safe_file_name(".hidden"), "hidden");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("deliverables/abc/20260101120000_a.txt"), "20260101120000_a.txt");
        assert_eq!(display_name("plain.txt"), "plain.txt");
    }

    #[tokio::test]
    async fn test_deliverable_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let job_id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();

        let path = storage
            .save_deliverable(job_id, "final version.txt", b"ciao", now)
            .await
            .unwrap();

        assert_eq!(
            path,
            format!("deliverables/{}/20260314092653_final_version.txt", job_id)
        );
        assert_eq!(storage.read(&path).await.unwrap(), b"ciao");
    }

    #[tokio::test]
    async fn test_repeated_deliveries_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let job_id = Uuid::new_v4();
        let first = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 1).unwrap();

        let a = storage.save_deliverable(job_id, "t.txt", b"1", first).await.unwrap();
        let b = storage.save_deliverable(job_id, "t.txt", b"2", second).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(storage.read(&a).await.unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_redelivery_within_one_second_keeps_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let job_id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();

        let first = storage.save_deliverable(job_id, "t.txt", b"first", at).await.unwrap();
        let second = storage.save_deliverable(job_id, "t.txt", b"second", at).await.unwrap();
        let third = storage.save_deliverable(job_id, "t.txt", b"third", at).await.unwrap();

        assert_eq!(first, format!("deliverables/{}/20260314090000_t.txt", job_id));
        assert_eq!(second, format!("deliverables/{}/20260314090000-1_t.txt", job_id));
        assert_eq!(third, format!("deliverables/{}/20260314090000-2_t.txt", job_id));
        assert_eq!(storage.read(&first).await.unwrap(), b"first");
        assert_eq!(storage.read(&second).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let id = Uuid::new_v4();

        let path = storage.save_source(id, "brief.md", b"# hi").await.unwrap();
        assert_eq!(path, format!("sources/{}/brief.md", id));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.read("../secret").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.write("/abs/path", b"x").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(matches!(
            storage.read("invoices/invoice_1.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
