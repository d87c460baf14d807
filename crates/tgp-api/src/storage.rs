use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Uploads above this size are rejected before anything is persisted.
pub const MAX_DOCUMENT_SIZE: usize = 200 * 1024;

/// Durable storage for uploaded supporting documents.
///
/// Each document is written once to `{dir}/{uuid}.{ext}` and served
/// read-only under /files. The generated name keeps caller-supplied
/// filenames out of the filesystem path.
#[derive(Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Document storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Persist a document, returning the URL path it will be served from.
    pub async fn save(&self, bytes: &[u8], ext: &str) -> Result<String> {
        let ext: String = ext
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(8)
            .collect();
        let name = if ext.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), ext)
        };

        fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("/files/{name}"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> DocumentStore {
        let dir = std::env::temp_dir().join(format!("tgp-docs-{}", Uuid::new_v4()));
        DocumentStore::new(dir).await.unwrap()
    }

    #[tokio::test]
    async fn save_returns_served_url_and_writes_bytes() {
        let store = store().await;
        let url = store.save(b"%PDF-1.7 test", "pdf").await.unwrap();

        let name = url.strip_prefix("/files/").unwrap();
        assert!(name.ends_with(".pdf"));

        let on_disk = fs::read(store.dir().join(name)).await.unwrap();
        assert_eq!(on_disk, b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn hostile_extension_is_sanitized() {
        let store = store().await;
        let url = store.save(b"x", "p/../df").await.unwrap();
        assert!(!url.contains(".."));
        assert!(url.strip_prefix("/files/").unwrap().ends_with(".pdf"));
    }
}
