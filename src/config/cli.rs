use crate::core::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;

/// Filesystem `Storage` rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        tracing::trace!("Reading {}", full_path.display());
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.full_path(path))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_relative_to_base() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cohorts.csv"), "id,name\n1,Promo\n").unwrap();
        let storage = LocalStorage::new(dir.path());

        assert!(storage.exists("cohorts.csv").await);
        assert!(!storage.exists("missing.csv").await);
        assert_eq!(
            storage.read_file("cohorts.csv").await.unwrap(),
            b"id,name\n1,Promo\n".to_vec()
        );
        assert!(storage.read_file("missing.csv").await.is_err());
    }
}
