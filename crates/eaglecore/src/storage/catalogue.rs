//! Disk storage for provider catalogues (PDF uploads).
//!
//! Files are stored as `{media_root}/catalogues/{telegram_user_id}_{file_name}`.
//! Saving is best-effort: every failure is logged and reported as
//! `CatalogueOutcome::NotSaved`, never as an error.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::core::config;
use crate::core::utils::slugify;

/// Fetches an uploaded file's bytes from the messaging platform.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch(&self, file_id: &str) -> anyhow::Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueOutcome {
    /// Path relative to the media root, as stored on the provider
    Saved(String),
    NotSaved,
}

impl CatalogueOutcome {
    pub fn path(&self) -> Option<&str> {
        match self {
            CatalogueOutcome::Saved(path) => Some(path),
            CatalogueOutcome::NotSaved => None,
        }
    }
}

pub struct CatalogueStore {
    media_root: PathBuf,
    timeout: Duration,
}

impl CatalogueStore {
    pub fn new(media_root: &str) -> Self {
        let expanded = shellexpand::tilde(media_root).into_owned();
        Self {
            media_root: PathBuf::from(expanded),
            timeout: config::catalogue::download_timeout(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    /// Relative storage path for a user's upload. Only the last component of
    /// the original name is kept.
    pub fn relative_path(telegram_user_id: i64, file_name: &str) -> String {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("catalogue.pdf");
        format!("{}/{}_{}", config::catalogue::DIR_NAME, telegram_user_id, base)
    }

    /// Absolute location of a stored catalogue path. Paths that are absolute
    /// or step outside the media root resolve to `None`.
    pub fn resolve(&self, stored: &str) -> Option<PathBuf> {
        let relative = Path::new(stored);
        let inside = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if stored.is_empty() || !inside {
            return None;
        }
        Some(self.media_root.join(relative))
    }

    /// File name a catalogue is sent under, e.g. `lash-by-sarah_catalogue.pdf`
    pub fn download_name(provider_name: &str) -> String {
        let cleaned: String = provider_name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        match slugify(&cleaned).as_str() {
            "" => "catalogue.pdf".to_string(),
            slug => format!("{}_catalogue.pdf", slug),
        }
    }

    /// Downloads `file_id` and writes it under the media root.
    pub async fn save(
        &self,
        fetcher: &dyn FileFetcher,
        telegram_user_id: i64,
        file_id: &str,
        file_name: &str,
    ) -> CatalogueOutcome {
        let bytes = match tokio::time::timeout(self.timeout, fetcher.fetch(file_id)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                log::warn!("Catalogue: download of {} for user {} failed: {}", file_id, telegram_user_id, e);
                return CatalogueOutcome::NotSaved;
            }
            Err(_) => {
                log::warn!(
                    "Catalogue: download of {} for user {} timed out after {:?}",
                    file_id,
                    telegram_user_id,
                    self.timeout
                );
                return CatalogueOutcome::NotSaved;
            }
        };

        let relative = Self::relative_path(telegram_user_id, file_name);
        let full = self.media_root.join(&relative);

        if let Some(parent) = full.parent() {
            if let Err(e) = fs_err::tokio::create_dir_all(parent).await {
                log::warn!("Catalogue: {}", e);
                return CatalogueOutcome::NotSaved;
            }
        }

        match fs_err::tokio::write(&full, &bytes).await {
            Ok(()) => {
                log::info!("Catalogue: saved {} ({} bytes)", full.display(), bytes.len());
                CatalogueOutcome::Saved(relative)
            }
            Err(e) => {
                log::warn!("Catalogue: {}", e);
                CatalogueOutcome::NotSaved
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl FileFetcher for StaticFetcher {
        async fn fetch(&self, _file_id: &str) -> anyhow::Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl FileFetcher for FailingFetcher {
        async fn fetch(&self, _file_id: &str) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("file is too big")
        }
    }

    struct SlowFetcher;

    #[async_trait]
    impl FileFetcher for SlowFetcher {
        async fn fetch(&self, _file_id: &str) -> anyhow::Result<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    fn make_store() -> (TempDir, CatalogueStore) {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let store = CatalogueStore::new(dir.path().to_str().unwrap());
        (dir, store)
    }

    #[test]
    fn test_relative_path_uses_user_id_and_file_name() {
        assert_eq!(CatalogueStore::relative_path(42, "menu.pdf"), "catalogues/42_menu.pdf");
        assert_eq!(CatalogueStore::relative_path(42, "../../etc/menu.pdf"), "catalogues/42_menu.pdf");
    }

    #[test]
    fn test_resolve_stays_under_media_root() {
        let (dir, store) = make_store();
        assert_eq!(
            store.resolve("catalogues/42_menu.pdf"),
            Some(dir.path().join("catalogues/42_menu.pdf"))
        );
        assert_eq!(store.resolve("../secrets.pdf"), None);
        assert_eq!(store.resolve("catalogues/../../etc/passwd"), None);
        assert_eq!(store.resolve("/etc/passwd"), None);
        assert_eq!(store.resolve(""), None);
    }

    #[test]
    fn test_download_name() {
        assert_eq!(CatalogueStore::download_name("Lash by Sarah"), "lash-by-sarah_catalogue.pdf");
        assert_eq!(CatalogueStore::download_name("Tee's/Shop"), "tee-s-shop_catalogue.pdf");
        assert_eq!(CatalogueStore::download_name("!!!"), "catalogue.pdf");
    }

    #[tokio::test]
    async fn test_save_writes_file_under_media_root() {
        let (dir, store) = make_store();
        let outcome = store
            .save(&StaticFetcher(b"%PDF-1.4".to_vec()), 42, "file-1", "Prices.PDF")
            .await;

        assert_eq!(outcome, CatalogueOutcome::Saved("catalogues/42_Prices.PDF".to_string()));
        let written = std::fs::read(dir.path().join("catalogues/42_Prices.PDF")).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_save_reports_not_saved_on_download_error() {
        let (dir, store) = make_store();
        let outcome = store.save(&FailingFetcher, 42, "file-1", "menu.pdf").await;

        assert_eq!(outcome, CatalogueOutcome::NotSaved);
        assert!(outcome.path().is_none());
        assert!(!dir.path().join("catalogues/42_menu.pdf").exists());
    }

    #[tokio::test]
    async fn test_save_gives_up_after_timeout() {
        let (_dir, store) = make_store();
        let store = store.with_timeout(Duration::from_millis(20));
        let outcome = store.save(&SlowFetcher, 42, "file-1", "menu.pdf").await;
        assert_eq!(outcome, CatalogueOutcome::NotSaved);
    }
}
