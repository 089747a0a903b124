//! # Local media storage
//!
//! Writes validated image uploads under a root directory:
//! `<root>/<category>/<prefix>-<uuid>.<ext>`, referenced by clients as
//! `uploads/<category>/<file>`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{DomainError, MediaKind, MediaStorage};
use image::ImageFormat;
use tokio::fs;
use uuid::Uuid;

/// Public prefix of every path handed back by [`LocalMediaStorage`].
pub const PUBLIC_PREFIX: &str = "uploads";

pub struct LocalMediaStorage {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `uploads/<category>/<file>` back onto the disk. Anything that
    /// could escape the root is refused.
    fn resolve(&self, public: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(public)
            .strip_prefix(PUBLIC_PREFIX)
            .map_err(|_| anyhow::anyhow!("not a media path: {public}"))?;
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("not a media path: {public}");
        }
        Ok(self.root.join(relative))
    }
}

fn reject(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(DomainError::validation(message))
}

/// Accepted extensions and the format their content must sniff as.
fn expected_format(file_name: &str) -> Option<(&'static str, ImageFormat)> {
    let mime = mime_guess::from_path(file_name).first()?;
    if mime == mime::IMAGE_JPEG {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        let ext = if ext == "jpeg" { "jpeg" } else { "jpg" };
        Some((ext, ImageFormat::Jpeg))
    } else if mime == mime::IMAGE_PNG {
        Some(("png", ImageFormat::Png))
    } else if mime == mime::IMAGE_GIF {
        Some(("gif", ImageFormat::Gif))
    } else {
        None
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store_image(&self, kind: MediaKind, file_name: &str, data: Bytes) -> anyhow::Result<String> {
        let (ext, format) = expected_format(file_name)
            .ok_or_else(|| reject("Only image files are allowed (jpeg, jpg, png, gif)"))?;
        if data.is_empty() {
            return Err(reject("Uploaded file is empty"));
        }
        if data.len() > self.max_bytes {
            return Err(reject(format!(
                "File too large; the limit is {} bytes",
                self.max_bytes
            )));
        }
        match image::guess_format(&data) {
            Ok(sniffed) if sniffed == format => {}
            _ => return Err(reject("Uploaded file is not a valid image")),
        }

        let file = format!("{}-{}.{ext}", kind.prefix(), Uuid::now_v7());
        let dir = self.root.join(kind.category());
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(&file), &data).await?;

        let public = format!("{PUBLIC_PREFIX}/{}/{file}", kind.category());
        tracing::debug!(path = %public, bytes = data.len(), "image stored");
        Ok(public)
    }

    async fn remove(&self, path: &str) -> anyhow::Result<()> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const GIF_MAGIC: &[u8] = b"GIF89a\x01\0\x01\0";

    fn storage(dir: &TempDir) -> LocalMediaStorage {
        LocalMediaStorage::new(dir.path(), 64)
    }

    fn rejection(err: anyhow::Error) -> DomainError {
        DomainError::from(err)
    }

    #[tokio::test]
    async fn stores_under_category_and_removes() {
        let dir = TempDir::new().unwrap();
        let media = storage(&dir);

        let path = media
            .store_image(MediaKind::SchoolLogo, "Crest.PNG", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();
        assert!(path.starts_with("uploads/schools/logo-"));
        assert!(path.ends_with(".png"));

        let on_disk = media.resolve(&path).unwrap();
        assert_eq!(std::fs::read(&on_disk).unwrap(), PNG_MAGIC);

        media.remove(&path).await.unwrap();
        assert!(!on_disk.exists());
        // Already gone is fine.
        media.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let err = storage(&dir)
            .store_image(MediaKind::EventBanner, "notes.pdf", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap_err();
        assert!(matches!(rejection(err), DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_content_that_is_not_the_claimed_image() {
        let dir = TempDir::new().unwrap();
        let media = storage(&dir);
        let err = media
            .store_image(MediaKind::EventBanner, "banner.png", Bytes::from_static(b"plain text"))
            .await
            .unwrap_err();
        assert!(matches!(rejection(err), DomainError::Validation(_)));

        let err = media
            .store_image(MediaKind::EventBanner, "banner.png", Bytes::from_static(GIF_MAGIC))
            .await
            .unwrap_err();
        assert!(matches!(rejection(err), DomainError::Validation(_)));
        assert!(!dir.path().join("events").exists());
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let dir = TempDir::new().unwrap();
        let mut big = PNG_MAGIC.to_vec();
        big.resize(65, 0);
        let err = storage(&dir)
            .store_image(MediaKind::SchoolBanner, "big.png", Bytes::from(big))
            .await
            .unwrap_err();
        assert!(matches!(rejection(err), DomainError::Validation(msg) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn gif_keeps_its_extension() {
        let dir = TempDir::new().unwrap();
        let path = storage(&dir)
            .store_image(MediaKind::EventBanner, "party.gif", Bytes::from_static(GIF_MAGIC))
            .await
            .unwrap();
        assert!(path.starts_with("uploads/events/banner-"));
        assert!(path.ends_with(".gif"));
    }

    #[test]
    fn refuses_paths_outside_root() {
        let dir = TempDir::new().unwrap();
        let media = storage(&dir);
        assert!(media.resolve("uploads/../etc/passwd").is_err());
        assert!(media.resolve("elsewhere/schools/a.png").is_err());
        assert!(media.resolve("uploads/schools/a.png").is_ok());
    }
}
