use std::path::{Path, PathBuf};

use rand::Rng;

/// URL prefix the uploads directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Stores uploaded images on local disk under randomized names.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the bytes under a fresh name and return the public path.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = random_file_name(original_name);
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        tracing::debug!("Stored upload {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{}/{}", UPLOADS_URL_PREFIX, file_name))
    }

    /// Best-effort removal of a previously saved image, by public path.
    pub async fn remove(&self, public_path: &str) {
        let Some(file_name) = public_path
            .strip_prefix(UPLOADS_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.contains('/') && !name.contains(".."))
        else {
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await {
            tracing::warn!("Failed to remove orphaned upload {}: {}", file_name, e);
        }
    }
}

/// Image types accepted for upload, served back with the type their extension implies.
const IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

/// True when the file name maps to one of the accepted raster image types.
pub fn is_allowed_image(file_name: &str) -> bool {
    mime_guess::from_path(file_name)
        .first()
        .is_some_and(|mime| IMAGE_TYPES.contains(&mime.essence_str()))
}

/// 32 hex characters plus the original extension, if it has a sane one.
pub fn random_file_name(original_name: Option<&str>) -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    let stem = hex::encode(bytes);

    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_images_are_allowed() {
        for name in ["a.png", "b.JPG", "c.jpeg", "d.gif", "e.webp"] {
            assert!(is_allowed_image(name), "{name}");
        }
    }

    #[test]
    fn markup_and_unknown_types_are_refused() {
        for name in ["evil.html", "x.svg", "page.htm", "script.js", "README", "a.png.html"] {
            assert!(!is_allowed_image(name), "{name}");
        }
    }

    #[test]
    fn random_name_keeps_extension() {
        let name = random_file_name(Some("holiday photo.JPG"));
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(stem.len(), 32);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn random_name_without_extension() {
        let name = random_file_name(Some("README"));
        assert_eq!(name.len(), 32);
        assert_eq!(random_file_name(None).len(), 32);
    }

    #[test]
    fn random_name_drops_odd_extensions() {
        assert_eq!(random_file_name(Some("x.p?ng")).len(), 32);
    }

    #[test]
    fn random_names_differ() {
        assert_ne!(random_file_name(Some("a.png")), random_file_name(Some("a.png")));
    }

    #[tokio::test]
    async fn save_and_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ImageStore::new(tmp.path().join("uploads"));

        let public = store.save(Some("cat.png"), b"\x89PNG").await.unwrap();
        assert!(public.starts_with("/uploads/"));
        assert!(public.ends_with(".png"));

        let file_name = public.trim_start_matches("/uploads/");
        let on_disk = store.dir().join(file_name);
        assert_eq!(std::fs::read(&on_disk).unwrap(), b"\x89PNG");

        store.remove(&public).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn remove_ignores_paths_outside_uploads() {
        let tmp = tempfile::tempdir().unwrap();
        let keep = tmp.path().join("keep.txt");
        std::fs::write(&keep, "x").unwrap();

        let store = ImageStore::new(tmp.path().join("uploads"));
        store.remove("/uploads/../keep.txt").await;
        store.remove("/elsewhere/keep.txt").await;
        assert!(keep.exists());
    }
}
