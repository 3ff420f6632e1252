use clean_blog::storage::{
    LocalDiskStore, MockUploadStore, PUBLIC_UPLOAD_PREFIX, UploadStore, generate_image_name,
};
use uuid::Uuid;

// --- Filename Generation ---

#[cfg(test)]
mod name_tests {
    use super::*;

    #[test]
    fn test_extension_is_preserved() {
        let name = generate_image_name("photo.jpg");
        assert!(name.starts_with("image-"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_only_last_extension_survives() {
        let name = generate_image_name("archive.tar.gz");
        assert!(name.ends_with(".gz"));
        assert!(!name.contains(".tar"));
    }

    #[test]
    fn test_names_are_collision_resistant() {
        // Two uploads of the same file in the same millisecond still differ.
        let a = generate_image_name("photo.png");
        let b = generate_image_name("photo.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_client_names_cannot_traverse() {
        let name = generate_image_name("../../etc/passwd");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
        // Nothing usable remains, so the fallback extension applies.
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_extension_is_sanitized() {
        let name = generate_image_name("weird.P-NG");
        assert!(name.ends_with(".png"));

        let name = generate_image_name("noextension");
        assert!(name.ends_with(".bin"));
    }
}

// --- Mock Store ---

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockUploadStore::new();
        let result = mock.store_image("photo.jpg", &[1, 2, 3]).await;
        assert!(result.is_ok());

        let path = result.unwrap();
        assert!(path.starts_with(PUBLIC_UPLOAD_PREFIX));
        assert!(path.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockUploadStore::new_failing();
        let result = mock.store_image("photo.jpg", &[1, 2, 3]).await;
        assert!(result.is_err());
    }
}

// --- Local Disk Store ---

#[cfg(test)]
mod disk_tests {
    use super::*;

    fn temp_uploads_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("clean-blog-uploads-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_store_image_writes_file_and_returns_public_path() {
        let dir = temp_uploads_dir();
        let store = LocalDiskStore::new(dir.to_str().unwrap());

        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let path = store
            .store_image("photo.jpg", &bytes)
            .await
            .expect("store should succeed");

        assert!(path.starts_with("/img/uploads/"));
        assert!(path.ends_with(".jpg"));

        // The file on disk carries the generated name from the public path.
        let filename = path.rsplit('/').next().unwrap();
        let written = tokio::fs::read(dir.join(filename)).await.unwrap();
        assert_eq!(written, bytes);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_store_creates_missing_directory() {
        // A fresh deployment has no uploads directory yet.
        let dir = temp_uploads_dir().join("nested/deeper");
        let store = LocalDiskStore::new(dir.to_str().unwrap());

        let result = store.store_image("photo.png", &[1]).await;
        assert!(result.is_ok());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_ensure_upload_dir_is_idempotent() {
        let dir = temp_uploads_dir();
        let store = LocalDiskStore::new(dir.to_str().unwrap());

        store.ensure_upload_dir().await;
        store.ensure_upload_dir().await;
        assert!(dir.is_dir());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_concurrent_stores_do_not_collide() {
        let dir = temp_uploads_dir();
        let store = LocalDiskStore::new(dir.to_str().unwrap());

        let a = store.store_image("same.png", &[1]).await.unwrap();
        let b = store.store_image("same.png", &[2]).await.unwrap();
        assert_ne!(a, b);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
