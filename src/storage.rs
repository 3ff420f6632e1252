use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Public URL prefix under which stored images are served. Post records keep
/// the full public path so the frontend can use it verbatim.
pub const PUBLIC_UPLOAD_PREFIX: &str = "/img/uploads";

// 1. UploadStore Contract
/// UploadStore
///
/// Abstract contract for image persistence. Handlers only see this trait, so
/// the concrete implementation can be swapped between the on-disk store used
/// by the running server and the in-memory mock used in tests.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Ensures the upload directory exists. Called at local startup so a fresh
    /// checkout can accept uploads immediately. No-op in the mock.
    async fn ensure_upload_dir(&self);

    /// Persists one image and returns its public URL path
    /// (`/img/uploads/<generated-name>`).
    ///
    /// # Arguments
    /// * `original_filename`: the client-supplied filename, used only to carry
    ///   over the extension.
    /// * `bytes`: the raw image contents, already size- and type-checked by the
    ///   caller.
    async fn store_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String, String>;
}

/// UploadState
///
/// The concrete type used to share the upload store across the application state.
pub type UploadState = Arc<dyn UploadStore>;

/// generate_image_name
///
/// Collision-resistant filename: millisecond timestamp plus a random suffix,
/// keeping only a sanitized version of the original extension. Concurrent
/// uploads therefore never collide and client-controlled names never reach
/// the filesystem.
pub fn generate_image_name(original_filename: &str) -> String {
    let extension = sanitize_extension(original_filename);
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("image-{}-{}.{}", Utc::now().timestamp_millis(), suffix, extension)
}

/// sanitize_extension
///
/// Reduces a client-supplied filename to a safe extension: lowercase
/// alphanumerics only, capped in length, with a fallback when nothing usable
/// remains. Directory components never survive this.
fn sanitize_extension(filename: &str) -> String {
    let ext: String = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase();

    if ext.is_empty() { "bin".to_string() } else { ext }
}

// 2. The Real Implementation (Local Disk)
/// LocalDiskStore
///
/// Writes images into the configured uploads directory, which the deployment
/// serves under `/img/uploads`. The directory is created on demand so the
/// first upload on a fresh machine succeeds.
#[derive(Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(uploads_dir: &str) -> Self {
        Self {
            root: PathBuf::from(uploads_dir),
        }
    }
}

#[async_trait]
impl UploadStore for LocalDiskStore {
    async fn ensure_upload_dir(&self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.root).await {
            tracing::error!("failed to create uploads dir {:?}: {:?}", self.root, e);
        }
    }

    async fn store_image(&self, original_filename: &str, bytes: &[u8]) -> Result<String, String> {
        let name = generate_image_name(original_filename);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(self.root.join(&name), bytes)
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!("{}/{}", PUBLIC_UPLOAD_PREFIX, name))
    }
}

// 3. The Mock Implementation (For Tests)
/// MockUploadStore
///
/// In-memory stand-in for the upload store, so handler tests exercise the
/// creation flow without touching the filesystem.
#[derive(Clone)]
pub struct MockUploadStore {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MockUploadStore {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

impl Default for MockUploadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadStore for MockUploadStore {
    async fn ensure_upload_dir(&self) {
        // No-op in mock environment.
    }

    async fn store_image(&self, original_filename: &str, _bytes: &[u8]) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock upload error: simulation requested".to_string());
        }

        // Same naming scheme as the disk store, deterministically prefixed for
        // assertions.
        Ok(format!(
            "{}/{}",
            PUBLIC_UPLOAD_PREFIX,
            generate_image_name(original_filename)
        ))
    }
}
