//! Filesystem store for uploaded attachments.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use callbackdesk_core::attachment::{
    generate_stored_name, public_reference, stored_name_from_reference, validate_upload_size,
    validate_upload_type,
};
use callbackdesk_core::callback::AttachmentRef;
use callbackdesk_core::error::CoreError;

/// How many fresh names to try if a generated name is already taken.
const NAME_ATTEMPTS: usize = 3;

/// Directory of stored attachments, addressed by `/uploads/<name>` references.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    /// Open (creating if needed) the attachment directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Persistence(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and store an upload, returning its public reference and the
    /// original filename for display.
    pub async fn save(
        &self,
        original_name: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<AttachmentRef, CoreError> {
        let original_name = display_name(original_name);
        let ext = validate_upload_type(original_name, content_type)?;
        validate_upload_size(data.len() as u64)?;

        for _ in 0..NAME_ATTEMPTS {
            let stored_name = generate_stored_name(&ext);
            let path = self.dir.join(&stored_name);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(CoreError::Persistence(format!("{}: {e}", path.display()))),
            };

            let written = async {
                file.write_all(data).await?;
                file.flush().await
            }
            .await;

            if let Err(e) = written {
                let _ = fs::remove_file(&path).await;
                return Err(CoreError::Persistence(format!("{}: {e}", path.display())));
            }

            tracing::info!(
                stored_name = %stored_name,
                original_name = %original_name,
                size_bytes = data.len(),
                "Attachment stored"
            );
            return Ok(public_reference(&stored_name, original_name));
        }

        Err(CoreError::Internal(
            "Could not allocate a unique attachment name".to_string(),
        ))
    }

    /// Filesystem path behind a public reference, if it names a file inside
    /// this store.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        stored_name_from_reference(reference).map(|name| self.dir.join(name))
    }

    /// Remove the file behind a reference. Returns `Ok(false)` when there was
    /// nothing to remove (already gone, or not a reference into this store).
    pub async fn remove(&self, reference: &str) -> Result<bool, CoreError> {
        let Some(path) = self.resolve(reference) else {
            tracing::warn!(reference, "Ignoring attachment reference outside the upload store");
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Attachment removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CoreError::Persistence(format!("{}: {e}", path.display()))),
        }
    }
}

/// Strip any client-side directory components from an uploaded filename.
fn display_name(original_name: &str) -> &str {
    original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name)
        .trim()
}
