//! Upload policy for callback attachments.
//!
//! Decides which uploads are accepted (extension and declared content type
//! allow-lists, size cap), how stored files are named, and how public
//! references map back to stored file names. Filesystem I/O lives in the
//! db crate's `AttachmentStore`.

use rand::Rng;

use crate::callback::AttachmentRef;
use crate::error::CoreError;

/// Maximum accepted attachment size (10 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// URL prefix under which stored attachments are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

/// Accepted file extensions (lower-case, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "dwg", "dxf",
];

/// Content types browsers send for the accepted formats. CAD drawings usually
/// arrive as `application/octet-stream`.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/pjpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/acad",
    "application/x-acad",
    "application/autocad_dwg",
    "application/dwg",
    "application/x-dwg",
    "image/vnd.dwg",
    "image/x-dwg",
    "application/dxf",
    "application/x-dxf",
    "image/vnd.dxf",
    "image/x-dxf",
    "application/octet-stream",
];

/// Lower-cased extension of `file_name`, if it has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check the original filename and the declared content type against the
/// allow-lists. Returns the accepted extension.
pub fn validate_upload_type(
    file_name: &str,
    content_type: Option<&str>,
) -> Result<String, CoreError> {
    let ext = extension_of(file_name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| {
            CoreError::UnsupportedMediaType(format!(
                "File type of '{file_name}' is not supported. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

    if let Some(content_type) = content_type {
        // Ignore parameters such as `; charset=binary`.
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(CoreError::UnsupportedMediaType(format!(
                "Content type '{essence}' is not supported"
            )));
        }
    }

    Ok(ext)
}

/// Reject uploads larger than [`MAX_ATTACHMENT_BYTES`].
pub fn validate_upload_size(len: u64) -> Result<(), CoreError> {
    if len > MAX_ATTACHMENT_BYTES {
        return Err(CoreError::PayloadTooLarge {
            limit_bytes: MAX_ATTACHMENT_BYTES,
        });
    }
    Ok(())
}

/// Generate a collision-resistant stored name: `<unix millis>-<random><.ext>`.
pub fn generate_stored_name(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{millis}-{suffix}.{ext}")
}

/// Public reference for a stored file.
pub fn public_reference(stored_name: &str, original_name: &str) -> AttachmentRef {
    AttachmentRef {
        file: format!("{PUBLIC_PREFIX}{stored_name}"),
        file_name: original_name.to_string(),
    }
}

/// Map a public reference back to its stored file name.
///
/// Returns `None` for anything that is not a single plain path segment under
/// [`PUBLIC_PREFIX`], so a tampered document cannot point outside the uploads
/// directory.
pub fn stored_name_from_reference(reference: &str) -> Option<&str> {
    let name = reference.strip_prefix(PUBLIC_PREFIX)?;
    let is_plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    is_plain.then_some(name)
}
