//! Preview URL resolution shared by all backends.

use super::error::StorageError;

/// Extensions served directly as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

/// Extensions rendered through the external preview service.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// How a file type is previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Browser renders the access URL directly.
    Image,
    /// Preview service renders the document.
    Document,
}

/// Classify an extension.
///
/// # Errors
///
/// Returns `UnsupportedPreviewType` for anything that is neither an image
/// nor an office document.
pub fn classify(extension: &str) -> Result<PreviewKind, StorageError> {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(PreviewKind::Image)
    } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        Ok(PreviewKind::Document)
    } else {
        Err(StorageError::UnsupportedPreviewType(extension.to_string()))
    }
}

/// Build the preview URL for a file from its access URL.
///
/// # Errors
///
/// Returns `UnsupportedPreviewType` for unknown extensions and a
/// configuration error if a document needs the preview service but none is
/// configured.
pub fn preview_url(
    preview_base: &str,
    extension: &str,
    access_url: &str,
) -> Result<String, StorageError> {
    match classify(extension)? {
        PreviewKind::Image => Ok(access_url.to_string()),
        PreviewKind::Document => {
            if preview_base.is_empty() {
                return Err(StorageError::configuration(
                    "preview_url is required for document previews",
                ));
            }
            let separator = if preview_base.contains('?') { '&' } else { '?' };
            Ok(format!(
                "{preview_base}{separator}url={}",
                urlencoding::encode(access_url)
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("png", PreviewKind::Image)]
    #[case("JPEG", PreviewKind::Image)]
    #[case("pdf", PreviewKind::Document)]
    #[case(".docx", PreviewKind::Document)]
    #[case("pptx", PreviewKind::Document)]
    fn test_classify(#[case] ext: &str, #[case] kind: PreviewKind) {
        assert_eq!(classify(ext).unwrap(), kind);
    }

    #[rstest]
    #[case("exe")]
    #[case("zip")]
    #[case("")]
    fn test_classify_unsupported(#[case] ext: &str) {
        assert!(matches!(
            classify(ext),
            Err(StorageError::UnsupportedPreviewType(_))
        ));
    }

    #[test]
    fn test_image_preview_is_access_url() {
        let url = preview_url("http://preview", "png", "http://cdn/a.png").unwrap();
        assert_eq!(url, "http://cdn/a.png");
    }

    #[test]
    fn test_document_preview_escapes_access_url() {
        let url = preview_url(
            "http://preview/onlinePreview",
            "pdf",
            "http://cdn/a b.pdf?sig=1&x=2",
        )
        .unwrap();
        assert_eq!(
            url,
            "http://preview/onlinePreview?url=http%3A%2F%2Fcdn%2Fa%20b.pdf%3Fsig%3D1%26x%3D2"
        );
    }

    #[test]
    fn test_document_preview_requires_service() {
        assert!(matches!(
            preview_url("", "pdf", "http://cdn/a.pdf"),
            Err(StorageError::Configuration(_))
        ));
    }
}
