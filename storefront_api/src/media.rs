//! Media assets destined for the storefront's content-management API.

/// A picture that will get uploaded.
#[derive(Debug, Clone)]
pub struct Image {
    /// Display name, derived from the source file name.
    pub name: String,
    /// URL-safe slug used for duplicate detection on the destination.
    pub slug: String,
    /// Where the bytes came from.
    pub source_url: String,
    /// MIME type reported by the source.
    pub mime_type: String,
    /// The raw image bytes.
    pub data: Vec<u8>,
}

/// Derives a URL-safe slug from a source image URL.
///
/// Takes the file name, drops the extension, lowercases, and collapses any
/// run of non-alphanumerics to a single hyphen. The destination uses the
/// same normalization for uploaded file names, which is what makes the
/// pre-upload slug lookup a usable (if best-effort) duplicate check.
pub fn slug_from_url(url: &str) -> String {
    let file = url.rsplit('/').next().unwrap_or(url);
    let stem = file.split('.').next().unwrap_or(file);

    let mut slug = String::with_capacity(stem.len());
    let mut pending_hyphen = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// File extension to use for an upload, from its MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_strips_extension_and_lowercases() {
        assert_eq!(
            slug_from_url("https://img.example/items/DSC_0042.JPG"),
            "dsc-0042"
        );
    }

    #[test]
    fn slug_collapses_punctuation_runs() {
        assert_eq!(
            slug_from_url("https://img.example/a/b/My%20Photo--final.jpeg"),
            "my-20photo-final"
        );
    }

    #[test]
    fn slug_of_bare_name() {
        assert_eq!(slug_from_url("picture"), "picture");
    }

    #[test]
    fn extension_defaults_to_jpg() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("application/octet-stream"), "jpg");
    }
}
