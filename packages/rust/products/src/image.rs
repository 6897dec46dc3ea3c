//! Image link normalization.
//!
//! Shopping platforms reject WebP and video media, so links are rewritten to
//! `.jpg` where the CDN serves an equivalent still, and reported otherwise.

use url::Url;

/// Image extensions rewritten to `.jpg`.
const REWRITE_TO_JPG: &[&str] = &["webp"];

/// Video extensions; rejected unless poster rewriting is enabled.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "avi", "m4v", "mkv"];

/// Why an image link cannot be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageProblem {
    /// Empty or whitespace-only link.
    Missing,
    /// Not an absolute http(s) URL.
    Malformed(String),
    /// Points at a video file.
    Video(String),
}

impl std::fmt::Display for ImageProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("missing image link"),
            Self::Malformed(link) => write!(f, "malformed image link '{link}'"),
            Self::Video(ext) => write!(f, "video media (.{ext})"),
        }
    }
}

/// Normalize an image link, returning the publishable URL.
pub fn normalize_image_link(link: &str, rewrite_video: bool) -> Result<String, ImageProblem> {
    let link = link.trim();
    if link.is_empty() {
        return Err(ImageProblem::Missing);
    }

    let mut url = Url::parse(link).map_err(|_| ImageProblem::Malformed(link.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ImageProblem::Malformed(link.to_string()));
    }

    let path = url.path().to_string();
    let Some((stem, ext)) = split_extension(&path) else {
        return Ok(url.to_string());
    };
    let ext_lower = ext.to_ascii_lowercase();

    let is_video = VIDEO_EXTENSIONS.contains(&ext_lower.as_str());
    if is_video && !rewrite_video {
        return Err(ImageProblem::Video(ext_lower));
    }

    if is_video || REWRITE_TO_JPG.contains(&ext_lower.as_str()) {
        url.set_path(&format!("{stem}.jpg"));
    }

    Ok(url.to_string())
}

/// Split the last path segment's extension off, if it has one.
fn split_extension(path: &str) -> Option<(&str, &str)> {
    let last_segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let dot = path[last_segment_start..].rfind('.')? + last_segment_start;
    if dot == last_segment_start {
        return None;
    }
    Some((&path[..dot], &path[dot + 1..]))
}
