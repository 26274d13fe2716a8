pub mod config;
pub mod notes;
pub mod output;
pub mod summarize;
pub mod youtube;

use thiserror::Error;

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("could not extract a video ID from '{0}' (expected a URL like https://www.youtube.com/watch?v=ID)")]
    MissingId(String),
}

/// Extract the video ID from a pasted link.
///
/// The ID is whatever follows the first `=`, cut at the next `&` or `#`.
/// `youtu.be/ID` short links are accepted as well; anything else without an
/// `=` is rejected.
pub fn extract_video_id(url: &str) -> Result<String, UrlError> {
    let url = url.trim();

    let tail = match url.split_once('=') {
        Some((_, after)) => after,
        None => url
            .split_once("youtu.be/")
            .map(|(_, after)| after.split(['?', '/']).next().unwrap_or_default())
            .unwrap_or_default(),
    };

    let id = tail.split(['&', '#']).next().unwrap_or_default();
    if id.is_empty() {
        return Err(UrlError::MissingId(url.to_string()));
    }
    Ok(id.to_string())
}

/// Thumbnail image for a video, shown before any transcript is fetched
pub fn thumbnail_url(video_id: &str) -> String {
    format!("http://img.youtube.com/vi/{video_id}/0.jpg")
}
