use crate::thumbnail_url;

/// Render the summary under the "Detailed Notes" header, summary untouched
pub fn render_notes(summary: &str) -> String {
    format!("## Detailed Notes:\n\n{summary}")
}

pub fn render_thumbnail(video_id: &str) -> String {
    format!("Thumbnail: {}", thumbnail_url(video_id))
}

/// Render the flattened transcript without its leading space
pub fn render_transcript(transcript_text: &str) -> String {
    transcript_text.strip_prefix(' ').unwrap_or(transcript_text).to_string()
}
