use log::{debug, warn};
use thiserror::Error;

use crate::summarize::{PROMPT, SummarizeError, Summarizer, build_input};
use crate::youtube::{TranscriptError, TranscriptFetcher, flatten};
use crate::{UrlError, extract_video_id};

/// Shown when YouTube answered but would not hand over a transcript
pub const TRANSCRIPT_GUIDANCE: &str = "Could not retrieve a transcript for this video. \
YouTube may be blocking requests from this server's IP, or the video has no captions in the selected language. \
Try another language, try again later, or set PROXY_URL to route transcript requests through a proxy.";

const RETRIEVAL_FAILURE_MARKER: &str = "Could not retrieve a transcript";

/// One click of "Get Detailed Notes"
#[derive(Debug, Clone)]
pub struct NotesRequest {
    pub url: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotesOutcome {
    Notes {
        video_id: String,
        summary: String,
    },
    /// The transcript came back with no text; the model was not called
    EmptyTranscript { video_id: String },
}

#[derive(Debug, Error)]
pub enum NotesError {
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),
}

impl NotesError {
    /// The single inline message shown for a failed request
    pub fn user_message(&self) -> String {
        match self {
            NotesError::Transcript(e) if e.is_retrieval_failure() => TRANSCRIPT_GUIDANCE.to_string(),
            other => generic_message(other),
        }
    }
}

/// Route an error that only exists as text.
///
/// Anything mentioning a failed transcript retrieval gets the guidance
/// message; everything else is echoed back verbatim.
pub fn classify_message(error_text: &str) -> String {
    if error_text.contains(RETRIEVAL_FAILURE_MARKER) {
        TRANSCRIPT_GUIDANCE.to_string()
    } else {
        generic_message(error_text)
    }
}

fn generic_message(error: impl std::fmt::Display) -> String {
    format!("An error occurred: {error}")
}

/// Extract the ID, fetch and flatten the transcript, then summarize it
pub async fn generate_notes<F, S>(fetcher: &F, summarizer: &S, request: &NotesRequest) -> Result<NotesOutcome, NotesError>
where
    F: TranscriptFetcher,
    S: Summarizer,
{
    let video_id = extract_video_id(&request.url)?;
    debug!("Fetching transcript for {video_id} (lang={})", request.language);

    let segments = fetcher.fetch(&video_id, &request.language).await?;
    let transcript_text = flatten(&segments);

    if transcript_text.is_empty() {
        warn!("Transcript for {video_id} is empty, skipping summarization");
        return Ok(NotesOutcome::EmptyTranscript { video_id });
    }

    debug!("Transcript for {video_id}: {} segments, {} chars", segments.len(), transcript_text.len());
    let summary = summarizer.generate(&build_input(PROMPT, &transcript_text)).await?;

    Ok(NotesOutcome::Notes {
        video_id,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::Segment;

    struct FakeFetcher {
        texts: Vec<&'static str>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeFetcher {
        fn with(texts: Vec<&'static str>) -> Self {
            FakeFetcher {
                texts,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TranscriptFetcher for FakeFetcher {
        async fn fetch(&self, video_id: &str, lang: &str) -> Result<Vec<Segment>, TranscriptError> {
            self.calls.lock().unwrap().push((video_id.to_string(), lang.to_string()));
            Ok(self
                .texts
                .iter()
                .enumerate()
                .map(|(i, text)| Segment {
                    text: text.to_string(),
                    start: i as f64,
                    duration: 1.0,
                })
                .collect())
        }
    }

    struct FailingFetcher;

    impl TranscriptFetcher for FailingFetcher {
        async fn fetch(&self, video_id: &str, lang: &str) -> Result<Vec<Segment>, TranscriptError> {
            Err(TranscriptError::NoTranscriptFound {
                video_id: video_id.to_string(),
                requested: lang.to_string(),
                available: vec!["en".to_string()],
            })
        }
    }

    struct FakeSummarizer {
        inputs: Mutex<Vec<String>>,
    }

    impl FakeSummarizer {
        fn new() -> Self {
            FakeSummarizer {
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    impl Summarizer for FakeSummarizer {
        async fn generate(&self, input: &str) -> Result<String, SummarizeError> {
            self.inputs.lock().unwrap().push(input.to_string());
            Ok("* the gist".to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        async fn generate(&self, _input: &str) -> Result<String, SummarizeError> {
            Err(SummarizeError::EmptyResponse)
        }
    }

    fn request(url: &str) -> NotesRequest {
        NotesRequest {
            url: url.to_string(),
            language: "hi".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_notes() {
        let fetcher = FakeFetcher::with(vec!["Hello", "world"]);
        let summarizer = FakeSummarizer::new();

        let outcome = generate_notes(&fetcher, &summarizer, &request("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            NotesOutcome::Notes {
                video_id: "abc123".to_string(),
                summary: "* the gist".to_string(),
            }
        );
        assert_eq!(
            fetcher.calls.lock().unwrap().as_slice(),
            &[("abc123".to_string(), "hi".to_string())]
        );
    }

    #[tokio::test]
    async fn test_summarizer_gets_prompt_then_transcript() {
        let fetcher = FakeFetcher::with(vec!["Hello", "world"]);
        let summarizer = FakeSummarizer::new();

        generate_notes(&fetcher, &summarizer, &request("watch?v=abc123"))
            .await
            .unwrap();

        let inputs = summarizer.inputs.lock().unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0], format!("{PROMPT} Hello world"));
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_summarizer() {
        let fetcher = FakeFetcher::with(vec![]);
        let summarizer = FakeSummarizer::new();

        let outcome = generate_notes(&fetcher, &summarizer, &request("watch?v=abc123"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            NotesOutcome::EmptyTranscript {
                video_id: "abc123".to_string()
            }
        );
        assert!(summarizer.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_never_fetches() {
        let fetcher = FakeFetcher::with(vec!["Hello"]);
        let summarizer = FakeSummarizer::new();

        let err = generate_notes(&fetcher, &summarizer, &request("https://example.com/no-id"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotesError::InvalidUrl(_)));
        assert!(fetcher.calls.lock().unwrap().is_empty());
        assert!(err.user_message().starts_with("An error occurred: could not extract a video ID"));
    }

    #[tokio::test]
    async fn test_transcript_failure_gets_guidance() {
        let summarizer = FakeSummarizer::new();

        let err = generate_notes(&FailingFetcher, &summarizer, &request("watch?v=abc123"))
            .await
            .unwrap_err();

        assert!(matches!(err, NotesError::Transcript(_)));
        assert_eq!(err.user_message(), TRANSCRIPT_GUIDANCE);
        assert!(summarizer.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_generic() {
        let fetcher = FakeFetcher::with(vec!["Hello"]);

        let err = generate_notes(&fetcher, &FailingSummarizer, &request("watch?v=abc123"))
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "An error occurred: unexpected Gemini API response format"
        );
    }

    #[test]
    fn test_parse_failure_is_generic() {
        let err = NotesError::from(TranscriptError::Parse("bad xml".to_string()));
        assert_eq!(
            err.user_message(),
            "An error occurred: could not parse transcript response: bad xml"
        );
    }

    #[test]
    fn test_classify_message_marker() {
        let text = "\nCould not retrieve a transcript for the video https://www.youtube.com/watch?v=abc! ...";
        assert_eq!(classify_message(text), TRANSCRIPT_GUIDANCE);
    }

    #[test]
    fn test_classify_message_other() {
        assert_eq!(classify_message("quota exceeded"), "An error occurred: quota exceeded");
        // match is case-sensitive
        assert_eq!(
            classify_message("could not retrieve a transcript"),
            "An error occurred: could not retrieve a transcript"
        );
    }
}
