use std::future::Future;

use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::Segment;
use crate::config::Config;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Why a transcript could not be fetched.
///
/// The first five variants are YouTube refusing or lacking the transcript;
/// their messages all start with "Could not retrieve a transcript".
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error(
        "Could not retrieve a transcript for the video https://www.youtube.com/watch?v={video_id}! \
         This is most likely caused by: the video is no longer available"
    )]
    VideoUnavailable { video_id: String },

    #[error(
        "Could not retrieve a transcript for the video https://www.youtube.com/watch?v={video_id}! \
         This is most likely caused by: the video is unplayable ({reason})"
    )]
    VideoUnplayable { video_id: String, reason: String },

    #[error(
        "Could not retrieve a transcript for the video https://www.youtube.com/watch?v={video_id}! \
         This is most likely caused by: subtitles are disabled for this video"
    )]
    TranscriptsDisabled { video_id: String },

    #[error(
        "Could not retrieve a transcript for the video https://www.youtube.com/watch?v={video_id}! \
         This is most likely caused by: no transcript found for language '{requested}' (available: {})",
        .available.join(", ")
    )]
    NoTranscriptFound {
        video_id: String,
        requested: String,
        available: Vec<String>,
    },

    #[error(
        "Could not retrieve a transcript for the video https://www.youtube.com/watch?v={video_id}! \
         This is most likely caused by: YouTube is blocking requests from your IP"
    )]
    RequestBlocked { video_id: String },

    #[error("invalid proxy URL '{url}': {source}")]
    InvalidProxy { url: String, source: reqwest::Error },

    #[error("network error while fetching transcript: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not parse transcript response: {0}")]
    Parse(String),
}

impl TranscriptError {
    /// True when YouTube answered but would not hand over a transcript
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            TranscriptError::VideoUnavailable { .. }
                | TranscriptError::VideoUnplayable { .. }
                | TranscriptError::TranscriptsDisabled { .. }
                | TranscriptError::NoTranscriptFound { .. }
                | TranscriptError::RequestBlocked { .. }
        )
    }
}

/// Source of timed transcript segments for a video
pub trait TranscriptFetcher {
    fn fetch(&self, video_id: &str, lang: &str) -> impl Future<Output = Result<Vec<Segment>, TranscriptError>> + Send;
}

/// Join segments into one blob, each segment prefixed with a single space
pub fn flatten(segments: &[Segment]) -> String {
    segments.iter().fold(String::new(), |mut acc, segment| {
        acc.push(' ');
        acc.push_str(&segment.text);
        acc
    })
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// Transcript fetcher backed by YouTube's InnerTube API
#[derive(Debug, Clone)]
pub struct YouTube {
    client: reqwest::Client,
}

impl YouTube {
    /// Build the HTTP client, routing both schemes through `config.proxy_url` when set
    pub fn new(config: &Config) -> Result<Self, TranscriptError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if let Some(url) = &config.proxy_url {
            debug!("Routing transcript requests through proxy {url}");
            let proxy = reqwest::Proxy::all(url).map_err(|source| TranscriptError::InvalidProxy {
                url: url.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(YouTube {
            client: builder.build()?,
        })
    }

    async fn get_text(&self, url: &str, video_id: &str) -> Result<String, TranscriptError> {
        let resp = self
            .client
            .get(url)
            .header("Accept-Language", "en-US")
            .send()
            .await?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::RequestBlocked {
                video_id: video_id.to_string(),
            });
        }

        Ok(resp.error_for_status()?.text().await?)
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<InnerTubePlayerResponse, TranscriptError> {
        let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        let resp = self
            .client
            .post(&player_url)
            .header("Accept-Language", "en-US")
            .json(&body)
            .send()
            .await?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptError::RequestBlocked {
                video_id: video_id.to_string(),
            });
        }

        Ok(resp.error_for_status()?.json().await?)
    }
}

impl TranscriptFetcher for YouTube {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Vec<Segment>, TranscriptError> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!("Fetching watch page: {watch_url}");

        let page_html = self.get_text(&watch_url, video_id).await?;
        let api_key = extract_api_key(&page_html, video_id)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let resp = self.fetch_player(video_id, &api_key).await?;
        check_playability(video_id, resp.playability_status.as_ref())?;

        let tracks = resp
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default();

        let track = select_track(video_id, &tracks, lang)?;
        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_url = track.base_url.replace("&fmt=srv3", "");
        let caption_xml = self.get_text(&caption_url, video_id).await?;

        let segments = parse_caption_xml(&caption_xml)?;
        debug!("Parsed {} caption segments", segments.len());
        Ok(segments)
    }
}

fn extract_api_key(html: &str, video_id: &str) -> Result<String, TranscriptError> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).map_err(|e| TranscriptError::Parse(e.to_string()))?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).map_err(|e| TranscriptError::Parse(e.to_string()))?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    // A captcha page instead of the watch page means the IP is flagged
    if html.contains("class=\"g-recaptcha\"") {
        return Err(TranscriptError::RequestBlocked {
            video_id: video_id.to_string(),
        });
    }

    Err(TranscriptError::Parse(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

fn check_playability(video_id: &str, status: Option<&PlayabilityStatus>) -> Result<(), TranscriptError> {
    let Some(status) = status else {
        return Ok(());
    };
    let reason = status.reason.clone().unwrap_or_default();
    let video_id = video_id.to_string();

    match status.status.as_deref() {
        None | Some("OK") => Ok(()),
        Some("LOGIN_REQUIRED") if reason.contains("not a bot") => Err(TranscriptError::RequestBlocked { video_id }),
        Some("ERROR") if reason.is_empty() || reason.contains("unavailable") => {
            Err(TranscriptError::VideoUnavailable { video_id })
        }
        Some(_) => Err(TranscriptError::VideoUnplayable { video_id, reason }),
    }
}

/// Pick the track for exactly `lang`; another language is never substituted
fn select_track<'a>(video_id: &str, tracks: &'a [CaptionTrack], lang: &str) -> Result<&'a CaptionTrack, TranscriptError> {
    if tracks.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    }

    tracks
        .iter()
        .find(|t| t.language_code == lang)
        .ok_or_else(|| TranscriptError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: lang.to_string(),
            available: tracks.iter().map(|t| t.language_code.clone()).collect(),
        })
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>, TranscriptError> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                // some tracks omit dur on the last line
                current_dur = dur.or(Some(0.0));
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TranscriptError::Parse(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(segments)
}
