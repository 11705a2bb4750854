//! Video URL parsing and canonicalization.

use url::Url;

/// Length of a YouTube video id.
const VIDEO_ID_LEN: usize = 11;

/// Errors that can occur while reading a video id from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoUrlError {
    /// Input is neither a bare id nor a YouTube URL
    InvalidYoutubeUrl,
    /// Video id has invalid format
    InvalidVideoId,
    /// URL carries no video id
    VideoIdNotFound,
}

impl std::fmt::Display for VideoUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoUrlError::InvalidYoutubeUrl => write!(f, "URL is not a valid YouTube URL"),
            VideoUrlError::InvalidVideoId => write!(f, "Video ID has invalid format"),
            VideoUrlError::VideoIdNotFound => write!(f, "Video ID not found in URL"),
        }
    }
}

impl std::error::Error for VideoUrlError {}

/// Extract the video id from a bare id or any common YouTube URL shape.
///
/// Supports:
/// - VIDEO_ID
/// - https://youtube.com/watch?v=VIDEO_ID
/// - https://youtu.be/VIDEO_ID
/// - https://youtube.com/embed/VIDEO_ID, /v/VIDEO_ID, /shorts/VIDEO_ID, /live/VIDEO_ID
pub fn extract_video_id(input: &str) -> Result<String, VideoUrlError> {
    let input = input.trim();

    if is_valid_id(input) {
        return Ok(input.to_string());
    }

    let url = Url::parse(input).map_err(|_| VideoUrlError::InvalidYoutubeUrl)?;
    let host = url
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or(VideoUrlError::InvalidYoutubeUrl)?;

    let candidate = if host == "youtu.be" {
        url.path_segments().and_then(|mut s| s.next()).map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
            .or_else(|| {
                let mut segments = url.path_segments()?;
                match segments.next()? {
                    "embed" | "v" | "shorts" | "live" => segments.next().map(str::to_string),
                    _ => None,
                }
            })
    } else {
        return Err(VideoUrlError::InvalidYoutubeUrl);
    };

    match candidate.filter(|id| !id.is_empty()) {
        Some(id) if is_valid_id(&id) => Ok(id),
        Some(_) => Err(VideoUrlError::InvalidVideoId),
        None => Err(VideoUrlError::VideoIdNotFound),
    }
}

/// Canonical watch URL handed to the extractor.
pub fn canonical_video_url(input: &str) -> Result<String, VideoUrlError> {
    extract_video_id(input).map(|id| format!("https://www.youtube.com/watch?v={}", id))
}

fn is_valid_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
