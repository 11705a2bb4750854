//! Format selection over a classified result.
//!
//! Empty categories surface as [`CoreError::FormatNotFound`] so callers can
//! treat them as "not found" rather than a failure of the extraction.

use ytdlx_models::{
    CleanedAudioFormat, CleanedVideoFormat, DynamicRange, ExtractionResult, LanguageGroup,
    ThumbnailEntry,
};

use crate::error::{CoreError, CoreResult};

fn audio_category(language: &str, drc: bool) -> String {
    if drc {
        format!("drc audio/{}", language)
    } else {
        format!("audio/{}", language)
    }
}

/// Language group from the standard or DRC map.
pub fn audio_group<'a>(
    result: &'a ExtractionResult,
    language: &str,
    drc: bool,
) -> CoreResult<&'a LanguageGroup> {
    result
        .audio_only
        .language(language, drc)
        .ok_or_else(|| CoreError::format_not_found(audio_category(language, drc)))
}

/// Highest audio format of a language (by numeric format id).
pub fn highest_audio<'a>(
    result: &'a ExtractionResult,
    language: &str,
    drc: bool,
) -> CoreResult<&'a CleanedAudioFormat> {
    audio_group(result, language, drc).map(|g| &g.highest)
}

/// Lowest audio format of a language (by numeric format id).
pub fn lowest_audio<'a>(
    result: &'a ExtractionResult,
    language: &str,
    drc: bool,
) -> CoreResult<&'a CleanedAudioFormat> {
    audio_group(result, language, drc).map(|g| &g.lowest)
}

/// Highest video format of a dynamic range (bitrate, then height).
pub fn highest_video(
    result: &ExtractionResult,
    range: DynamicRange,
) -> CoreResult<&CleanedVideoFormat> {
    result
        .video_only
        .group(range)
        .highest
        .as_ref()
        .ok_or_else(|| CoreError::format_not_found(format!("{} video", range)))
}

/// Lowest video format of a dynamic range (bitrate, then height).
pub fn lowest_video(
    result: &ExtractionResult,
    range: DynamicRange,
) -> CoreResult<&CleanedVideoFormat> {
    result
        .video_only
        .group(range)
        .lowest
        .as_ref()
        .ok_or_else(|| CoreError::format_not_found(format!("{} video", range)))
}

/// Largest thumbnail by area.
pub fn best_thumbnail(result: &ExtractionResult) -> CoreResult<&ThumbnailEntry> {
    result
        .thumbnails
        .highest
        .as_ref()
        .ok_or_else(|| CoreError::format_not_found("thumbnail"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_json;
    use crate::error::ErrorCategory;

    const DOC: &str = r#"{
        "id": "abc",
        "formats": [
            {"format_id": "251", "format_note": "English original, medium", "resolution": "audio only"},
            {"format_id": "140", "format_note": "English original, medium", "resolution": "audio only"},
            {"format_id": "sb2", "format_note": "fr storyboard", "resolution": "audio only"},
            {"format_id": "137", "format_note": "1080p", "resolution": "1920x1080", "dynamic_range": "SDR", "vbr": 4000.0, "height": 1080}
        ]
    }"#;

    #[test]
    fn test_missing_language_is_not_found() {
        let result = classify_json(DOC).unwrap();

        let err = highest_audio(&result, "fr", false).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("audio/fr"));
    }

    #[test]
    fn test_selects_extremes() {
        let result = classify_json(DOC).unwrap();

        assert_eq!(highest_audio(&result, "English", false).unwrap().format_id, "251");
        assert_eq!(lowest_audio(&result, "English", false).unwrap().format_id, "140");
        assert!(lowest_audio(&result, "English", true).is_err());
        assert_eq!(highest_video(&result, DynamicRange::Sdr).unwrap().format_id, "137");
        assert!(matches!(
            lowest_video(&result, DynamicRange::Hdr),
            Err(CoreError::FormatNotFound { .. })
        ));
        assert!(best_thumbnail(&result).is_err());
    }
}
