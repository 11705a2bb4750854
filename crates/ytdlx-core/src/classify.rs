//! Format classification.
//!
//! Turns the extractor's flat format list into the grouped
//! [`ExtractionResult`]. The pipeline is pure and runs once per extraction,
//! after the retry loop has produced a document:
//!
//! 1. drop storyboard entries
//! 2. partition into audio-only and video-only by the resolution tag
//! 3. clean each entry into its domain type
//! 4. audio: split DRC from standard, group by language tag, pick
//!    highest/lowest by numeric format id
//! 5. video: split SDR from HDR (others dropped), pick highest/lowest by
//!    bitrate with a height fallback
//! 6. thumbnails: keep entries with a resolution marker, pick the largest
//!    and smallest by area
//!
//! Audio ranking uses the numeric format id rather than bitrate. Downstream
//! selection relies on exactly that ordering, so it is kept as is.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

use ytdlx_models::{
    AudioOnly, CleanedAudioFormat, CleanedVideoFormat, DynamicRangeGroup, ExtractionResult,
    LanguageGroup, RawFormat, RawThumbnail, RawVideoInfo, ThumbnailEntry, Thumbnails, VideoOnly,
};

use crate::error::CoreResult;

/// Parse extractor output and classify it.
///
/// Invalid or truncated JSON fails the whole call; no partial result is
/// returned.
pub fn classify_json(text: &str) -> CoreResult<ExtractionResult> {
    let raw: RawVideoInfo = serde_json::from_str(text)?;
    Ok(classify(&raw))
}

/// Classify an already parsed extractor record.
pub fn classify(raw: &RawVideoInfo) -> ExtractionResult {
    let (audio, video): (Vec<&RawFormat>, Vec<&RawFormat>) = raw
        .formats
        .iter()
        .filter(|f| !f.is_storyboard())
        .partition(|f| f.is_audio_only());

    debug!(
        total = raw.formats.len(),
        audio = audio.len(),
        video = video.len(),
        "Classifying formats"
    );

    ExtractionResult {
        meta_data: raw.meta.clone(),
        audio_only: classify_audio(&audio),
        video_only: classify_video(&video),
        thumbnails: classify_thumbnails(&raw.thumbnails),
        chapters: raw.chapters.clone().unwrap_or_default(),
        subtitles: raw.subtitles.clone().unwrap_or_default(),
        automatic_captions: raw.automatic_captions.clone().unwrap_or_default(),
        heatmap: raw.heatmap.clone().unwrap_or_default(),
    }
}

fn classify_audio(formats: &[&RawFormat]) -> AudioOnly {
    let mut standard = Vec::new();
    let mut drc = Vec::new();

    for format in formats {
        if format.is_drc() {
            drc.push(format.to_audio());
        } else {
            standard.push(format.to_audio());
        }
    }

    AudioOnly {
        standard: group_by_language(standard),
        drc: group_by_language(drc),
    }
}

fn group_by_language(formats: Vec<CleanedAudioFormat>) -> BTreeMap<String, LanguageGroup> {
    let mut buckets: BTreeMap<String, Vec<CleanedAudioFormat>> = BTreeMap::new();
    for format in formats {
        buckets.entry(format.language_tag()).or_default().push(format);
    }

    buckets
        .into_iter()
        .filter_map(|(language, combined)| {
            let highest = pick(&combined, |a, b| {
                id_key(a, f64::NEG_INFINITY) > id_key(b, f64::NEG_INFINITY)
            })?
            .clone();
            let lowest = pick(&combined, |a, b| {
                id_key(a, f64::INFINITY) < id_key(b, f64::INFINITY)
            })?
            .clone();
            Some((
                language,
                LanguageGroup {
                    highest,
                    lowest,
                    combined,
                },
            ))
        })
        .collect()
}

fn id_key(format: &CleanedAudioFormat, missing: f64) -> f64 {
    format.numeric_id().unwrap_or(missing)
}

fn classify_video(formats: &[&RawFormat]) -> VideoOnly {
    let mut sdr = Vec::new();
    let mut hdr = Vec::new();

    for format in formats {
        if format.is_sdr() {
            sdr.push(format.to_video());
        } else if format.is_hdr() {
            hdr.push(format.to_video());
        }
    }

    VideoOnly {
        standard: range_group(sdr),
        hdr: range_group(hdr),
    }
}

fn range_group(combined: Vec<CleanedVideoFormat>) -> DynamicRangeGroup {
    let highest = pick(&combined, |a, b| outranks(a, b, Ordering::Greater)).cloned();
    let lowest = pick(&combined, |a, b| outranks(a, b, Ordering::Less)).cloned();
    DynamicRangeGroup {
        highest,
        lowest,
        combined,
    }
}

/// Whether `candidate` should replace `current` when searching in
/// direction `want` (`Greater` for highest, `Less` for lowest).
///
/// The same rules apply in both directions: an entry with a bitrate beats
/// one without, two bitrates compare numerically, and height decides only
/// when neither side has a bitrate.
fn outranks(candidate: &CleanedVideoFormat, current: &CleanedVideoFormat, want: Ordering) -> bool {
    match (candidate.bitrate(), current.bitrate()) {
        (Some(a), Some(b)) => a.partial_cmp(&b) == Some(want),
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => match (candidate.height, current.height) {
            (Some(a), Some(b)) => a.cmp(&b) == want,
            (Some(_), None) => true,
            _ => false,
        },
    }
}

fn classify_thumbnails(thumbnails: &[RawThumbnail]) -> Thumbnails {
    let all: Vec<ThumbnailEntry> = thumbnails.iter().filter_map(thumbnail_entry).collect();

    let highest = pick(&all, |a, b| a.area() > b.area()).cloned();
    let lowest = pick(&all, |a, b| a.area() < b.area()).cloned();

    Thumbnails {
        highest,
        lowest,
        all,
    }
}

fn thumbnail_entry(raw: &RawThumbnail) -> Option<ThumbnailEntry> {
    let resolution = raw.resolution.as_deref()?;
    let parsed = resolution
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)));

    // Entries without a usable size are not ranked.
    Some(ThumbnailEntry {
        url: raw.url.clone(),
        width: raw.width.or(parsed.map(|(w, _)| w))?,
        height: raw.height.or(parsed.map(|(_, h)| h))?,
    })
}

/// First item that no later item strictly beats.
fn pick<T>(items: &[T], beats: impl Fn(&T, &T) -> bool) -> Option<&T> {
    let mut iter = items.iter();
    let mut best = iter.next()?;
    for item in iter {
        if beats(item, best) {
            best = item;
        }
    }
    Some(best)
}
