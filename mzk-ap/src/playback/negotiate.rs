//! Stream format negotiation
//!
//! Picks the single best audio stream of a song by a fixed scoring rule.
//! Pure and deterministic: same song and preferences, same answer.

use crate::catalog::{AudioQuality, Song, StreamFormat};
use crate::error::{Error, Result};

/// Bonus for matching the preferred quality tier
const PREFERRED_QUALITY_POINTS: u32 = 5;
/// Bonus for matching the preferred codec
const PREFERRED_CODEC_POINTS: u32 = 1;
/// Bonus for manifest-delivered streams
const ADAPTIVE_POINTS: u32 = 1;

/// What the negotiator favours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPreferences {
    pub quality: AudioQuality,
    pub codec: String,
}

impl Default for FormatPreferences {
    fn default() -> Self {
        Self {
            quality: AudioQuality::Medium,
            codec: "opus".to_string(),
        }
    }
}

/// A stream format tagged with how it is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    pub format: StreamFormat,
    /// True for formats from the song's adaptive (manifest) list
    pub adaptive: bool,
}

impl NegotiatedFormat {
    pub fn url(&self) -> &str {
        &self.format.url
    }
}

/// Score of one candidate
pub fn score(format: &StreamFormat, adaptive: bool, prefs: &FormatPreferences) -> u32 {
    let mut points = format.audio_quality.base_score();

    if format.audio_quality == prefs.quality {
        points += PREFERRED_QUALITY_POINTS;
    }
    if format.audio_codec == prefs.codec {
        points += PREFERRED_CODEC_POINTS;
    }
    if adaptive {
        points += ADAPTIVE_POINTS;
    }

    points
}

/// Audio-carrying candidates: static formats first, then adaptive ones
pub fn candidates(song: &Song) -> impl Iterator<Item = (&StreamFormat, bool)> {
    song.formats
        .iter()
        .map(|f| (f, false))
        .chain(song.adaptive_formats.iter().map(|f| (f, true)))
        .filter(|(f, _)| f.has_audio)
}

/// Select the highest-scoring audio format of `song`
///
/// Ties go to the first maximal candidate in input order.
pub fn select_best_format(song: &Song, prefs: &FormatPreferences) -> Result<NegotiatedFormat> {
    let mut best: Option<((&StreamFormat, bool), u32)> = None;

    for candidate in candidates(song) {
        let points = score(candidate.0, candidate.1, prefs);
        match best {
            Some((_, best_points)) if best_points >= points => {}
            _ => best = Some((candidate, points)),
        }
    }

    best.map(|((format, adaptive), _)| NegotiatedFormat {
        format: format.clone(),
        adaptive,
    })
    .ok_or_else(|| Error::NoPlayableFormat(song.video_id.clone()))
}
