//! The speech capability seam.
//!
//! The narration core never talks to an engine directly; it emits
//! [`SpeechRequest`]s and expects the host to report exactly one
//! [`ChunkOutcome`] per request, tagged with the request's [`ChunkTicket`].

use serde::{Deserialize, Serialize};

pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 10.0;
pub const MIN_PITCH: f32 = 0.1;
pub const MAX_PITCH: f32 = 10.0;
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

/// Language prefix preferred when no voice has been chosen explicitly.
pub const DEFAULT_VOICE_LANG_PREFIX: &str = "zh";

/// Rate, pitch, volume and voice applied to every spoken chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<String>,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice: None,
        }
    }
}

impl PlaybackParams {
    pub fn clamped(mut self) -> Self {
        self.rate = clamp_finite(self.rate, MIN_RATE, MAX_RATE, 1.0);
        self.pitch = clamp_finite(self.pitch, MIN_PITCH, MAX_PITCH, 1.0);
        self.volume = clamp_finite(self.volume, MIN_VOLUME, MAX_VOLUME, 1.0);
        self
    }
}

pub(crate) fn clamp_finite(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Identity of one dispatched chunk. Completions carrying a ticket from an
/// older epoch are stale and get dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTicket {
    pub epoch: u64,
    pub sentence_idx: usize,
    pub chunk_idx: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub ticket: ChunkTicket,
    pub text: String,
    pub params: PlaybackParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Ended,
    Errored,
}

/// A speech engine able to speak one bounded chunk at a time.
///
/// `speak` must not block until playback ends. Completion is reported later
/// through [`crate::session::NarrationSession::chunk_completed`]. Returning an
/// error means the request was never accepted and no completion will follow.
pub trait SpeechBackend {
    fn speak(&mut self, request: &SpeechRequest) -> anyhow::Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub is_default: bool,
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.lang)?;
        if self.is_default {
            write!(f, " - default")?;
        }
        Ok(())
    }
}

/// Pick a voice: an exact name match wins, then the first voice whose language
/// starts with `lang_prefix` (case-insensitive), then the first voice.
pub fn select_voice<'a>(
    voices: &'a [Voice],
    preferred_name: Option<&str>,
    lang_prefix: &str,
) -> Option<&'a Voice> {
    if let Some(name) = preferred_name {
        if let Some(voice) = voices.iter().find(|voice| voice.name == name) {
            return Some(voice);
        }
    }
    let prefix = lang_prefix.to_ascii_lowercase();
    voices
        .iter()
        .find(|voice| voice.lang.to_ascii_lowercase().starts_with(&prefix))
        .or_else(|| voices.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> Voice {
        Voice {
            name: name.to_string(),
            lang: lang.to_string(),
            is_default: false,
        }
    }

    #[test]
    fn clamps_params_and_replaces_non_finite_values() {
        let params = PlaybackParams {
            rate: 42.0,
            pitch: f32::NAN,
            volume: -0.5,
            voice: None,
        }
        .clamped();
        assert!((params.rate - MAX_RATE).abs() < f32::EPSILON);
        assert!((params.pitch - 1.0).abs() < f32::EPSILON);
        assert!((params.volume - MIN_VOLUME).abs() < f32::EPSILON);
    }

    #[test]
    fn prefers_named_voice_then_language() {
        let voices = vec![
            voice("Alex", "en-US"),
            voice("Tingting", "zh-CN"),
            voice("Meijia", "ZH-tw"),
        ];
        assert_eq!(
            select_voice(&voices, Some("Meijia"), "zh").map(|v| v.name.as_str()),
            Some("Meijia")
        );
        assert_eq!(
            select_voice(&voices, Some("Missing"), "zh").map(|v| v.name.as_str()),
            Some("Tingting")
        );
        assert_eq!(
            select_voice(&voices, None, "ja").map(|v| v.name.as_str()),
            Some("Alex")
        );
        assert!(select_voice(&[], None, "zh").is_none());
    }

    #[test]
    fn voice_label_marks_default() {
        let mut v = voice("Tingting", "zh-CN");
        v.is_default = true;
        assert_eq!(v.to_string(), "Tingting (zh-CN) - default");
    }
}
