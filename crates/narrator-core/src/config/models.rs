use crate::speech::PlaybackParams;
use serde::Deserialize;

/// Upper bound on configured chunk size; larger values are clamped.
pub const MAX_CHUNK_CHARS_LIMIT: usize = 4000;

/// Flat runtime configuration assembled from the sectioned TOML tables.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_rate")]
    pub rate: f32,
    #[serde(default = "crate::config::defaults::default_pitch")]
    pub pitch: f32,
    #[serde(default = "crate::config::defaults::default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "crate::config::defaults::default_preferred_voice_lang")]
    pub preferred_voice_lang: String,
    #[serde(default = "crate::config::defaults::default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Speaking speed of the console transcript backend at rate 1.0.
    #[serde(default = "crate::config::defaults::default_chars_per_second")]
    pub chars_per_second: f32,
    #[serde(default = "crate::config::defaults::default_progress_dir")]
    pub progress_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            rate: crate::config::defaults::default_rate(),
            pitch: crate::config::defaults::default_pitch(),
            volume: crate::config::defaults::default_volume(),
            voice: None,
            preferred_voice_lang: crate::config::defaults::default_preferred_voice_lang(),
            max_chunk_chars: crate::config::defaults::default_max_chunk_chars(),
            chars_per_second: crate::config::defaults::default_chars_per_second(),
            progress_dir: crate::config::defaults::default_progress_dir(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    /// Pull every numeric setting back into its supported range.
    pub fn clamped(mut self) -> Self {
        let params = self.playback_params();
        self.rate = params.rate;
        self.pitch = params.pitch;
        self.volume = params.volume;
        self.max_chunk_chars = self.max_chunk_chars.clamp(1, MAX_CHUNK_CHARS_LIMIT);
        if !self.chars_per_second.is_finite() || self.chars_per_second <= 0.0 {
            self.chars_per_second = crate::config::defaults::default_chars_per_second();
        }
        if self.voice.as_deref().is_some_and(|voice| voice.trim().is_empty()) {
            self.voice = None;
        }
        self
    }

    pub fn playback_params(&self) -> PlaybackParams {
        PlaybackParams {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            voice: self.voice.clone(),
        }
        .clamped()
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
