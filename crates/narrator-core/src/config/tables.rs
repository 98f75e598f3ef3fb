use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

/// On-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    narration: NarrationConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            rate: tables.playback.rate,
            pitch: tables.playback.pitch,
            volume: tables.playback.volume,
            voice: tables.playback.voice,
            preferred_voice_lang: tables.playback.preferred_voice_lang,
            max_chunk_chars: tables.narration.max_chunk_chars,
            chars_per_second: tables.narration.chars_per_second,
            progress_dir: tables.storage.progress_dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            playback: PlaybackConfig {
                rate: config.rate,
                pitch: config.pitch,
                volume: config.volume,
                voice: config.voice.clone(),
                preferred_voice_lang: config.preferred_voice_lang.clone(),
            },
            narration: NarrationConfig {
                max_chunk_chars: config.max_chunk_chars,
                chars_per_second: config.chars_per_second,
            },
            storage: StorageConfig {
                progress_dir: config.progress_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_rate")]
    rate: f32,
    #[serde(default = "defaults::default_pitch")]
    pitch: f32,
    #[serde(default = "defaults::default_volume")]
    volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
    #[serde(default = "defaults::default_preferred_voice_lang")]
    preferred_voice_lang: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            rate: defaults::default_rate(),
            pitch: defaults::default_pitch(),
            volume: defaults::default_volume(),
            voice: None,
            preferred_voice_lang: defaults::default_preferred_voice_lang(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct NarrationConfig {
    #[serde(default = "defaults::default_max_chunk_chars")]
    max_chunk_chars: usize,
    #[serde(default = "defaults::default_chars_per_second")]
    chars_per_second: f32,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        NarrationConfig {
            max_chunk_chars: defaults::default_max_chunk_chars(),
            chars_per_second: defaults::default_chars_per_second(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_progress_dir")]
    progress_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            progress_dir: defaults::default_progress_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
