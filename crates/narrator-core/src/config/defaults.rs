use crate::chunker::DEFAULT_MAX_CHUNK_CHARS;
use crate::speech::DEFAULT_VOICE_LANG_PREFIX;

pub(crate) fn default_rate() -> f32 {
    1.0
}

pub(crate) fn default_pitch() -> f32 {
    1.0
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_preferred_voice_lang() -> String {
    DEFAULT_VOICE_LANG_PREFIX.to_string()
}

pub(crate) fn default_max_chunk_chars() -> usize {
    DEFAULT_MAX_CHUNK_CHARS
}

pub(crate) fn default_chars_per_second() -> f32 {
    12.0
}

pub(crate) fn default_progress_dir() -> String {
    ".cache/progress".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
