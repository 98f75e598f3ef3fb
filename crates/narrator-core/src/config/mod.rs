//! Configuration loading for the narrator.
//!
//! Settings live in `conf/config.toml` under `[playback]`, `[narration]`,
//! `[storage]` and `[logging]`. A missing or unparsable file falls back to
//! defaults so narration can still start.

mod defaults;
mod models;
mod tables;

pub use models::{AppConfig, LogLevel, MAX_CHUNK_CHARS_LIMIT};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tables::ConfigTables;
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let tables: ConfigTables = toml::from_str(contents).context("Invalid config TOML")?;
    Ok(AppConfig::from(tables).clamped())
}

pub fn serialize_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(&ConfigTables::from(config)).context("Serializing config")
}

pub fn load_config(path: &Path) -> AppConfig {
    let contents = match fs::read_to_string(path) {
        Ok(data) => {
            info!(path = %path.display(), "Loaded base config");
            data
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                "Falling back to default config: {err}"
            );
            return AppConfig::default();
        }
    };

    match parse_config(&contents) {
        Ok(cfg) => {
            debug!(?cfg, "Parsed configuration from disk");
            cfg
        }
        Err(err) => {
            warn!(path = %path.display(), "{err:#}");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = parse_config("").expect("empty config parses");
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.max_chunk_chars, 220);
        assert_eq!(cfg.preferred_voice_lang, "zh");
    }

    #[test]
    fn sectioned_tables_map_to_flat_config() {
        let cfg = parse_config(
            r#"
            [playback]
            rate = 1.4
            voice = "Tingting"

            [narration]
            max_chunk_chars = 120

            [storage]
            progress_dir = "/tmp/narrator"

            [logging]
            log_level = "debug"
            "#,
        )
        .expect("config parses");
        assert!((cfg.rate - 1.4).abs() < f32::EPSILON);
        assert!((cfg.pitch - 1.0).abs() < f32::EPSILON);
        assert_eq!(cfg.voice.as_deref(), Some("Tingting"));
        assert_eq!(cfg.max_chunk_chars, 120);
        assert_eq!(cfg.progress_dir, "/tmp/narrator");
        assert_eq!(cfg.log_level, LogLevel::Debug);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let cfg = parse_config(
            r#"
            [playback]
            rate = 99.0
            volume = -1.0
            voice = "  "

            [narration]
            max_chunk_chars = 0
            chars_per_second = -3.0
            "#,
        )
        .expect("config parses");
        assert!((cfg.rate - 10.0).abs() < f32::EPSILON);
        assert!(cfg.volume.abs() < f32::EPSILON);
        assert_eq!(cfg.voice, None);
        assert_eq!(cfg.max_chunk_chars, 1);
        assert!(cfg.chars_per_second > 0.0);
    }

    #[test]
    fn invalid_toml_is_an_error_and_loads_as_defaults() {
        assert!(parse_config("[playback\nrate = ").is_err());

        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("narrator-config-{nonce}.toml"));
        fs::write(&path, "[logging]\nlog_level = \"loud\"").expect("write config");
        assert_eq!(load_config(&path), AppConfig::default());
        let _ = fs::remove_file(&path);

        assert_eq!(
            load_config(Path::new("/definitely/missing/config.toml")),
            AppConfig::default()
        );
    }

    #[test]
    fn serialized_config_parses_back() {
        let mut cfg = AppConfig::default();
        cfg.rate = 1.5;
        cfg.voice = Some("Meijia".to_string());
        let text = serialize_config(&cfg).expect("serialize");
        assert!(text.contains("[playback]"));
        assert_eq!(parse_config(&text).expect("parse"), cfg);
    }
}
