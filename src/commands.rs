//! Line-oriented command surface read from stdin.
//!
//! Sentence and chapter numbers are 1-based here and converted to the
//! session's 0-based indices.

use anyhow::{Context, Result, anyhow, bail};
use narrator_core::SessionCommand;

pub const HELP: &str = "\
commands:
  <enter> | space      toggle play/pause
  play [N]             play from the cursor, or from sentence N
  pause | resume | stop
  goto N               move to sentence N
  chapter N            move to chapter N
  next | prev          next / previous chapter
  chapters             list chapters
  rate X | pitch X | volume X
  voice [NAME]         choose a voice (no name: engine default)
  voices               list voices
  yes | no             accept / decline saved progress
  status | json        show the current position
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Session(SessionCommand),
    ListChapters,
    ListVoices,
    Json,
    Help,
    Quit,
}

pub fn parse_input(line: &str) -> Result<Input> {
    let normalized = normalize_command_token(line);
    let mut parts = normalized.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

    let command = match verb {
        "" | "space" => SessionCommand::TogglePlayPause,
        "play" | "p" => match arg {
            Some(raw) => SessionCommand::PlayFrom {
                index: parse_ordinal(raw)?,
            },
            None => SessionCommand::Play,
        },
        "pause" => SessionCommand::Pause,
        "resume" => SessionCommand::Resume,
        "stop" => SessionCommand::Stop,
        "goto" | "g" => SessionCommand::SeekSentence {
            index: parse_ordinal(required(arg, "goto <sentence>")?)?,
        },
        "chapter" | "c" => SessionCommand::SeekChapter {
            chapter: parse_ordinal(required(arg, "chapter <number>")?)?,
        },
        "next" | "n" => SessionCommand::SeekNextChapter,
        "prev" | "b" => SessionCommand::SeekPrevChapter,
        "rate" => SessionCommand::SetRate {
            rate: parse_value(required(arg, "rate <value>")?)?,
        },
        "pitch" => SessionCommand::SetPitch {
            pitch: parse_value(required(arg, "pitch <value>")?)?,
        },
        "volume" | "vol" => SessionCommand::SetVolume {
            volume: parse_value(required(arg, "volume <value>")?)?,
        },
        "voice" => SessionCommand::SetVoice {
            voice: raw_argument(line),
        },
        "yes" | "y" => SessionCommand::AcceptResume,
        "no" => SessionCommand::DeclineResume,
        "status" | "s" => SessionCommand::GetSnapshot,
        "chapters" => return Ok(Input::ListChapters),
        "voices" => return Ok(Input::ListVoices),
        "json" => return Ok(Input::Json),
        "help" | "?" => return Ok(Input::Help),
        "quit" | "q" | "exit" => return Ok(Input::Quit),
        other => bail!("Unknown command '{other}' (type 'help')"),
    };
    Ok(Input::Session(command))
}

fn normalize_command_token(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace("spacebar", "space")
}

/// Voice names are case-sensitive, so take the argument from the raw line.
fn raw_argument(line: &str) -> Option<String> {
    line.trim()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}

fn required<'a>(arg: Option<&'a str>, usage: &str) -> Result<&'a str> {
    arg.ok_or_else(|| anyhow!("Usage: {usage}"))
}

fn parse_ordinal(raw: &str) -> Result<usize> {
    let value: usize = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a number"))?;
    if value == 0 {
        bail!("Numbers start at 1");
    }
    Ok(value - 1)
}

fn parse_value(raw: &str) -> Result<f32> {
    let value: f32 = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a number"))?;
    if !value.is_finite() {
        bail!("'{raw}' is not a finite number");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(line: &str) -> SessionCommand {
        match parse_input(line).expect("command parses") {
            Input::Session(command) => command,
            other => panic!("expected session command, got {other:?}"),
        }
    }

    #[test]
    fn blank_line_and_spacebar_alias_toggle_playback() {
        assert_eq!(session(""), SessionCommand::TogglePlayPause);
        assert_eq!(session(" SpaceBar "), SessionCommand::TogglePlayPause);
    }

    #[test]
    fn ordinals_are_one_based() {
        assert_eq!(session("play 3"), SessionCommand::PlayFrom { index: 2 });
        assert_eq!(session("goto 1"), SessionCommand::SeekSentence { index: 0 });
        assert_eq!(session("C 12"), SessionCommand::SeekChapter { chapter: 11 });
        assert!(parse_input("goto 0").is_err());
        assert!(parse_input("goto").is_err());
        assert!(parse_input("chapter two").is_err());
    }

    #[test]
    fn parameters_parse_as_floats() {
        assert_eq!(session("rate 1.5"), SessionCommand::SetRate { rate: 1.5 });
        assert_eq!(session("volume 0"), SessionCommand::SetVolume { volume: 0.0 });
        assert!(parse_input("pitch NaN").is_err());
        assert!(parse_input("rate fast").is_err());
    }

    #[test]
    fn voice_keeps_original_case() {
        assert_eq!(
            session("voice  Ting Ting "),
            SessionCommand::SetVoice {
                voice: Some("Ting Ting".to_string())
            }
        );
        assert_eq!(session("voice"), SessionCommand::SetVoice { voice: None });
    }

    #[test]
    fn host_commands_are_recognized() {
        assert_eq!(parse_input("chapters").ok(), Some(Input::ListChapters));
        assert_eq!(parse_input("Q").ok(), Some(Input::Quit));
        assert_eq!(parse_input("?").ok(), Some(Input::Help));
        assert!(parse_input("dance").is_err());
    }
}
