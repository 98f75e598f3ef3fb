//! Entry point for the console narrator.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Load the document and offer saved progress.
//! - Run the event loop that feeds speech completions, stdin commands and
//!   Ctrl-C into the narration session.

mod commands;
mod transcript;

use crate::commands::{HELP, Input, parse_input};
use crate::transcript::TranscriptBackend;
use anyhow::{Context, Result, anyhow, bail};
use narrator_core::config::{DEFAULT_CONFIG_PATH, load_config, serialize_config};
use narrator_core::loader::load_document;
use narrator_core::progress::FileProgressStore;
use narrator_core::speech::{ChunkOutcome, ChunkTicket, select_voice};
use narrator_core::{NarrationSession, NarrationSnapshot, SessionCommand};
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;
type Session = NarrationSession<TranscriptBackend, FileProgressStore>;

/// Everything the main loop reacts to, from any thread.
#[derive(Debug)]
pub(crate) enum HostEvent {
    Chunk {
        ticket: ChunkTicket,
        outcome: ChunkOutcome,
    },
    Input(String),
    InputClosed,
    Interrupt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResumeMode {
    Ask,
    Resume,
    Restart,
}

#[derive(Debug)]
struct CliArgs {
    path: Option<PathBuf>,
    config_path: PathBuf,
    resume_mode: ResumeMode,
    print_config: bool,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    if args.print_config {
        print!("{}", serialize_config(&config)?);
        return Ok(());
    }
    let path = args
        .path
        .ok_or_else(|| anyhow!("Usage: lantern-narrator <path-to-text> [--resume|--restart]"))?;
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }
    info!(
        path = %path.display(),
        level = %config.log_level,
        "Starting narrator"
    );
    info!(
        rate = config.rate,
        pitch = config.pitch,
        volume = config.volume,
        max_chunk_chars = config.max_chunk_chars,
        progress_dir = %config.progress_dir,
        "Active narration configuration"
    );

    let document = load_document(&path)?;
    let (tx, rx) = mpsc::channel::<HostEvent>();
    let backend = TranscriptBackend::new(tx.clone(), config.chars_per_second);
    let store = FileProgressStore::new(&config.progress_dir);
    let mut session = NarrationSession::new(document, &config, backend, store);

    let preferred = select_voice(
        session.backend().voices(),
        config.voice.as_deref(),
        &config.preferred_voice_lang,
    )
    .map(|voice| voice.name.clone());
    if preferred.is_some() && session.scheduler().params().voice != preferred {
        info!(voice = ?preferred, "Selected voice");
        session.apply_command(SessionCommand::SetVoice { voice: preferred });
    }

    install_interrupt_handler(tx.clone());
    spawn_stdin_reader(tx)?;

    let offered_index = session.resume_offer().map(|offer| offer.index);
    let autoplay = match (args.resume_mode, offered_index) {
        (_, None) => true,
        (ResumeMode::Resume, Some(_)) => {
            session.accept_resume();
            true
        }
        (ResumeMode::Restart, Some(_)) => {
            session.decline_resume();
            true
        }
        (ResumeMode::Ask, Some(index)) => {
            println!(
                "Saved progress found at sentence {}. Type 'yes' to resume or 'no' to start over, then 'play'.",
                index + 1
            );
            false
        }
    };
    if autoplay {
        let event = session.apply_command(SessionCommand::Play);
        print_status(&event.snapshot);
    }

    event_loop(&mut session, rx);
    session.stop();
    info!(
        index = session.scheduler().current_index(),
        "Narrator shut down"
    );
    Ok(())
}

fn event_loop(session: &mut Session, rx: mpsc::Receiver<HostEvent>) {
    let mut input_open = true;
    while let Ok(event) = rx.recv() {
        match event {
            HostEvent::Chunk { ticket, outcome } => {
                let chapter_before = session.scheduler().current_chapter();
                session.chunk_completed(ticket, outcome);
                let snapshot = session.snapshot();
                if snapshot.chapter_index != chapter_before {
                    println!("== {} ==", snapshot.chapter_title);
                }
                if session.is_finished() {
                    print_status(&snapshot);
                    if !input_open {
                        break;
                    }
                }
            }
            HostEvent::Input(line) => match parse_input(&line) {
                Ok(Input::Session(command)) => {
                    let event = session.apply_command(command);
                    print_status(&event.snapshot);
                }
                Ok(Input::ListChapters) => print_chapters(session),
                Ok(Input::ListVoices) => {
                    for voice in session.backend().voices() {
                        println!("  {voice}");
                    }
                }
                Ok(Input::Json) => match serde_json::to_string_pretty(&session.snapshot()) {
                    Ok(json) => println!("{json}"),
                    Err(err) => warn!("Failed to serialize snapshot: {err}"),
                },
                Ok(Input::Help) => println!("{HELP}"),
                Ok(Input::Quit) => break,
                Err(err) => println!("{err:#}"),
            },
            HostEvent::InputClosed => {
                input_open = false;
                if session.snapshot().state != "speaking" {
                    break;
                }
            }
            HostEvent::Interrupt => {
                info!("Received Ctrl+C; stopping narration");
                break;
            }
        }
    }
}

fn print_status(snapshot: &NarrationSnapshot) {
    println!(
        "[{}] {}/{} ({:.1}%) {} | {}",
        snapshot.state,
        (snapshot.current_index + 1).min(snapshot.sentence_count.max(1)),
        snapshot.sentence_count,
        snapshot.progress_pct,
        snapshot.chapter_title,
        snapshot.status
    );
}

fn print_chapters(session: &Session) {
    let document = session.scheduler().document();
    let current = session.scheduler().current_chapter();
    for (idx, (chapter, range)) in document
        .chapters()
        .iter()
        .zip(document.ranges())
        .enumerate()
    {
        let marker = if idx == current { '>' } else { ' ' };
        println!(
            "{marker} {:>4}. {} ({} sentences)",
            idx + 1,
            chapter.title,
            range.sentence_count
        );
    }
}

fn install_interrupt_handler(tx: Sender<HostEvent>) {
    if let Err(err) = ctrlc::set_handler(move || {
        let _ = tx.send(HostEvent::Interrupt);
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
}

fn spawn_stdin_reader(tx: Sender<HostEvent>) -> Result<()> {
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(HostEvent::Input(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("Failed to read command input: {err}");
                        break;
                    }
                }
            }
            let _ = tx.send(HostEvent::InputClosed);
        })
        .context("Spawning stdin reader")?;
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        path: None,
        config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        resume_mode: ResumeMode::Ask,
        print_config: false,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--resume" => parsed.resume_mode = ResumeMode::Resume,
            "--restart" => parsed.resume_mode = ResumeMode::Restart,
            "--print-config" => parsed.print_config = true,
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a path"))?;
                parsed.config_path = PathBuf::from(value);
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {flag}"),
            _ if parsed.path.is_none() => parsed.path = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument: {arg}"),
        }
    }
    Ok(parsed)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    if env::var_os("RUST_LOG").is_some() {
        info!("RUST_LOG set; ignoring config log level");
        return;
    }
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
