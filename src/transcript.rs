//! Console speech backend.
//!
//! Prints each chunk as it is "spoken" and simulates its duration on a helper
//! thread, reporting completion back to the main loop over the event channel.

use crate::HostEvent;
use anyhow::{Context, Result};
use narrator_core::speech::{ChunkOutcome, SpeechBackend, SpeechRequest, Voice};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const TICK: Duration = Duration::from_millis(20);

struct Playback {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

pub struct TranscriptBackend {
    events: Sender<HostEvent>,
    chars_per_second: f32,
    voices: Vec<Voice>,
    echo: bool,
    current: Option<Playback>,
}

impl TranscriptBackend {
    pub fn new(events: Sender<HostEvent>, chars_per_second: f32) -> Self {
        Self {
            events,
            chars_per_second,
            voices: built_in_voices(),
            echo: true,
            current: None,
        }
    }

    #[cfg(test)]
    fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    fn duration_for(&self, request: &SpeechRequest) -> Duration {
        let chars = request.text.chars().count() as f32;
        let per_second = (self.chars_per_second * request.params.rate).max(0.1);
        Duration::from_secs_f32(chars / per_second)
    }

    fn cancel_current(&mut self) {
        if let Some(playback) = self.current.take() {
            playback.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

fn built_in_voices() -> Vec<Voice> {
    vec![
        Voice {
            name: "transcript-zh".to_string(),
            lang: "zh-CN".to_string(),
            is_default: true,
        },
        Voice {
            name: "transcript-en".to_string(),
            lang: "en-US".to_string(),
            is_default: false,
        },
    ]
}

impl SpeechBackend for TranscriptBackend {
    fn speak(&mut self, request: &SpeechRequest) -> Result<()> {
        if let Some(voice) = request.params.voice.as_deref() {
            if !self.voices.iter().any(|v| v.name == voice) {
                warn!(voice, "Unknown voice; using engine default");
            }
        }
        self.cancel_current();

        let ticket = request.ticket;
        let duration = self.duration_for(request);
        if self.echo {
            let marker = if ticket.chunk_idx == 0 {
                format!("[{}]", ticket.sentence_idx + 1)
            } else {
                format!("[{}.{}]", ticket.sentence_idx + 1, ticket.chunk_idx + 1)
            };
            println!("{marker} {}", request.text);
        }

        let paused = Arc::new(AtomicBool::new(false));
        let cancelled = Arc::new(AtomicBool::new(false));
        let events = self.events.clone();
        let thread_paused = Arc::clone(&paused);
        let thread_cancelled = Arc::clone(&cancelled);

        thread::Builder::new()
            .name("transcript-speech".to_string())
            .spawn(move || {
                let mut remaining = duration;
                while !remaining.is_zero() {
                    if thread_cancelled.load(Ordering::SeqCst) {
                        debug!(?ticket, "Transcript playback cancelled");
                        return;
                    }
                    thread::sleep(TICK.min(remaining));
                    if !thread_paused.load(Ordering::SeqCst) {
                        remaining = remaining.saturating_sub(TICK);
                    }
                }
                if thread_cancelled.load(Ordering::SeqCst) {
                    return;
                }
                let _ = events.send(HostEvent::Chunk {
                    ticket,
                    outcome: ChunkOutcome::Ended,
                });
            })
            .context("Spawning transcript playback thread")?;

        self.current = Some(Playback { paused, cancelled });
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(playback) = &self.current {
            playback.paused.store(true, Ordering::SeqCst);
        }
    }

    fn resume(&mut self) {
        if let Some(playback) = &self.current {
            playback.paused.store(false, Ordering::SeqCst);
        }
    }

    fn cancel(&mut self) {
        self.cancel_current();
    }
}
