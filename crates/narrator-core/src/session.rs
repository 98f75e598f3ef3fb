//! Host-facing narration session.
//!
//! Wraps a [`NarrationScheduler`] together with a speech backend and a progress
//! store, carrying out the scheduler's actions and exposing a command surface
//! plus a serializable snapshot for front ends.

use crate::config::AppConfig;
use crate::document::Document;
use crate::progress::{ProgressRecord, ProgressStore};
use crate::scheduler::{NarrationAction, NarrationScheduler, NarrationState};
use crate::speech::{ChunkOutcome, ChunkTicket, PlaybackParams, SpeechBackend};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Saved position offered to the user after loading a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeOffer {
    pub index: usize,
    pub params: PlaybackParams,
    pub saved_at_ms: u64,
}

impl From<ProgressRecord> for ResumeOffer {
    fn from(record: ProgressRecord) -> Self {
        Self {
            index: record.index,
            params: record.params(),
            saved_at_ms: record.saved_at_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    GetSnapshot,
    Play,
    PlayFrom { index: usize },
    Pause,
    Resume,
    TogglePlayPause,
    Stop,
    SeekSentence { index: usize },
    SeekChapter { chapter: usize },
    SeekNextChapter,
    SeekPrevChapter,
    SetRate { rate: f32 },
    SetPitch { pitch: f32 },
    SetVolume { volume: f32 },
    SetVoice { voice: Option<String> },
    AcceptResume,
    DeclineResume,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "narrator_get_snapshot",
            Self::Play => "narrator_play",
            Self::PlayFrom { .. } => "narrator_play_from",
            Self::Pause => "narrator_pause",
            Self::Resume => "narrator_resume",
            Self::TogglePlayPause => "narrator_toggle_play_pause",
            Self::Stop => "narrator_stop",
            Self::SeekSentence { .. } => "narrator_seek_sentence",
            Self::SeekChapter { .. } => "narrator_seek_chapter",
            Self::SeekNextChapter => "narrator_seek_next_chapter",
            Self::SeekPrevChapter => "narrator_seek_prev_chapter",
            Self::SetRate { .. } => "narrator_set_rate",
            Self::SetPitch { .. } => "narrator_set_pitch",
            Self::SetVolume { .. } => "narrator_set_volume",
            Self::SetVoice { .. } => "narrator_set_voice",
            Self::AcceptResume => "narrator_accept_resume",
            Self::DeclineResume => "narrator_decline_resume",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrationSnapshot {
    pub key: String,
    pub state: &'static str,
    pub current_index: usize,
    pub sentence_count: usize,
    pub current_sentence: Option<String>,
    pub chapter_index: usize,
    pub chapter_count: usize,
    pub chapter_title: String,
    pub params: PlaybackParams,
    pub progress_pct: f64,
    pub status: String,
    pub resume_offer: Option<ResumeOffer>,
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: NarrationSnapshot,
}

pub struct NarrationSession<B: SpeechBackend, S: ProgressStore> {
    scheduler: NarrationScheduler,
    backend: B,
    store: S,
    resume_offer: Option<ResumeOffer>,
    status: String,
}

impl<B: SpeechBackend, S: ProgressStore> NarrationSession<B, S> {
    pub fn new(document: Document, config: &AppConfig, backend: B, store: S) -> Self {
        let resume_offer = store.load(document.key()).map(ResumeOffer::from);
        let status = if resume_offer.is_some() {
            format!("Loaded: {} (saved progress found)", document.key())
        } else {
            format!("Loaded: {}", document.key())
        };
        if let Some(offer) = &resume_offer {
            info!(
                key = document.key(),
                index = offer.index,
                "Found saved narration progress"
            );
        }
        let scheduler = NarrationScheduler::with_max_chunk_chars(
            document,
            config.playback_params(),
            config.max_chunk_chars,
        );
        Self {
            scheduler,
            backend,
            store,
            resume_offer,
            status,
        }
    }

    pub fn scheduler(&self) -> &NarrationScheduler {
        &self.scheduler
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resume_offer(&self) -> Option<&ResumeOffer> {
        self.resume_offer.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.scheduler.state(), NarrationState::Finished)
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        debug!(action, "Applying session command");
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::Play => self.play(),
            SessionCommand::PlayFrom { index } => self.play_from(index),
            SessionCommand::Pause => self.pause(),
            SessionCommand::Resume => self.resume(),
            SessionCommand::TogglePlayPause => self.toggle_play_pause(),
            SessionCommand::Stop => self.stop(),
            SessionCommand::SeekSentence { index } => self.seek_sentence(index),
            SessionCommand::SeekChapter { chapter } => self.seek_chapter(chapter),
            SessionCommand::SeekNextChapter => {
                let next = self.scheduler.current_chapter() + 1;
                self.seek_chapter(next)
            }
            SessionCommand::SeekPrevChapter => {
                let prev = self.scheduler.current_chapter().saturating_sub(1);
                self.seek_chapter(prev)
            }
            SessionCommand::SetRate { rate } => {
                let actions = self.scheduler.set_rate(rate);
                self.run_param_change(actions);
            }
            SessionCommand::SetPitch { pitch } => {
                let actions = self.scheduler.set_pitch(pitch);
                self.run_param_change(actions);
            }
            SessionCommand::SetVolume { volume } => {
                let actions = self.scheduler.set_volume(volume);
                self.run_param_change(actions);
            }
            SessionCommand::SetVoice { voice } => {
                let actions = self.scheduler.set_voice(voice);
                self.run_param_change(actions);
            }
            SessionCommand::AcceptResume => self.accept_resume(),
            SessionCommand::DeclineResume => self.decline_resume(),
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
        }
    }

    /// Feed one backend completion back into the scheduler.
    pub fn chunk_completed(&mut self, ticket: ChunkTicket, outcome: ChunkOutcome) {
        let actions = self.scheduler.chunk_finished(ticket, outcome);
        self.run(actions);
        self.refresh_status();
    }

    pub fn play(&mut self) {
        match self.scheduler.state() {
            NarrationState::Speaking { .. } => debug!("Play ignored while speaking"),
            NarrationState::Paused { .. } => self.resume(),
            _ => {
                let index = self.scheduler.current_index();
                self.play_from(index);
            }
        }
    }

    pub fn play_from(&mut self, index: usize) {
        self.dismiss_resume_offer();
        let actions = self.scheduler.start(index);
        self.run(actions);
        self.refresh_status();
    }

    pub fn pause(&mut self) {
        let actions = self.scheduler.pause();
        self.run(actions);
        self.refresh_status();
    }

    pub fn resume(&mut self) {
        let actions = self.scheduler.resume();
        self.run(actions);
        self.refresh_status();
    }

    pub fn toggle_play_pause(&mut self) {
        match self.scheduler.state() {
            NarrationState::Speaking { .. } => self.pause(),
            _ => self.play(),
        }
    }

    pub fn stop(&mut self) {
        let actions = self.scheduler.stop();
        self.run(actions);
        self.status = "Stopped".to_string();
    }

    pub fn seek_sentence(&mut self, index: usize) {
        self.dismiss_resume_offer();
        let actions = self.scheduler.seek_sentence(index);
        self.run(actions);
        self.status = format!("Jumped to sentence {}", self.scheduler.current_index() + 1);
        self.refresh_status();
    }

    pub fn seek_chapter(&mut self, chapter_idx: usize) {
        if chapter_idx >= self.scheduler.document().chapters().len() {
            debug!(chapter_idx, "Chapter seek out of range ignored");
            return;
        }
        self.dismiss_resume_offer();
        let actions = self.scheduler.seek_chapter(chapter_idx);
        self.run(actions);
        self.status = format!("Jumped to: {}", self.chapter_title());
        self.refresh_status();
    }

    /// Restore the saved position and playback parameters without starting.
    pub fn accept_resume(&mut self) {
        let Some(offer) = self.resume_offer.take() else {
            debug!("No saved progress to resume");
            return;
        };
        let mut actions = self.scheduler.set_params(offer.params);
        actions.extend(self.scheduler.set_position(offer.index));
        self.run(actions);
        info!(
            index = self.scheduler.current_index(),
            "Restored saved narration progress"
        );
        self.status = format!(
            "Loaded: {}, resuming at sentence {}",
            self.scheduler.document().key(),
            self.scheduler.current_index() + 1
        );
    }

    pub fn decline_resume(&mut self) {
        if self.resume_offer.take().is_none() {
            debug!("No saved progress to decline");
            return;
        }
        let actions = self.scheduler.set_position(0);
        self.run(actions);
        self.status = format!("Loaded: {}", self.scheduler.document().key());
    }

    pub fn snapshot(&self) -> NarrationSnapshot {
        let document = self.scheduler.document();
        let current_index = self.scheduler.current_index();
        NarrationSnapshot {
            key: document.key().to_string(),
            state: self.scheduler.state().label(),
            current_index,
            sentence_count: document.len(),
            current_sentence: document.sentence(current_index).map(|s| s.text.clone()),
            chapter_index: self.scheduler.current_chapter(),
            chapter_count: document.chapters().len(),
            chapter_title: self.chapter_title(),
            params: self.scheduler.params().clone(),
            progress_pct: self.scheduler.progress_pct(),
            status: self.status.clone(),
            resume_offer: self.resume_offer.clone(),
        }
    }

    fn chapter_title(&self) -> String {
        self.scheduler
            .document()
            .chapters()
            .get(self.scheduler.current_chapter())
            .map(|chapter| chapter.title.clone())
            .unwrap_or_default()
    }

    fn dismiss_resume_offer(&mut self) {
        if self.resume_offer.take().is_some() {
            debug!("Saved progress offer dismissed");
        }
    }

    fn run_param_change(&mut self, actions: Vec<NarrationAction>) {
        let interrupted = actions.contains(&NarrationAction::CancelSpeech);
        self.run(actions);
        if interrupted {
            self.status = "Settings changed; press play to continue".to_string();
        }
    }

    fn run(&mut self, actions: Vec<NarrationAction>) {
        for action in actions {
            match action {
                NarrationAction::Speak(request) => {
                    if let Err(err) = self.backend.speak(&request) {
                        self.scheduler
                            .dispatch_rejected(request.ticket, format!("{err:#}"));
                    }
                }
                NarrationAction::PauseSpeech => self.backend.pause(),
                NarrationAction::ResumeSpeech => self.backend.resume(),
                NarrationAction::CancelSpeech => self.backend.cancel(),
                NarrationAction::SaveProgress(record) => {
                    let key = self.scheduler.document().key();
                    if let Err(err) = self.store.save(key, &record) {
                        warn!(key, index = record.index, "Failed to save progress: {err:#}");
                    }
                }
                NarrationAction::ChapterChanged { chapter_idx, title } => {
                    debug!(chapter_idx, %title, "Chapter changed");
                }
                NarrationAction::Finished => {}
            }
        }
    }

    /// Status text for states that carry their own message.
    fn refresh_status(&mut self) {
        self.status = match self.scheduler.state() {
            NarrationState::Speaking { sentence_idx, .. } => {
                format!("Reading (sentence {})", sentence_idx + 1)
            }
            NarrationState::Paused { .. } => "Paused".to_string(),
            NarrationState::Finished => "Finished".to_string(),
            NarrationState::Error { reason, .. } => format!("Speech unavailable: {reason}"),
            NarrationState::Idle => return,
        };
    }
}
