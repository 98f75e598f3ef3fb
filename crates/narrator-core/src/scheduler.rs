//! Sequential narration over a document's sentences.
//!
//! The scheduler is a plain state machine: every operation mutates state and
//! returns the [`NarrationAction`]s the host must carry out (speak a chunk,
//! cancel speech, persist progress, ...). It never calls the speech engine
//! itself, so completions can arrive from any event source as long as they are
//! fed back one at a time through [`NarrationScheduler::chunk_finished`].
//!
//! Two guards keep playback single-threaded in spirit:
//! - the sentence lock: while a sentence's chunks are being dispatched,
//!   `schedule_next` refuses to start another sentence;
//! - the epoch: every interruption (start, stop, seek, parameter change) bumps
//!   it, and completions carrying an older epoch are discarded.

use crate::chunker::{DEFAULT_MAX_CHUNK_CHARS, chunk};
use crate::document::Document;
use crate::progress::ProgressRecord;
use crate::speech::{
    ChunkOutcome, ChunkTicket, MAX_PITCH, MAX_RATE, MAX_VOLUME, MIN_PITCH, MIN_RATE, MIN_VOLUME,
    PlaybackParams, SpeechRequest, clamp_finite,
};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationState {
    Idle,
    Speaking {
        sentence_idx: usize,
        chunk_idx: usize,
    },
    Paused {
        sentence_idx: usize,
        chunk_idx: usize,
    },
    Finished,
    /// The backend refused a dispatch. `start` recovers from here.
    Error {
        sentence_idx: usize,
        reason: String,
    },
}

impl NarrationState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Speaking { .. } => "speaking",
            Self::Paused { .. } => "paused",
            Self::Finished => "finished",
            Self::Error { .. } => "error",
        }
    }

    fn is_active(&self) -> bool {
        matches!(self, Self::Speaking { .. } | Self::Paused { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NarrationAction {
    Speak(SpeechRequest),
    PauseSpeech,
    ResumeSpeech,
    CancelSpeech,
    SaveProgress(ProgressRecord),
    ChapterChanged { chapter_idx: usize, title: String },
    Finished,
}

pub struct NarrationScheduler {
    document: Document,
    params: PlaybackParams,
    max_chunk_chars: usize,
    state: NarrationState,
    current_index: usize,
    current_chapter: usize,
    chunks: Vec<String>,
    chunk_idx: usize,
    sentence_lock: bool,
    chunk_in_flight: bool,
    epoch: u64,
}

impl NarrationScheduler {
    pub fn new(document: Document, params: PlaybackParams) -> Self {
        Self::with_max_chunk_chars(document, params, DEFAULT_MAX_CHUNK_CHARS)
    }

    pub fn with_max_chunk_chars(
        document: Document,
        params: PlaybackParams,
        max_chunk_chars: usize,
    ) -> Self {
        let current_chapter = document.chapter_for_sentence(0).unwrap_or(0);
        Self {
            document,
            params: params.clamped(),
            max_chunk_chars: max_chunk_chars.max(1),
            state: NarrationState::Idle,
            current_index: 0,
            current_chapter,
            chunks: Vec::new(),
            chunk_idx: 0,
            sentence_lock: false,
            chunk_in_flight: false,
            epoch: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn params(&self) -> &PlaybackParams {
        &self.params
    }

    pub fn state(&self) -> &NarrationState {
        &self.state
    }

    /// Next sentence to narrate; `document().len()` once finished.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_chapter(&self) -> usize {
        self.current_chapter
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_dispatching(&self) -> bool {
        self.sentence_lock
    }

    pub fn progress_pct(&self) -> f64 {
        if self.document.is_empty() {
            return 0.0;
        }
        (self.current_index as f64 / self.document.len() as f64) * 100.0
    }

    /// Begin (or restart) narration at `index`, from any state.
    pub fn start(&mut self, index: usize) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        self.interrupt(&mut actions);
        self.current_index = index.min(self.document.len());
        self.state = NarrationState::Speaking {
            sentence_idx: self.current_index,
            chunk_idx: 0,
        };
        info!(
            index = self.current_index,
            epoch = self.epoch,
            "Starting narration"
        );
        self.sync_chapter(&mut actions);
        self.dispatch_next_sentence(&mut actions);
        actions
    }

    /// Dispatch the sentence at the cursor unless one is already in dispatch.
    pub fn schedule_next(&mut self) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        if matches!(self.state, NarrationState::Speaking { .. }) {
            self.dispatch_next_sentence(&mut actions);
        }
        actions
    }

    pub fn chunk_finished(
        &mut self,
        ticket: ChunkTicket,
        outcome: ChunkOutcome,
    ) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        if !self.is_current(ticket) {
            debug!(
                ?ticket,
                epoch = self.epoch,
                current_index = self.current_index,
                "Ignoring stale chunk completion"
            );
            return actions;
        }
        self.chunk_in_flight = false;
        if outcome == ChunkOutcome::Errored {
            warn!(
                sentence_idx = ticket.sentence_idx,
                chunk_idx = ticket.chunk_idx,
                "Speech chunk failed; continuing with next chunk"
            );
        }

        self.chunk_idx += 1;
        if self.chunk_idx >= self.chunks.len() {
            self.complete_sentence(&mut actions);
        } else if let NarrationState::Paused { .. } = self.state {
            self.state = NarrationState::Paused {
                sentence_idx: self.current_index,
                chunk_idx: self.chunk_idx,
            };
        } else {
            self.dispatch_chunk(&mut actions);
        }
        actions
    }

    /// Report that the backend rejected `ticket` outright.
    pub fn dispatch_rejected(&mut self, ticket: ChunkTicket, reason: impl Into<String>) {
        if !self.is_current(ticket) {
            return;
        }
        let reason = reason.into();
        warn!(
            sentence_idx = ticket.sentence_idx,
            %reason,
            "Speech backend rejected chunk; narration halted"
        );
        self.epoch = self.epoch.wrapping_add(1);
        self.clear_dispatch();
        self.state = NarrationState::Error {
            sentence_idx: self.current_index,
            reason,
        };
    }

    pub fn pause(&mut self) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        let NarrationState::Speaking {
            sentence_idx,
            chunk_idx,
        } = self.state
        else {
            debug!(state = self.state.label(), "Pause ignored");
            return actions;
        };
        self.state = NarrationState::Paused {
            sentence_idx,
            chunk_idx,
        };
        if self.chunk_in_flight {
            actions.push(NarrationAction::PauseSpeech);
        }
        info!(sentence_idx, chunk_idx, "Paused narration");
        actions
    }

    pub fn resume(&mut self) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        let NarrationState::Paused { .. } = self.state else {
            debug!(state = self.state.label(), "Resume ignored");
            return actions;
        };
        self.state = NarrationState::Speaking {
            sentence_idx: self.current_index,
            chunk_idx: self.chunk_idx,
        };
        info!(sentence_idx = self.current_index, "Resuming narration");
        if self.chunk_in_flight {
            actions.push(NarrationAction::ResumeSpeech);
        } else if self.sentence_lock {
            // A chunk finished while paused; continue with the next one.
            self.dispatch_chunk(&mut actions);
        } else {
            self.dispatch_next_sentence(&mut actions);
        }
        actions
    }

    /// Cancel speech and go idle. The cursor is kept.
    pub fn stop(&mut self) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        self.interrupt(&mut actions);
        self.state = NarrationState::Idle;
        info!(index = self.current_index, "Stopped narration");
        actions
    }

    /// Move the cursor to a sentence. Playback restarts there if it was
    /// running; a paused session stays paused at the new position.
    pub fn seek_sentence(&mut self, index: usize) -> Vec<NarrationAction> {
        let target = index.min(self.document.len().saturating_sub(1));
        self.reposition(target, None)
    }

    pub fn seek_chapter(&mut self, chapter_idx: usize) -> Vec<NarrationAction> {
        let Some(start) = self.document.chapter_start_sentence(chapter_idx) else {
            warn!(chapter_idx, "Seek to unknown chapter ignored");
            return Vec::new();
        };
        let target = start.min(self.document.len().saturating_sub(1));
        self.reposition(target, Some(chapter_idx))
    }

    /// Place the cursor without starting playback (e.g. restoring progress).
    pub fn set_position(&mut self, index: usize) -> Vec<NarrationAction> {
        let target = index.min(self.document.len());
        let mut actions = Vec::new();
        self.interrupt(&mut actions);
        self.current_index = target;
        self.state = NarrationState::Idle;
        self.sync_chapter(&mut actions);
        actions
    }

    pub fn set_rate(&mut self, rate: f32) -> Vec<NarrationAction> {
        self.params.rate = clamp_finite(rate, MIN_RATE, MAX_RATE, self.params.rate);
        self.after_param_change("rate")
    }

    pub fn set_pitch(&mut self, pitch: f32) -> Vec<NarrationAction> {
        self.params.pitch = clamp_finite(pitch, MIN_PITCH, MAX_PITCH, self.params.pitch);
        self.after_param_change("pitch")
    }

    pub fn set_volume(&mut self, volume: f32) -> Vec<NarrationAction> {
        self.params.volume = clamp_finite(volume, MIN_VOLUME, MAX_VOLUME, self.params.volume);
        self.after_param_change("volume")
    }

    pub fn set_voice(&mut self, voice: Option<String>) -> Vec<NarrationAction> {
        self.params.voice = voice;
        self.after_param_change("voice")
    }

    pub fn set_params(&mut self, params: PlaybackParams) -> Vec<NarrationAction> {
        self.params = params.clamped();
        self.after_param_change("all")
    }

    fn after_param_change(&mut self, parameter: &'static str) -> Vec<NarrationAction> {
        let mut actions = Vec::new();
        if self.state.is_active() {
            self.interrupt(&mut actions);
            self.state = NarrationState::Idle;
            info!(
                parameter,
                index = self.current_index,
                "Playback parameter changed; narration stopped until restarted"
            );
        } else {
            debug!(parameter, "Playback parameter updated");
        }
        actions
    }

    fn reposition(&mut self, target: usize, chapter_idx: Option<usize>) -> Vec<NarrationAction> {
        let was_speaking = matches!(self.state, NarrationState::Speaking { .. });
        let was_paused = matches!(self.state, NarrationState::Paused { .. });
        let mut actions = Vec::new();
        self.interrupt(&mut actions);
        self.current_index = target;
        match chapter_idx {
            Some(chapter_idx) => self.select_chapter(chapter_idx, &mut actions),
            None => self.sync_chapter(&mut actions),
        }
        info!(target, epoch = self.epoch, "Seeking narration cursor");

        if was_speaking {
            self.state = NarrationState::Speaking {
                sentence_idx: target,
                chunk_idx: 0,
            };
            self.dispatch_next_sentence(&mut actions);
        } else if was_paused {
            self.state = NarrationState::Paused {
                sentence_idx: target,
                chunk_idx: 0,
            };
        } else {
            self.state = NarrationState::Idle;
        }
        actions
    }

    fn dispatch_next_sentence(&mut self, actions: &mut Vec<NarrationAction>) {
        if self.sentence_lock {
            debug!(
                index = self.current_index,
                "Sentence already in dispatch; skipping schedule"
            );
            return;
        }
        let Some(text) = self
            .document
            .sentence(self.current_index)
            .map(|sentence| sentence.text.clone())
        else {
            info!(sentences = self.document.len(), "Narration finished");
            self.state = NarrationState::Finished;
            actions.push(NarrationAction::Finished);
            return;
        };

        self.chunks = chunk(&text, self.max_chunk_chars)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.chunk_idx = 0;
        self.sentence_lock = true;
        if self.chunks.is_empty() {
            self.complete_sentence(actions);
        } else {
            self.dispatch_chunk(actions);
        }
    }

    fn dispatch_chunk(&mut self, actions: &mut Vec<NarrationAction>) {
        let Some(text) = self.chunks.get(self.chunk_idx).cloned() else {
            self.complete_sentence(actions);
            return;
        };
        let ticket = ChunkTicket {
            epoch: self.epoch,
            sentence_idx: self.current_index,
            chunk_idx: self.chunk_idx,
        };
        debug!(
            sentence_idx = ticket.sentence_idx,
            chunk_idx = ticket.chunk_idx,
            chunks = self.chunks.len(),
            "Dispatching speech chunk"
        );
        self.chunk_in_flight = true;
        self.state = NarrationState::Speaking {
            sentence_idx: self.current_index,
            chunk_idx: self.chunk_idx,
        };
        actions.push(NarrationAction::Speak(SpeechRequest {
            ticket,
            text,
            params: self.params.clone(),
        }));
    }

    fn complete_sentence(&mut self, actions: &mut Vec<NarrationAction>) {
        self.clear_dispatch();
        self.current_index += 1;
        actions.push(NarrationAction::SaveProgress(ProgressRecord::new(
            self.current_index,
            &self.params,
        )));
        self.sync_chapter(actions);

        if let NarrationState::Paused { .. } = self.state {
            self.state = NarrationState::Paused {
                sentence_idx: self.current_index,
                chunk_idx: 0,
            };
            return;
        }
        self.dispatch_next_sentence(actions);
    }

    fn interrupt(&mut self, actions: &mut Vec<NarrationAction>) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.chunk_in_flight || self.state.is_active() {
            actions.push(NarrationAction::CancelSpeech);
        }
        self.clear_dispatch();
    }

    fn clear_dispatch(&mut self) {
        self.sentence_lock = false;
        self.chunk_in_flight = false;
        self.chunks.clear();
        self.chunk_idx = 0;
    }

    fn is_current(&self, ticket: ChunkTicket) -> bool {
        self.chunk_in_flight
            && ticket.epoch == self.epoch
            && ticket.sentence_idx == self.current_index
            && ticket.chunk_idx == self.chunk_idx
    }

    fn sync_chapter(&mut self, actions: &mut Vec<NarrationAction>) {
        if let Some(chapter_idx) = self.document.chapter_for_sentence(self.current_index) {
            self.select_chapter(chapter_idx, actions);
        }
    }

    fn select_chapter(&mut self, chapter_idx: usize, actions: &mut Vec<NarrationAction>) {
        if chapter_idx == self.current_chapter {
            return;
        }
        self.current_chapter = chapter_idx;
        let title = self
            .document
            .chapters()
            .get(chapter_idx)
            .map(|chapter| chapter.title.clone())
            .unwrap_or_default();
        info!(chapter_idx, %title, "Entered chapter");
        actions.push(NarrationAction::ChapterChanged { chapter_idx, title });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(text: &str) -> NarrationScheduler {
        NarrationScheduler::new(Document::from_text("test.txt", text), PlaybackParams::default())
    }

    fn speak_request(actions: &[NarrationAction]) -> Option<&SpeechRequest> {
        actions.iter().find_map(|action| match action {
            NarrationAction::Speak(request) => Some(request),
            _ => None,
        })
    }

    fn ticket_of(actions: &[NarrationAction]) -> ChunkTicket {
        speak_request(actions).expect("expected a speak action").ticket
    }

    fn saved_indices(actions: &[NarrationAction]) -> Vec<usize> {
        actions
            .iter()
            .filter_map(|action| match action {
                NarrationAction::SaveProgress(record) => Some(record.index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn narrates_every_sentence_in_order_then_finishes() {
        let mut s = scheduler("一。二。三。");
        let mut actions = s.start(0);
        let mut spoken = Vec::new();
        let mut saved = Vec::new();

        while let Some(request) = speak_request(&actions).cloned() {
            spoken.push(request.text.clone());
            actions = s.chunk_finished(request.ticket, ChunkOutcome::Ended);
            saved.extend(saved_indices(&actions));
        }

        assert_eq!(spoken, vec!["一。", "二。", "三。"]);
        assert_eq!(saved, vec![1, 2, 3]);
        assert!(actions.contains(&NarrationAction::Finished));
        assert_eq!(s.state(), &NarrationState::Finished);
        assert_eq!(s.current_index(), 3);
        assert!((s.progress_pct() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn long_sentence_is_spoken_chunk_by_chunk() {
        let text = format!("{}。", "长".repeat(499));
        let mut s = scheduler(&text);
        let mut actions = s.start(0);
        let mut lengths = Vec::new();

        while let Some(request) = speak_request(&actions).cloned() {
            assert_eq!(request.ticket.chunk_idx, lengths.len());
            lengths.push(request.text.chars().count());
            actions = s.chunk_finished(request.ticket, ChunkOutcome::Ended);
            if lengths.len() < 3 {
                assert!(saved_indices(&actions).is_empty());
            }
        }
        assert_eq!(lengths, vec![220, 220, 60]);
        assert_eq!(saved_indices(&actions), vec![1]);
    }

    #[test]
    fn failed_chunks_are_skipped_not_retried() {
        let mut s = scheduler("一。二。");
        let first = ticket_of(&s.start(0));
        let actions = s.chunk_finished(first, ChunkOutcome::Errored);
        let next = speak_request(&actions).expect("narration continues");
        assert_eq!(next.ticket.sentence_idx, 1);
        assert_eq!(next.text, "二。");
    }

    #[test]
    fn double_start_leaves_one_dispatch_chain() {
        let mut s = scheduler("一。二。三。");
        let stale = ticket_of(&s.start(0));
        let second = s.start(0);
        assert!(second.contains(&NarrationAction::CancelSpeech));
        let live = ticket_of(&second);
        assert_ne!(stale.epoch, live.epoch);

        assert!(s.chunk_finished(stale, ChunkOutcome::Ended).is_empty());
        assert_eq!(s.current_index(), 0);

        let actions = s.chunk_finished(live, ChunkOutcome::Ended);
        assert_eq!(speak_request(&actions).map(|r| r.ticket.sentence_idx), Some(1));
        assert_eq!(s.current_index(), 1);
    }

    #[test]
    fn schedule_next_is_a_no_op_while_sentence_in_dispatch() {
        let mut s = scheduler("一。二。");
        s.start(0);
        assert!(s.is_dispatching());
        assert!(s.schedule_next().is_empty());
        assert!(s.is_dispatching());
    }

    #[test]
    fn stop_then_restart_ignores_leftover_completion() {
        let mut s = scheduler("一。二。三。");
        let first = ticket_of(&s.start(0));
        let second = ticket_of(&s.chunk_finished(first, ChunkOutcome::Ended));
        assert_eq!(second.sentence_idx, 1);

        let stop_actions = s.stop();
        assert_eq!(stop_actions, vec![NarrationAction::CancelSpeech]);
        assert_eq!(s.state(), &NarrationState::Idle);
        assert!(!s.is_dispatching());

        let restart = ticket_of(&s.start(0));
        assert_eq!(s.current_index(), 0);
        assert!(s.chunk_finished(second, ChunkOutcome::Ended).is_empty());
        assert_eq!(s.current_index(), 0);
        assert_eq!(restart.sentence_idx, 0);
    }

    #[test]
    fn pause_and_resume_delegate_to_backend() {
        let mut s = scheduler("一。二。");
        let ticket = ticket_of(&s.start(0));
        assert_eq!(s.pause(), vec![NarrationAction::PauseSpeech]);
        assert!(matches!(s.state(), NarrationState::Paused { .. }));
        assert!(s.pause().is_empty());

        assert_eq!(s.resume(), vec![NarrationAction::ResumeSpeech]);
        assert!(s.resume().is_empty());
        let actions = s.chunk_finished(ticket, ChunkOutcome::Ended);
        assert_eq!(speak_request(&actions).map(|r| r.ticket.sentence_idx), Some(1));
    }

    #[test]
    fn completion_while_paused_defers_next_dispatch() {
        let mut s = scheduler("一。二。");
        let ticket = ticket_of(&s.start(0));
        s.pause();
        let actions = s.chunk_finished(ticket, ChunkOutcome::Ended);
        assert_eq!(saved_indices(&actions), vec![1]);
        assert!(speak_request(&actions).is_none());
        assert_eq!(
            s.state(),
            &NarrationState::Paused {
                sentence_idx: 1,
                chunk_idx: 0
            }
        );

        let resumed = s.resume();
        assert_eq!(speak_request(&resumed).map(|r| r.text.as_str()), Some("二。"));
    }

    #[test]
    fn chapter_change_is_reported_once_per_boundary() {
        let mut s = scheduler("第一章\n甲。乙。\n\n第二章\n丙。");
        let mut actions = s.start(0);
        let mut changes = Vec::new();
        while let Some(request) = speak_request(&actions).cloned() {
            actions = s.chunk_finished(request.ticket, ChunkOutcome::Ended);
            changes.extend(actions.iter().filter_map(|action| match action {
                NarrationAction::ChapterChanged { chapter_idx, title } => {
                    Some((*chapter_idx, title.clone()))
                }
                _ => None,
            }));
        }
        assert_eq!(changes, vec![(1, "第二章".to_string())]);
        assert_eq!(s.current_chapter(), 1);
    }

    #[test]
    fn parameter_change_while_speaking_stops_but_keeps_position() {
        let mut s = scheduler("一。二。三。");
        let first = ticket_of(&s.start(0));
        s.chunk_finished(first, ChunkOutcome::Ended);

        let actions = s.set_rate(2.0);
        assert_eq!(actions, vec![NarrationAction::CancelSpeech]);
        assert_eq!(s.state(), &NarrationState::Idle);
        assert_eq!(s.current_index(), 1);
        assert!((s.params().rate - 2.0).abs() < f32::EPSILON);

        let restarted = s.start(s.current_index());
        let request = speak_request(&restarted).expect("restart speaks");
        assert!((request.params.rate - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn parameter_change_while_idle_only_updates_params() {
        let mut s = scheduler("一。");
        assert!(s.set_volume(3.0).is_empty());
        assert!((s.params().volume - MAX_VOLUME).abs() < f32::EPSILON);
        assert!(s.set_voice(Some("Tingting".to_string())).is_empty());
        assert_eq!(s.params().voice.as_deref(), Some("Tingting"));
    }

    #[test]
    fn seek_while_speaking_restarts_at_target() {
        let mut s = scheduler("一。二。三。四。");
        let stale = ticket_of(&s.start(0));
        let actions = s.seek_sentence(2);
        assert_eq!(actions.first(), Some(&NarrationAction::CancelSpeech));
        assert_eq!(speak_request(&actions).map(|r| r.text.as_str()), Some("三。"));
        assert!(s.chunk_finished(stale, ChunkOutcome::Ended).is_empty());
        assert_eq!(s.current_index(), 2);
    }

    #[test]
    fn seek_while_paused_stays_paused_and_resume_uses_new_position() {
        let mut s = scheduler("一。二。三。");
        s.start(0);
        s.pause();
        let actions = s.seek_sentence(2);
        assert_eq!(actions, vec![NarrationAction::CancelSpeech]);
        assert_eq!(
            s.state(),
            &NarrationState::Paused {
                sentence_idx: 2,
                chunk_idx: 0
            }
        );
        let resumed = s.resume();
        assert_eq!(speak_request(&resumed).map(|r| r.text.as_str()), Some("三。"));
    }

    #[test]
    fn seek_chapter_jumps_to_first_sentence_of_chapter() {
        let mut s = scheduler("第一章\n甲。乙。\n\n第二章\n丙。丁。");
        let actions = s.seek_chapter(1);
        assert!(actions.contains(&NarrationAction::ChapterChanged {
            chapter_idx: 1,
            title: "第二章".to_string()
        }));
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.state(), &NarrationState::Idle);
        assert!(s.seek_chapter(5).is_empty());
    }

    #[test]
    fn empty_document_finishes_immediately() {
        let mut s = scheduler("   ");
        let actions = s.start(0);
        assert_eq!(actions, vec![NarrationAction::Finished]);
        assert_eq!(s.state(), &NarrationState::Finished);
        assert!(s.seek_sentence(3).is_empty());
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn rejected_dispatch_enters_error_and_start_recovers() {
        let mut s = scheduler("一。二。");
        let ticket = ticket_of(&s.start(1));
        s.dispatch_rejected(ticket, "no voices installed");
        assert!(matches!(
            s.state(),
            NarrationState::Error { sentence_idx: 1, .. }
        ));
        assert!(!s.is_dispatching());
        assert!(s.chunk_finished(ticket, ChunkOutcome::Ended).is_empty());

        let actions = s.start(s.current_index());
        assert_eq!(speak_request(&actions).map(|r| r.text.as_str()), Some("二。"));
    }

    #[test]
    fn set_position_clamps_and_stays_idle() {
        let mut s = scheduler("一。二。");
        assert!(s.set_position(99).is_empty());
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.state(), &NarrationState::Idle);
        assert_eq!(s.start(s.current_index()), vec![NarrationAction::Finished]);
    }
}
