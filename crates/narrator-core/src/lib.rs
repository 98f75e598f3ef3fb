//! Sentence segmentation, chapter navigation and resumable narration
//! scheduling for long plain-text documents.

pub mod chapters;
pub mod chunker;
pub mod config;
pub mod document;
pub mod loader;
pub mod navigation;
pub mod progress;
pub mod scheduler;
pub mod segmenter;
pub mod session;
pub mod speech;

pub use document::Document;
pub use scheduler::{NarrationAction, NarrationScheduler, NarrationState};
pub use session::{NarrationSession, NarrationSnapshot, SessionCommand, SessionEvent};
