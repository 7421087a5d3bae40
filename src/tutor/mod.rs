//! Response generation: prompt assembly, mode dispatch, and output validation.

pub mod prompts;
pub mod service;
pub mod types;

pub use service::{TutorApi, TutorService};
pub use types::{ChatTurn, ExamItem, Flashcard, IngestOutcome, Mode, TutorError};
