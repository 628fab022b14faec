pub mod selector;
pub mod sentence;
pub mod word;

use thiserror::Error;

pub use selector::{ActiveLesson, LessonSelector, Progress};
pub use sentence::{SentencePhase, SentenceProgress, SentenceStep, StepOutcome};
pub use word::{AdvanceOutcome, WordPhase, WordProgress, WordState};

/// A transition requested from a state that does not allow it.
///
/// Learner input cannot normally produce these; the engines reject the call
/// and leave their state untouched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("no sentence is active")]
    NoActiveItem,
    #[error("sentence {0} is already active")]
    ItemAlreadyActive(u32),
    #[error("item {0} is not part of this lesson")]
    UnknownItem(u32),
    #[error("the word drill is already finished")]
    Finished,
    #[error("no lesson is active")]
    NoActiveLesson,
    #[error("the active lesson is not a {0} lesson")]
    WrongKind(&'static str),
}
