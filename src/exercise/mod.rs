//! Scratch state for the activity on screen.
//!
//! An exercise is mounted for one engine state and thrown away when the
//! state changes. It only reports whether it is solved; the engines never
//! read it, and a failed attempt never touches progression.

pub mod blanks;
pub mod quiz;
pub mod scramble;
pub mod study;
pub mod writing;

use std::path::PathBuf;

use crate::ai::Ticket;

pub use blanks::Blanks;
pub use quiz::{Quiz, QuizDirection};
pub use scramble::Scramble;
pub use study::StudyCard;
pub use writing::{Writing, WritingMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

/// A one-line message under the exercise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Feedback {
    pub tone: Tone,
    pub message: String,
}

impl Feedback {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Error,
            message: message.into(),
        }
    }
}

/// A generated asset that may still be on its way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Media {
    #[default]
    Idle,
    Loading(Ticket),
    Ready(PathBuf),
    Failed,
}

impl Media {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Media::Loading(ticket) => Some(*ticket),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Media::Ready(path) => Some(path),
            _ => None,
        }
    }
}

pub enum Exercise {
    Study(StudyCard),
    Scramble(Scramble),
    Blanks(Blanks),
    Writing(Writing),
    Quiz(Quiz),
}

impl Exercise {
    pub fn is_solved(&self) -> bool {
        match self {
            Exercise::Study(card) => card.is_solved(),
            Exercise::Scramble(scramble) => scramble.is_solved(),
            Exercise::Blanks(blanks) => blanks.is_solved(),
            Exercise::Writing(writing) => writing.is_solved(),
            Exercise::Quiz(quiz) => quiz.is_solved(),
        }
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Exercise::Study(_) => None,
            Exercise::Scramble(scramble) => scramble.feedback(),
            Exercise::Blanks(blanks) => blanks.feedback(),
            Exercise::Writing(writing) => writing.feedback(),
            Exercise::Quiz(quiz) => quiz.feedback(),
        }
    }

    /// True while a text field is focused, so letter keys go to it rather
    /// than to screen shortcuts.
    pub fn captures_text(&self) -> bool {
        match self {
            Exercise::Blanks(blanks) => !blanks.is_solved(),
            Exercise::Writing(writing) => !writing.is_solved(),
            _ => false,
        }
    }
}
