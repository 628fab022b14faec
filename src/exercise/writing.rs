use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crossterm::event::KeyEvent;

use crate::ai::Ticket;
use crate::config::WritingCheck;
use crate::content::StudyItem;
use crate::exercise::Feedback;
use crate::ui::line_input::{InputResult, LineInput};
use crate::validate::{RecallVerdict, Verdict, check_recall};

/// Handwriting photos larger than this are refused before upload.
const MAX_IMAGE_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritingMode {
    /// Last sentence step: write the sentence from its Korean meaning.
    Recall,
    /// Last word phase: write the word you hear.
    Dictation,
}

/// Write the English from memory, either typed or as a handwriting photo.
pub struct Writing {
    pub item: StudyItem,
    pub mode: WritingMode,
    pub check: WritingCheck,
    input: LineInput,
    hint: bool,
    pending: Option<Ticket>,
    feedback: Option<Feedback>,
    solved: bool,
}

impl Writing {
    pub fn new(item: StudyItem, mode: WritingMode, check: WritingCheck) -> Self {
        let input = match check {
            WritingCheck::Typed => LineInput::new(""),
            WritingCheck::Handwriting => LineInput::with_image_paths(""),
        };
        Self {
            item,
            mode,
            check,
            input,
            hint: false,
            pending: None,
            feedback: None,
            solved: false,
        }
    }

    pub fn input(&self) -> &LineInput {
        &self.input
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn is_checking(&self) -> bool {
        self.pending.is_some()
    }

    pub fn hint_shown(&self) -> bool {
        self.hint
    }

    /// Dictation only: show the word being spelled.
    pub fn reveal_hint(&mut self) {
        if self.mode == WritingMode::Dictation {
            self.hint = true;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputResult {
        if self.solved || self.is_checking() {
            return InputResult::Continue;
        }
        self.input.handle(key)
    }

    /// Compare the typed answer against the English text.
    pub fn submit_typed(&mut self) -> bool {
        if self.solved || self.input.is_blank() {
            return self.solved;
        }
        self.feedback = Some(match check_recall(self.input.value(), &self.item.english) {
            RecallVerdict::Pass => {
                self.solved = true;
                Feedback::success("Great writing!")
            }
            RecallVerdict::MissingPeriod => {
                Feedback::warning("Almost! Don't forget the period (.) at the end.")
            }
            RecallVerdict::Mismatch => Feedback::error("Not quite. Try again!"),
        });
        self.solved
    }

    /// Read the photo named in the input as a base64 `data:` URI. Problems
    /// become feedback and `None`.
    pub fn handwriting_payload(&mut self) -> Option<String> {
        if self.solved || self.is_checking() || self.input.is_blank() {
            return None;
        }
        let path = expand_home(self.input.value().trim());
        match read_image(&path) {
            Ok(encoded) => Some(encoded),
            Err(message) => {
                log::warn!("handwriting image {}: {message}", path.display());
                self.feedback = Some(Feedback::error(message));
                None
            }
        }
    }

    pub fn judging(&mut self, ticket: Ticket) {
        self.pending = Some(ticket);
        self.feedback = Some(Feedback::info("Checking your handwriting..."));
    }

    /// Apply a judge verdict. Verdicts for other tickets are ignored.
    pub fn accept_verdict(&mut self, ticket: Ticket, verdict: Verdict) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        let message = if verdict.feedback.trim().is_empty() {
            if verdict.correct {
                "Great writing!".to_string()
            } else {
                "Not quite. Try again!".to_string()
            }
        } else {
            verdict.feedback
        };
        if verdict.correct {
            self.solved = true;
            self.feedback = Some(Feedback::success(message));
        } else {
            self.feedback = Some(Feedback::error(message));
        }
        true
    }

    pub fn judge_timed_out(&mut self, ticket: Ticket) -> bool {
        if self.pending != Some(ticket) {
            return false;
        }
        self.pending = None;
        self.feedback = Some(Feedback::error(
            "Checking took too long. Press Enter to try again.",
        ));
        true
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    }
}

fn read_image(path: &Path) -> Result<String, String> {
    let meta = fs::metadata(path).map_err(|_| "Can't find that picture.".to_string())?;
    if !meta.is_file() {
        return Err("That is a folder, not a picture.".to_string());
    }
    if meta.len() > MAX_IMAGE_BYTES {
        return Err("That picture is too big.".to_string());
    }
    let bytes = fs::read(path).map_err(|_| "Can't open that picture.".to_string())?;
    let mime =
        image_mime(&bytes).ok_or_else(|| "Please use a PNG or JPEG picture.".to_string())?;
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

/// Photo type from its magic bytes.
fn image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else {
        None
    }
}
