use rand::Rng;

use crate::content::StudyItem;
use crate::exercise::Feedback;
use crate::ui::line_input::{InputResult, LineInput};
use crate::validate::wrong_blanks;

/// Chance that any one token stays visible.
pub const VISIBLE_PROBABILITY: f64 = 0.6;

/// Sentence step three: type the missing words.
pub struct Blanks {
    tokens: Vec<String>,
    /// Token positions that are hidden, ascending.
    blanks: Vec<usize>,
    inputs: Vec<LineInput>,
    /// Index into `blanks` of the focused field.
    pub focus: usize,
    wrong: Vec<usize>,
    feedback: Option<Feedback>,
    solved: bool,
}

impl Blanks {
    pub fn new<R: Rng + ?Sized>(item: &StudyItem, rng: &mut R) -> Self {
        let tokens: Vec<String> = item.tokens().into_iter().map(str::to_string).collect();
        let blanks = choose_blanks(tokens.len(), rng);
        Self {
            inputs: blanks.iter().map(|_| LineInput::new("")).collect(),
            tokens,
            blanks,
            focus: 0,
            wrong: Vec::new(),
            feedback: None,
            solved: false,
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn blanks(&self) -> &[usize] {
        &self.blanks
    }

    /// The entry field for token `position`, if that token is hidden.
    pub fn input_at(&self, position: usize) -> Option<&LineInput> {
        let slot = self.blanks.iter().position(|&p| p == position)?;
        self.inputs.get(slot)
    }

    pub fn focused_position(&self) -> Option<usize> {
        self.blanks.get(self.focus).copied()
    }

    pub fn is_wrong(&self, position: usize) -> bool {
        self.wrong.contains(&position)
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn focus_next(&mut self) {
        if !self.blanks.is_empty() {
            self.focus = (self.focus + 1) % self.blanks.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.blanks.is_empty() {
            self.focus = (self.focus + self.blanks.len() - 1) % self.blanks.len();
        }
    }

    /// Route a key to the focused field. Returns the field's result so the
    /// caller can react to Submit/Cancel.
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> InputResult {
        if self.solved {
            return InputResult::Continue;
        }
        let Some(input) = self.inputs.get_mut(self.focus) else {
            return InputResult::Continue;
        };
        let result = input.handle(key);
        match result {
            InputResult::NextField => self.focus_next(),
            InputResult::PrevField => self.focus_prev(),
            _ => {}
        }
        result
    }

    /// Check every blank. Entries are kept on failure so they can be fixed.
    pub fn check(&mut self) -> bool {
        if self.solved {
            return true;
        }
        let tokens: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        let entries: Vec<String> = self.inputs.iter().map(|i| i.value().to_string()).collect();
        self.wrong = wrong_blanks(&tokens, &self.blanks, &entries);

        if self.wrong.is_empty() {
            self.solved = true;
            self.feedback = Some(Feedback::success("All blanks filled!"));
        } else {
            let words = if self.wrong.len() == 1 { "blank" } else { "blanks" };
            self.feedback = Some(Feedback::error(format!(
                "{} {words} to fix. Try again!",
                self.wrong.len()
            )));
            if let Some(slot) = self.blanks.iter().position(|p| self.wrong.contains(p)) {
                self.focus = slot;
            }
        }
        self.solved
    }
}

/// Each token is hidden with probability `1 - VISIBLE_PROBABILITY`. If that
/// hides nothing, the last token is hidden so there is always something to do.
pub fn choose_blanks<R: Rng + ?Sized>(token_count: usize, rng: &mut R) -> Vec<usize> {
    let mut blanks: Vec<usize> = (0..token_count)
        .filter(|_| !rng.gen_bool(VISIBLE_PROBABILITY))
        .collect();
    if blanks.is_empty() && token_count > 0 {
        blanks.push(token_count - 1);
    }
    blanks
}
