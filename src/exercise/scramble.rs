use rand::Rng;
use rand::seq::SliceRandom;

use crate::content::StudyItem;
use crate::exercise::Feedback;
use crate::validate::sequence_matches;

/// Sentence step two: rebuild the sentence from shuffled word tiles.
pub struct Scramble {
    target: String,
    tokens: Vec<String>,
    bank: Vec<String>,
    answer: Vec<String>,
    /// Selected tile in the bank.
    pub cursor: usize,
    feedback: Option<Feedback>,
    solved: bool,
}

impl Scramble {
    pub fn new<R: Rng + ?Sized>(item: &StudyItem, rng: &mut R) -> Self {
        let tokens: Vec<String> = item.tokens().into_iter().map(str::to_string).collect();
        Self {
            target: item.english.clone(),
            bank: shuffled(&tokens, rng),
            tokens,
            answer: Vec::new(),
            cursor: 0,
            feedback: None,
            solved: false,
        }
    }

    pub fn bank(&self) -> &[String] {
        &self.bank
    }

    pub fn answer(&self) -> &[String] {
        &self.answer
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Checking is offered once every tile has been placed.
    pub fn ready_to_check(&self) -> bool {
        self.bank.is_empty() && !self.solved
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.bank.is_empty() {
            self.cursor = 0;
            return;
        }
        let len = self.bank.len() as isize;
        self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
    }

    /// Move the selected bank tile to the end of the answer row.
    pub fn pick(&mut self) {
        if self.solved || self.cursor >= self.bank.len() {
            return;
        }
        let tile = self.bank.remove(self.cursor);
        self.answer.push(tile);
        self.cursor = self.cursor.min(self.bank.len().saturating_sub(1));
        self.feedback = None;
    }

    /// Return the last placed tile to the bank.
    pub fn unpick(&mut self) {
        if self.solved {
            return;
        }
        if let Some(tile) = self.answer.pop() {
            self.bank.push(tile);
            self.feedback = None;
        }
    }

    /// Put every tile back in the bank in its current order.
    pub fn reset(&mut self) {
        if self.solved {
            return;
        }
        self.bank.append(&mut self.answer);
        self.cursor = 0;
        self.feedback = None;
    }

    /// Compare the answer row to the sentence. A wrong order reshuffles.
    pub fn check<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.ready_to_check() {
            return self.solved;
        }
        if sequence_matches(&self.answer, &self.target) {
            self.solved = true;
            self.feedback = Some(Feedback::success("Perfect order!"));
        } else {
            self.answer.clear();
            self.bank = shuffled(&self.tokens, rng);
            self.cursor = 0;
            self.feedback = Some(Feedback::error("Not quite. Try again!"));
        }
        self.solved
    }
}

/// A shuffle of `tokens` that is never already in order, unless every
/// token is the same (then no other order exists).
pub fn shuffled<R: Rng + ?Sized>(tokens: &[String], rng: &mut R) -> Vec<String> {
    let mut bank = tokens.to_vec();
    bank.shuffle(rng);
    if bank == tokens && tokens.iter().any(|t| t != &tokens[0]) {
        bank.rotate_left(1);
    }
    bank
}
