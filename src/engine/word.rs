use std::collections::BTreeSet;

use crate::content::Lesson;
use crate::engine::TransitionError;

/// Word drills sweep every item once per phase, in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WordPhase {
    Meaning,
    Spelling,
    Dictation,
}

impl WordPhase {
    pub const ALL: [WordPhase; 3] = [WordPhase::Meaning, WordPhase::Spelling, WordPhase::Dictation];

    pub fn index(self) -> usize {
        match self {
            WordPhase::Meaning => 0,
            WordPhase::Spelling => 1,
            WordPhase::Dictation => 2,
        }
    }

    pub fn next(self) -> Option<WordPhase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            WordPhase::Meaning => "What does it mean?",
            WordPhase::Spelling => "Find the English word",
            WordPhase::Dictation => "Listen and write",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordState {
    Phase { phase: WordPhase, index: usize },
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NextItem { phase: WordPhase, index: usize },
    NextPhase { phase: WordPhase },
    Finished,
}

/// Progress through a word lesson.
///
/// Completion is all-or-nothing: `completed` stays empty until the last
/// item of the dictation phase, then becomes the full id set at once.
#[derive(Clone, Debug)]
pub struct WordProgress {
    item_ids: Vec<u32>,
    state: WordState,
    completed: BTreeSet<u32>,
}

impl WordProgress {
    pub fn new(lesson: &Lesson) -> Self {
        let item_ids: Vec<u32> = lesson.items.iter().map(|item| item.id).collect();
        let state = if item_ids.is_empty() {
            WordState::Finished
        } else {
            WordState::Phase {
                phase: WordPhase::Meaning,
                index: 0,
            }
        };
        Self {
            item_ids,
            state,
            completed: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> WordState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == WordState::Finished
    }

    pub fn completed(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    pub fn total(&self) -> usize {
        self.item_ids.len()
    }

    /// Identity of the exercise that should be on screen. A change in this
    /// value means the previous exercise must be thrown away.
    pub fn exercise_key(&self) -> Option<(WordPhase, usize)> {
        match self.state {
            WordState::Phase { phase, index } => Some((phase, index)),
            WordState::Finished => None,
        }
    }

    /// Fraction of the current phase already reached, counting the current item.
    pub fn ratio(&self) -> f64 {
        match self.state {
            WordState::Phase { index, .. } => (index + 1) as f64 / self.item_ids.len() as f64,
            WordState::Finished => 1.0,
        }
    }

    pub fn advance(&mut self) -> Result<AdvanceOutcome, TransitionError> {
        let WordState::Phase { phase, index } = self.state else {
            return Err(TransitionError::Finished);
        };
        let last = self.item_ids.len() - 1;

        if index < last {
            let index = index + 1;
            self.state = WordState::Phase { phase, index };
            return Ok(AdvanceOutcome::NextItem { phase, index });
        }

        match phase.next() {
            Some(phase) => {
                self.state = WordState::Phase { phase, index: 0 };
                Ok(AdvanceOutcome::NextPhase { phase })
            }
            None => {
                self.completed = self.item_ids.iter().copied().collect();
                self.state = WordState::Finished;
                Ok(AdvanceOutcome::Finished)
            }
        }
    }
}
