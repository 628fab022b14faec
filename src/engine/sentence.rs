use std::collections::BTreeSet;

use crate::content::Lesson;
use crate::engine::TransitionError;

/// The four sub-activities every sentence goes through, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SentenceStep {
    Presentation,
    Reorder,
    FillBlank,
    FreeRecall,
}

impl SentenceStep {
    pub const ALL: [SentenceStep; 4] = [
        SentenceStep::Presentation,
        SentenceStep::Reorder,
        SentenceStep::FillBlank,
        SentenceStep::FreeRecall,
    ];

    pub fn index(self) -> usize {
        match self {
            SentenceStep::Presentation => 0,
            SentenceStep::Reorder => 1,
            SentenceStep::FillBlank => 2,
            SentenceStep::FreeRecall => 3,
        }
    }

    pub fn next(self) -> Option<SentenceStep> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            SentenceStep::Presentation => "Read",
            SentenceStep::Reorder => "Order",
            SentenceStep::FillBlank => "Blanks",
            SentenceStep::FreeRecall => "Write",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentencePhase {
    Browsing,
    InStep { item_id: u32, step: SentenceStep },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced(SentenceStep),
    ItemCompleted { item_id: u32, lesson_complete: bool },
}

/// Progress through a sentence lesson. Lives only while the lesson is open.
#[derive(Clone, Debug)]
pub struct SentenceProgress {
    item_ids: BTreeSet<u32>,
    active_item: Option<u32>,
    step: SentenceStep,
    completed: BTreeSet<u32>,
}

impl SentenceProgress {
    pub fn new(lesson: &Lesson) -> Self {
        Self {
            item_ids: lesson.item_ids(),
            active_item: None,
            step: SentenceStep::Presentation,
            completed: BTreeSet::new(),
        }
    }

    pub fn phase(&self) -> SentencePhase {
        match self.active_item {
            Some(item_id) => SentencePhase::InStep {
                item_id,
                step: self.step,
            },
            None => SentencePhase::Browsing,
        }
    }

    pub fn active_item(&self) -> Option<u32> {
        self.active_item
    }

    pub fn current_step(&self) -> SentenceStep {
        self.step
    }

    pub fn completed(&self) -> &BTreeSet<u32> {
        &self.completed
    }

    pub fn is_completed(&self, id: u32) -> bool {
        self.completed.contains(&id)
    }

    pub fn total(&self) -> usize {
        self.item_ids.len()
    }

    /// Derived, never stored: every item of the lesson has been completed.
    pub fn is_lesson_complete(&self) -> bool {
        self.completed.len() == self.item_ids.len()
    }

    pub fn ratio(&self) -> f64 {
        if self.item_ids.is_empty() {
            return 0.0;
        }
        self.completed.len() as f64 / self.item_ids.len() as f64
    }

    pub fn select_item(&mut self, id: u32) -> Result<(), TransitionError> {
        if let Some(active) = self.active_item {
            return Err(TransitionError::ItemAlreadyActive(active));
        }
        if !self.item_ids.contains(&id) {
            return Err(TransitionError::UnknownItem(id));
        }
        self.active_item = Some(id);
        self.step = SentenceStep::Presentation;
        Ok(())
    }

    pub fn advance_step(&mut self) -> Result<StepOutcome, TransitionError> {
        let item_id = self.active_item.ok_or(TransitionError::NoActiveItem)?;
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Ok(StepOutcome::Advanced(next))
            }
            None => {
                // Set insertion keeps a repeated completion from duplicating the id.
                self.completed.insert(item_id);
                self.active_item = None;
                self.step = SentenceStep::Presentation;
                Ok(StepOutcome::ItemCompleted {
                    item_id,
                    lesson_complete: self.is_lesson_complete(),
                })
            }
        }
    }

    /// Back to the sentence list without completing the active sentence.
    pub fn leave_item(&mut self) -> Result<(), TransitionError> {
        if self.active_item.take().is_none() {
            return Err(TransitionError::NoActiveItem);
        }
        self.step = SentenceStep::Presentation;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{LessonKind, StudyItem};

    fn lesson(n: u32) -> Lesson {
        Lesson {
            id: "s".to_string(),
            date: String::new(),
            title: String::new(),
            kind: LessonKind::Sentences,
            items: (1..=n)
                .map(|id| StudyItem {
                    id,
                    english: format!("Sentence {id}."),
                    korean: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn starts_browsing_with_nothing_completed() {
        let progress = SentenceProgress::new(&lesson(3));
        assert_eq!(progress.phase(), SentencePhase::Browsing);
        assert_eq!(progress.current_step(), SentenceStep::Presentation);
        assert!(progress.completed().is_empty());
        assert!(!progress.is_lesson_complete());
    }

    #[test]
    fn four_advances_complete_the_item() {
        let mut progress = SentenceProgress::new(&lesson(3));
        progress.select_item(2).unwrap();
        assert_eq!(
            progress.advance_step().unwrap(),
            StepOutcome::Advanced(SentenceStep::Reorder)
        );
        assert_eq!(
            progress.advance_step().unwrap(),
            StepOutcome::Advanced(SentenceStep::FillBlank)
        );
        assert_eq!(
            progress.advance_step().unwrap(),
            StepOutcome::Advanced(SentenceStep::FreeRecall)
        );
        assert_eq!(
            progress.advance_step().unwrap(),
            StepOutcome::ItemCompleted {
                item_id: 2,
                lesson_complete: false
            }
        );
        assert_eq!(progress.phase(), SentencePhase::Browsing);
        assert!(progress.is_completed(2));
    }

    #[test]
    fn repeat_completion_does_not_duplicate() {
        let mut progress = SentenceProgress::new(&lesson(2));
        for _ in 0..2 {
            progress.select_item(1).unwrap();
            for _ in 0..4 {
                progress.advance_step().unwrap();
            }
        }
        assert_eq!(progress.completed().len(), 1);
    }

    #[test]
    fn lesson_completes_when_every_item_is_done() {
        let mut progress = SentenceProgress::new(&lesson(2));
        let mut last = None;
        for id in [1, 2] {
            progress.select_item(id).unwrap();
            for _ in 0..4 {
                last = Some(progress.advance_step().unwrap());
            }
        }
        assert_eq!(
            last,
            Some(StepOutcome::ItemCompleted {
                item_id: 2,
                lesson_complete: true
            })
        );
        assert!(progress.is_lesson_complete());
        assert_eq!(progress.ratio(), 1.0);
    }

    #[test]
    fn step_resets_when_a_new_item_is_selected() {
        let mut progress = SentenceProgress::new(&lesson(2));
        progress.select_item(1).unwrap();
        progress.advance_step().unwrap();
        progress.advance_step().unwrap();
        progress.leave_item().unwrap();
        progress.select_item(2).unwrap();
        assert_eq!(
            progress.phase(),
            SentencePhase::InStep {
                item_id: 2,
                step: SentenceStep::Presentation
            }
        );
        assert!(progress.completed().is_empty());
    }

    #[test]
    fn invalid_transitions_leave_state_untouched() {
        let mut progress = SentenceProgress::new(&lesson(2));
        assert_eq!(progress.advance_step(), Err(TransitionError::NoActiveItem));
        assert_eq!(progress.leave_item(), Err(TransitionError::NoActiveItem));
        assert_eq!(progress.select_item(9), Err(TransitionError::UnknownItem(9)));
        assert_eq!(progress.phase(), SentencePhase::Browsing);

        progress.select_item(1).unwrap();
        progress.advance_step().unwrap();
        assert_eq!(
            progress.select_item(2),
            Err(TransitionError::ItemAlreadyActive(1))
        );
        assert_eq!(
            progress.phase(),
            SentencePhase::InStep {
                item_id: 1,
                step: SentenceStep::Reorder
            }
        );
    }
}
