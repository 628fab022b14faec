use crate::content::{Lesson, LessonKind};
use crate::engine::{SentenceProgress, TransitionError, WordProgress};

#[derive(Clone, Debug)]
pub enum Progress {
    Sentences(SentenceProgress),
    Words(WordProgress),
}

#[derive(Clone, Debug)]
pub struct ActiveLesson {
    pub lesson: Lesson,
    pub progress: Progress,
}

/// Tracks which lesson is open. Progress is created fresh on every
/// selection and dropped on `go_home`; nothing survives between lessons.
#[derive(Debug, Default)]
pub struct LessonSelector {
    active: Option<ActiveLesson>,
}

impl LessonSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_lesson(&mut self, lesson: &Lesson) {
        let progress = match lesson.kind {
            LessonKind::Sentences => Progress::Sentences(SentenceProgress::new(lesson)),
            LessonKind::Words => Progress::Words(WordProgress::new(lesson)),
        };
        self.active = Some(ActiveLesson {
            lesson: lesson.clone(),
            progress,
        });
    }

    pub fn go_home(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&ActiveLesson> {
        self.active.as_ref()
    }

    pub fn lesson(&self) -> Option<&Lesson> {
        self.active.as_ref().map(|a| &a.lesson)
    }

    pub fn sentences(&self) -> Option<&SentenceProgress> {
        match self.active.as_ref().map(|a| &a.progress) {
            Some(Progress::Sentences(p)) => Some(p),
            _ => None,
        }
    }

    pub fn words(&self) -> Option<&WordProgress> {
        match self.active.as_ref().map(|a| &a.progress) {
            Some(Progress::Words(p)) => Some(p),
            _ => None,
        }
    }

    pub fn sentences_mut(&mut self) -> Result<&mut SentenceProgress, TransitionError> {
        match self.active.as_mut().map(|a| &mut a.progress) {
            Some(Progress::Sentences(p)) => Ok(p),
            Some(Progress::Words(_)) => Err(TransitionError::WrongKind("sentence")),
            None => Err(TransitionError::NoActiveLesson),
        }
    }

    pub fn words_mut(&mut self) -> Result<&mut WordProgress, TransitionError> {
        match self.active.as_mut().map(|a| &mut a.progress) {
            Some(Progress::Words(p)) => Ok(p),
            Some(Progress::Sentences(_)) => Err(TransitionError::WrongKind("word")),
            None => Err(TransitionError::NoActiveLesson),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Catalog;
    use crate::engine::{SentencePhase, WordPhase};

    #[test]
    fn selecting_a_lesson_starts_from_initial_progress() {
        let catalog = Catalog::builtin().unwrap();
        let mut selector = LessonSelector::new();
        for lesson in catalog.lessons() {
            selector.select_lesson(lesson);
            match &selector.active().unwrap().progress {
                Progress::Sentences(p) => {
                    assert_eq!(p.phase(), SentencePhase::Browsing);
                    assert!(p.completed().is_empty());
                }
                Progress::Words(p) => {
                    assert_eq!(p.exercise_key(), Some((WordPhase::Meaning, 0)));
                    assert!(p.completed().is_empty());
                }
            }
        }
    }

    #[test]
    fn reselecting_discards_previous_progress() {
        let catalog = Catalog::builtin().unwrap();
        let lesson = catalog.get("feb-10").unwrap();
        let mut selector = LessonSelector::new();
        selector.select_lesson(lesson);
        {
            let p = selector.sentences_mut().unwrap();
            p.select_item(1).unwrap();
            for _ in 0..4 {
                p.advance_step().unwrap();
            }
        }
        assert_eq!(selector.sentences().unwrap().completed().len(), 1);

        selector.go_home();
        assert!(selector.active().is_none());
        selector.select_lesson(lesson);
        assert!(selector.sentences().unwrap().completed().is_empty());
    }

    #[test]
    fn kind_accessors_reject_the_other_kind() {
        let catalog = Catalog::builtin().unwrap();
        let mut selector = LessonSelector::new();
        assert_eq!(
            selector.words_mut().err(),
            Some(TransitionError::NoActiveLesson)
        );
        selector.select_lesson(catalog.get("feb-12").unwrap());
        assert_eq!(
            selector.sentences_mut().err(),
            Some(TransitionError::WrongKind("sentence"))
        );
        assert!(selector.words_mut().is_ok());
    }
}
