use rand::Rng;
use rand::seq::SliceRandom;

use crate::content::StudyItem;
use crate::exercise::Feedback;

pub const MAX_DISTRACTORS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizDirection {
    /// Show the English word, pick its Korean meaning.
    EnglishToKorean,
    /// Show the Korean meaning, pick the English word.
    KoreanToEnglish,
}

impl QuizDirection {
    pub fn question(self) -> &'static str {
        match self {
            QuizDirection::EnglishToKorean => "이 단어의 뜻은 무엇일까요?",
            QuizDirection::KoreanToEnglish => "이 뜻을 가진 영어 단어는?",
        }
    }
}

/// Multiple choice over one lesson's words.
pub struct Quiz {
    pub item: StudyItem,
    pub direction: QuizDirection,
    options: Vec<StudyItem>,
    pub cursor: usize,
    wrong: Vec<u32>,
    feedback: Option<Feedback>,
    solved: bool,
}

impl Quiz {
    pub fn new<R: Rng + ?Sized>(
        item: &StudyItem,
        all_items: &[StudyItem],
        direction: QuizDirection,
        rng: &mut R,
    ) -> Self {
        let mut options: Vec<StudyItem> = all_items
            .choose_multiple(rng, all_items.len())
            .filter(|other| other.id != item.id)
            .take(MAX_DISTRACTORS)
            .cloned()
            .collect();
        options.push(item.clone());
        options.shuffle(rng);
        Self {
            item: item.clone(),
            direction,
            options,
            cursor: 0,
            wrong: Vec::new(),
            feedback: None,
            solved: false,
        }
    }

    pub fn prompt(&self) -> &str {
        match self.direction {
            QuizDirection::EnglishToKorean => &self.item.english,
            QuizDirection::KoreanToEnglish => &self.item.korean,
        }
    }

    pub fn options(&self) -> &[StudyItem] {
        &self.options
    }

    pub fn option_label(&self, option: &StudyItem) -> String {
        match self.direction {
            QuizDirection::EnglishToKorean => option.korean.clone(),
            QuizDirection::KoreanToEnglish => option.english.clone(),
        }
    }

    pub fn is_wrong(&self, option: &StudyItem) -> bool {
        self.wrong.contains(&option.id)
    }

    pub fn is_answer(&self, option: &StudyItem) -> bool {
        option.id == self.item.id
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.options.len() as isize;
        if len > 0 {
            self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
        }
    }

    pub fn pick_current(&mut self) -> bool {
        self.pick(self.cursor)
    }

    /// Choose option `index`. Returns true when this pick solved the quiz.
    pub fn pick(&mut self, index: usize) -> bool {
        if self.solved {
            return false;
        }
        let Some(option) = self.options.get(index) else {
            return false;
        };
        self.cursor = index;
        if option.id == self.item.id {
            self.solved = true;
            self.feedback = Some(Feedback::success("Correct!"));
            true
        } else {
            if !self.wrong.contains(&option.id) {
                self.wrong.push(option.id);
            }
            self.feedback = Some(Feedback::error("Oops! Try another one."));
            false
        }
    }
}
