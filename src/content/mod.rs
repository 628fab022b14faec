pub mod catalog;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use catalog::{Catalog, CatalogError};

/// One sentence or vocabulary word with its Korean gloss.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyItem {
    pub id: u32,
    pub english: String,
    pub korean: String,
}

impl StudyItem {
    /// The English text split on single spaces, punctuation kept attached.
    pub fn tokens(&self) -> Vec<&str> {
        self.english.split(' ').collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonKind {
    Sentences,
    Words,
}

impl LessonKind {
    pub fn noun(self) -> &'static str {
        match self {
            LessonKind::Sentences => "sentences",
            LessonKind::Words => "words",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub date: String,
    pub title: String,
    pub kind: LessonKind,
    #[serde(default)]
    pub items: Vec<StudyItem>,
}

impl Lesson {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: u32) -> Option<&StudyItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn item_ids(&self) -> BTreeSet<u32> {
        self.items.iter().map(|item| item.id).collect()
    }
}
