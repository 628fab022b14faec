use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_embed::Embed;
use thiserror::Error;

use crate::content::Lesson;

#[derive(Embed)]
#[folder = "assets/lessons/"]
struct LessonAssets;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lesson file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("lesson id `{0}` appears more than once")]
    DuplicateLesson(String),
    #[error("lesson `{lesson}` has duplicate item id {id}")]
    DuplicateItem { lesson: String, id: u32 },
    #[error("lesson `{0}` has no items")]
    EmptyLesson(String),
    #[error(
        "lesson `{lesson}` item {id}: English text must be single-spaced with no leading or trailing whitespace"
    )]
    BadSpacing { lesson: String, id: u32 },
}

/// The ordered, immutable set of lessons available for the session.
#[derive(Clone, Debug)]
pub struct Catalog {
    lessons: Vec<Lesson>,
}

impl Catalog {
    pub fn new(lessons: Vec<Lesson>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for lesson in &lessons {
            if !seen.insert(lesson.id.as_str()) {
                return Err(CatalogError::DuplicateLesson(lesson.id.clone()));
            }
            validate_lesson(lesson)?;
        }
        Ok(Self { lessons })
    }

    /// Lessons bundled into the binary, in file-name order.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(builtin_lessons()?)
    }

    /// Built-in lessons plus any `*.toml` lessons found in `user_dir`.
    ///
    /// A user lesson whose id matches a built-in one replaces it in place;
    /// other user lessons are appended. Broken user files are skipped with a
    /// warning so one bad file cannot lock the learner out of the rest.
    pub fn load(user_dir: Option<&Path>) -> Result<Self, CatalogError> {
        let mut lessons = builtin_lessons()?;
        if let Some(dir) = user_dir {
            for lesson in read_dir_lessons(dir)? {
                merge_lesson(&mut lessons, lesson);
            }
        }
        Self::new(lessons)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn get(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

fn validate_lesson(lesson: &Lesson) -> Result<(), CatalogError> {
    if lesson.items.is_empty() {
        return Err(CatalogError::EmptyLesson(lesson.id.clone()));
    }
    let mut ids = HashSet::new();
    for item in &lesson.items {
        if !ids.insert(item.id) {
            return Err(CatalogError::DuplicateItem {
                lesson: lesson.id.clone(),
                id: item.id,
            });
        }
        let text = item.english.as_str();
        if text.is_empty() || text.trim() != text || text.contains("  ") {
            return Err(CatalogError::BadSpacing {
                lesson: lesson.id.clone(),
                id: item.id,
            });
        }
    }
    Ok(())
}

fn parse_lesson(file: &str, content: &str) -> Result<Lesson, CatalogError> {
    toml::from_str(content).map_err(|source| CatalogError::Parse {
        file: file.to_string(),
        source,
    })
}

fn builtin_lessons() -> Result<Vec<Lesson>, CatalogError> {
    let mut names: Vec<String> = LessonAssets::iter()
        .filter(|name| name.ends_with(".toml"))
        .map(|name| name.to_string())
        .collect();
    names.sort();

    let mut lessons = Vec::with_capacity(names.len());
    for name in names {
        let Some(file) = LessonAssets::get(&name) else {
            continue;
        };
        let content = String::from_utf8_lossy(file.data.as_ref());
        lessons.push(parse_lesson(&name, &content)?);
    }
    Ok(lessons)
}

fn read_dir_lessons(dir: &Path) -> Result<Vec<Lesson>, CatalogError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut lessons = Vec::new();
    for path in paths {
        let name = path.display().to_string();
        let parsed = fs::read_to_string(&path)
            .map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })
            .and_then(|content| parse_lesson(&name, &content))
            .and_then(|lesson| validate_lesson(&lesson).map(|_| lesson));
        match parsed {
            Ok(lesson) => {
                log::info!("loaded user lesson `{}` from {name}", lesson.id);
                lessons.push(lesson);
            }
            Err(e) => log::warn!("skipping user lesson: {e}"),
        }
    }
    Ok(lessons)
}

fn merge_lesson(lessons: &mut Vec<Lesson>, lesson: Lesson) {
    match lessons.iter_mut().find(|l| l.id == lesson.id) {
        Some(existing) => *existing = lesson,
        None => lessons.push(lesson),
    }
}
