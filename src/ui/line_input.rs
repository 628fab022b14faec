use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// What Tab does inside the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// Tab/BackTab leave the field (`NextField`/`PrevField`).
    None,
    /// Tab completes directories and image files.
    ImagePaths,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputResult {
    Continue,
    Submit,
    Cancel,
    NextField,
    PrevField,
}

#[derive(Clone, Debug)]
pub struct LineInput {
    text: String,
    /// Char index; 0 is before the first char.
    cursor: usize,
    completion: Completion,
    candidates: Vec<String>,
    candidate_index: Option<usize>,
    /// Set when the directory being completed could not be read.
    pub completion_error: bool,
}

impl LineInput {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
            completion: Completion::None,
            candidates: Vec::new(),
            candidate_index: None,
            completion_error: false,
        }
    }

    pub fn with_image_paths(text: &str) -> Self {
        Self {
            completion: Completion::ImagePaths,
            ..Self::new(text)
        }
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.reset_completion();
    }

    /// `(before, cursor_char, after)` for drawing a block cursor.
    pub fn render_parts(&self) -> (&str, Option<char>, &str) {
        let at = self.byte_at(self.cursor);
        match self.text[at..].chars().next() {
            Some(ch) => (&self.text[..at], Some(ch), &self.text[at + ch.len_utf8()..]),
            None => (&self.text, None, ""),
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> InputResult {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return InputResult::Cancel,
            KeyCode::Enter => return InputResult::Submit,
            KeyCode::Tab if self.completion == Completion::None => return InputResult::NextField,
            KeyCode::BackTab if self.completion == Completion::None => {
                return InputResult::PrevField;
            }
            KeyCode::Tab => self.complete(true),
            KeyCode::BackTab => self.complete(false),
            KeyCode::Left => {
                self.reset_completion();
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                self.reset_completion();
                self.cursor = (self.cursor + 1).min(self.len());
            }
            KeyCode::Home => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::End => {
                self.reset_completion();
                self.cursor = self.len();
            }
            KeyCode::Backspace => {
                self.reset_completion();
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.remove_at(self.cursor);
                }
            }
            KeyCode::Delete => {
                self.reset_completion();
                self.remove_at(self.cursor);
            }
            KeyCode::Char('a') if ctrl => {
                self.reset_completion();
                self.cursor = 0;
            }
            KeyCode::Char('e') if ctrl => {
                self.reset_completion();
                self.cursor = self.len();
            }
            KeyCode::Char('u') if ctrl => self.clear(),
            KeyCode::Char('w') if ctrl => {
                self.reset_completion();
                self.delete_word_back();
            }
            KeyCode::Char(ch) if !ctrl => {
                self.reset_completion();
                let at = self.byte_at(self.cursor);
                self.text.insert(at, ch);
                self.cursor += 1;
            }
            _ => {}
        }
        InputResult::Continue
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    fn remove_at(&mut self, char_idx: usize) {
        let at = self.byte_at(char_idx);
        if let Some(ch) = self.text[at..].chars().next() {
            self.text.replace_range(at..at + ch.len_utf8(), "");
        }
    }

    /// Unix word rubout: skip whitespace, then the word before it.
    fn delete_word_back(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && !chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        let (start, end) = (self.byte_at(pos), self.byte_at(self.cursor));
        self.text.replace_range(start..end, "");
        self.cursor = pos;
    }

    fn reset_completion(&mut self) {
        self.candidates.clear();
        self.candidate_index = None;
        self.completion_error = false;
    }

    fn complete(&mut self, forward: bool) {
        if self.cursor < self.len() {
            return;
        }
        let next = match self.candidate_index {
            None => {
                self.candidates = self.scan();
                if self.candidates.is_empty() {
                    return;
                }
                0
            }
            Some(idx) => {
                let count = self.candidates.len();
                if forward {
                    (idx + 1) % count
                } else {
                    (idx + count - 1) % count
                }
            }
        };
        self.candidate_index = Some(next);
        self.text = self.candidates[next].clone();
        self.cursor = self.len();
    }

    fn scan(&mut self) -> Vec<String> {
        let seed = self.text.clone();
        let split = seed.rfind(['/', '\\']).map(|pos| pos + 1).unwrap_or(0);
        let (dir, partial) = seed.split_at(split);

        let read_dir = match dir.strip_prefix('~') {
            Some(rest) => dirs::home_dir()
                .map(|home| format!("{}{rest}", home.display()))
                .unwrap_or_else(|| dir.to_string()),
            None if dir.is_empty() => ".".to_string(),
            None => dir.to_string(),
        };

        let entries = match std::fs::read_dir(&read_dir) {
            Ok(entries) => entries.map(|entry| {
                entry.map(|e| {
                    let is_dir = e.file_type().map(|t| t.is_dir()).unwrap_or(false);
                    (e.file_name().to_string_lossy().to_string(), is_dir)
                })
            }),
            Err(_) => {
                self.completion_error = true;
                return Vec::new();
            }
        };
        self.collect_candidates(entries, dir, partial)
    }

    /// Directories first, then image files; both alphabetical. Hidden
    /// entries only when the partial name starts with a dot.
    fn collect_candidates(
        &mut self,
        entries: impl Iterator<Item = std::io::Result<(String, bool)>>,
        dir: &str,
        partial: &str,
    ) -> Vec<String> {
        let sep = std::path::MAIN_SEPARATOR;
        let show_hidden = partial.starts_with('.');
        let mut found: Vec<(bool, String)> = Vec::new();

        for entry in entries.take(1000) {
            let Ok((name, is_dir)) = entry else {
                self.completion_error = true;
                return Vec::new();
            };
            if (!show_hidden && name.starts_with('.')) || !name.starts_with(partial) {
                continue;
            }
            if is_dir {
                found.push((true, format!("{dir}{name}{sep}")));
            } else if is_image(&name) {
                found.push((false, format!("{dir}{name}")));
            }
        }

        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        found.truncate(100);
        found.into_iter().map(|(_, path)| path).collect()
    }
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
