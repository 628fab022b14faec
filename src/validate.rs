//! Answer checks for the sentence and word exercises.
//!
//! Each rule is a pure function of learner input and the target text.
//! None of them touch progression state; a failed check only produces
//! feedback for the learner.

use serde::{Deserialize, Serialize};

/// Pass/fail plus a message for the learner. Shared by the local string
/// checks and the remote handwriting judge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub correct: bool,
    #[serde(default)]
    pub feedback: String,
}

impl Verdict {
    pub fn pass(feedback: impl Into<String>) -> Self {
        Self {
            correct: true,
            feedback: feedback.into(),
        }
    }

    pub fn fail(feedback: impl Into<String>) -> Self {
        Self {
            correct: false,
            feedback: feedback.into(),
        }
    }
}

/// Outcome of the free-recall comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecallVerdict {
    Pass,
    /// Everything matched except the closing period. Not a pass.
    MissingPeriod,
    Mismatch,
}

/// Collapse whitespace runs to one space, trim, and lowercase.
pub fn normalize_sentence(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn check_recall(input: &str, target: &str) -> RecallVerdict {
    let input = normalize_sentence(input);
    let target = normalize_sentence(target);
    if input == target {
        RecallVerdict::Pass
    } else if !input.is_empty() && target.strip_suffix('.') == Some(input.as_str()) {
        RecallVerdict::MissingPeriod
    } else {
        RecallVerdict::Mismatch
    }
}

/// A token with surrounding whitespace and trailing commas/periods removed.
pub fn strip_token(token: &str) -> &str {
    token.trim().trim_end_matches([',', '.'])
}

pub fn blank_matches(input: &str, token: &str) -> bool {
    strip_token(input).to_lowercase() == strip_token(token).to_lowercase()
}

/// Blank positions whose entry does not match the target token.
///
/// `inputs` is indexed like `blanks`; a missing entry counts as empty.
pub fn wrong_blanks(tokens: &[&str], blanks: &[usize], inputs: &[String]) -> Vec<usize> {
    blanks
        .iter()
        .enumerate()
        .filter(|&(slot, &position)| {
            let input = inputs.get(slot).map(String::as_str).unwrap_or("");
            let token = tokens.get(position).copied().unwrap_or("");
            !blank_matches(input, token)
        })
        .map(|(_, &position)| position)
        .collect()
}

/// Word order check. Deliberately strict: case and punctuation must match.
pub fn sequence_matches<S: AsRef<str>>(assembled: &[S], target: &str) -> bool {
    let joined: Vec<&str> = assembled.iter().map(AsRef::as_ref).collect();
    joined.join(" ") == target
}
