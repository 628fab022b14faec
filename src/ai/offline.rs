use crate::ai::{AiCapability, GeneratedImage};
use crate::validate::Verdict;

pub const OFFLINE_FEEDBACK: &str =
    "The AI helper is offline, so handwriting can't be checked. Try typing instead!";

/// Stand-in used when no provider is reachable. Lessons still work; pictures
/// and sound are simply absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineCapability;

impl AiCapability for OfflineCapability {
    fn generate_image(&self, _sentence: &str) -> Option<GeneratedImage> {
        None
    }

    fn generate_audio(&self, _sentence: &str) -> Option<String> {
        None
    }

    fn judge_handwriting(&self, _image_base64: &str, _target_sentence: &str) -> Verdict {
        Verdict::fail(OFFLINE_FEEDBACK)
    }

    fn is_online(&self) -> bool {
        false
    }
}
