//! Generated illustrations, speech and handwriting judgment.
//!
//! The rest of the crate only sees [`AiCapability`]; requests run on
//! background threads through [`worker::AiWorker`] and never gate progress.

pub mod audio;
pub mod cache;
pub mod gemini;
pub mod offline;
pub mod worker;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::validate::Verdict;

pub use offline::OfflineCapability;
pub use worker::{AiOutcome, AiRequest, AiResponse, AiWorker, Ticket, Timeouts};

/// Illustration as a `data:` URI (or a plain URL if a provider returns one).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub uri: String,
}

pub trait AiCapability: Send + Sync {
    fn generate_image(&self, sentence: &str) -> Option<GeneratedImage>;

    /// Base64-encoded 16-bit, 24 kHz, mono PCM.
    fn generate_audio(&self, sentence: &str) -> Option<String>;

    /// `image_base64` is a `data:image/...;base64,` URI, or bare base64
    /// taken to be PNG. Always returns a verdict; internal failures become
    /// `correct: false` with an explanatory message.
    fn judge_handwriting(&self, image_base64: &str, target_sentence: &str) -> Verdict;

    fn is_online(&self) -> bool {
        true
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("network support is not compiled in")]
    Offline,
    #[cfg(feature = "network")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Pick the capability for this session: Gemini when a key is available
/// and the network feature is built, otherwise the offline stand-in.
pub fn connect(config: &Config, offline: bool) -> Arc<dyn AiCapability> {
    if offline {
        log::info!("AI helper disabled by --offline");
        return Arc::new(OfflineCapability);
    }
    match gemini::GeminiClient::from_config(config) {
        Ok(client) => {
            log::info!("AI helper online ({})", config.api_base_url);
            Arc::new(client)
        }
        Err(e) => {
            log::warn!("AI helper offline: {e}");
            Arc::new(OfflineCapability)
        }
    }
}
