use std::fs;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::ai::GeneratedImage;
use crate::ai::audio::Pcm;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "webp"];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Generated pictures and speech kept on disk, keyed by sentence text.
pub struct MediaCache {
    base_dir: PathBuf,
}

impl MediaCache {
    pub fn new() -> Option<Self> {
        let base = dirs::data_dir()?.join("wordkite").join("media");
        Self::with_base_dir(base).ok()
    }

    pub fn with_base_dir(base_dir: PathBuf) -> std::io::Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn cached_image(&self, sentence: &str) -> Option<PathBuf> {
        let key = Self::key(sentence);
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| self.base_dir.join(format!("{key}.{ext}")))
            .find(|path| path.is_file())
    }

    pub fn cached_audio(&self, sentence: &str) -> Option<PathBuf> {
        let path = self.audio_path(sentence);
        path.is_file().then_some(path)
    }

    /// Decode a `data:` URI and write it out. Plain URLs are not fetched.
    pub fn store_image(&self, sentence: &str, image: &GeneratedImage) -> Option<PathBuf> {
        let rest = image.uri.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        let ext = match mime {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        };
        let bytes = STANDARD.decode(payload).ok()?;
        let path = self
            .base_dir
            .join(format!("{}.{ext}", Self::key(sentence)));
        fs::write(&path, bytes).ok()?;
        Some(path)
    }

    pub fn store_audio(&self, sentence: &str, pcm: &Pcm) -> Option<PathBuf> {
        let path = self.audio_path(sentence);
        fs::write(&path, pcm.to_wav()).ok()?;
        Some(path)
    }

    fn audio_path(&self, sentence: &str) -> PathBuf {
        self.base_dir.join(format!("{}.wav", Self::key(sentence)))
    }

    /// Readable slug plus a hash, so "Hi." and "Hi!" do not collide.
    fn key(sentence: &str) -> String {
        let slug: String = sentence
            .chars()
            .filter_map(|c| {
                if c.is_ascii_alphanumeric() {
                    Some(c.to_ascii_lowercase())
                } else if c.is_whitespace() || c == '-' || c == '_' {
                    Some('_')
                } else {
                    None
                }
            })
            .take(60)
            .collect();
        format!("{slug}-{:016x}", fnv1a(sentence.as_bytes()))
    }
}

/// 64-bit FNV-1a; stable across toolchains, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
