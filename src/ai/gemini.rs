use serde::{Deserialize, Serialize};

use crate::ai::{AiCapability, AiError, GeneratedImage};
use crate::config::Config;
use crate::validate::Verdict;

const JUDGE_ERROR_FEEDBACK: &str = "Something went wrong. Please try again. (오류가 발생했어요. 다시 시도해주세요.)";

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
}

impl GenerateContentResponse {
    fn parts(&self) -> &[Part] {
        self.candidates
            .first()
            .map(|c| c.content.parts.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.parts().iter().find_map(|p| p.inline_data.as_ref())
    }

    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

pub fn image_prompt(sentence: &str) -> String {
    format!(
        "Create a cute, colorful, children's book style illustration for the sentence: \"{sentence}\". High quality, bright colors, simple background."
    )
}

pub fn judge_prompt(target: &str) -> String {
    format!(
        "A child is learning English. They wrote this by hand. The target sentence is: \"{target}\".\n\
         1. Recognize the handwriting.\n\
         2. Determine if it closely matches the target sentence (ignore minor capitalization or small spacing errors, be encouraging).\n\
         3. Return JSON: {{ \"correct\": boolean, \"feedback\": \"string (in Korean, friendly feedback for a child)\" }}"
    )
}

pub fn build_image_request(sentence: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::text(image_prompt(sentence))],
        }],
        generation_config: None,
    }
}

pub fn build_speech_request(sentence: &str, voice: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part::text(sentence)],
        }],
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice.to_string(),
                    },
                },
            }),
            ..Default::default()
        }),
    }
}

pub fn build_judge_request(image_base64: &str, target: &str) -> GenerateContentRequest {
    let (mime, payload) = split_data_uri(image_base64);
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: mime.to_string(),
                        data: payload.to_string(),
                    }),
                },
                Part::text(judge_prompt(target)),
            ],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            ..Default::default()
        }),
    }
}

/// Split a `data:image/...;base64,` URI into its MIME type and payload.
/// Bare base64 is taken to be PNG.
pub fn split_data_uri(data: &str) -> (&str, &str) {
    data.strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .filter(|(mime, _)| !mime.is_empty())
        .unwrap_or(("image/png", data))
}

/// Parse the judge's JSON answer, tolerating a fenced code block around it.
pub fn parse_verdict(text: &str) -> Result<Verdict, AiError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    Ok(serde_json::from_str(body.trim())?)
}

#[cfg(feature = "network")]
struct Transport {
    http: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl Transport {
    fn new() -> Result<Self, AiError> {
        // Callers enforce their own, shorter deadlines; this only bounds stuck sockets.
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self { http })
    }

    fn post(
        &self,
        url: &str,
        api_key: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Status(status.as_u16()));
        }
        Ok(response.json()?)
    }
}

#[cfg(not(feature = "network"))]
struct Transport;

#[cfg(not(feature = "network"))]
impl Transport {
    fn new() -> Result<Self, AiError> {
        Err(AiError::Offline)
    }

    fn post(
        &self,
        _url: &str,
        _api_key: &str,
        _body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        Err(AiError::Offline)
    }
}

pub struct GeminiClient {
    api_key: String,
    base_url: String,
    image_model: String,
    speech_model: String,
    judge_model: String,
    voice: String,
    transport: Transport,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Result<Self, AiError> {
        let api_key = config.resolved_api_key().ok_or(AiError::MissingApiKey)?;
        Ok(Self {
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            speech_model: config.speech_model.clone(),
            judge_model: config.judge_model.clone(),
            voice: config.voice.clone(),
            transport: Transport::new()?,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        self.transport
            .post(&self.endpoint(model), &self.api_key, request)
    }

    fn try_image(&self, sentence: &str) -> Result<GeneratedImage, AiError> {
        let response = self.generate(&self.image_model, &build_image_request(sentence))?;
        let inline = response
            .first_inline_data()
            .ok_or_else(|| AiError::Malformed("no image part in response".to_string()))?;
        let mime = if inline.mime_type.is_empty() {
            "image/png"
        } else {
            inline.mime_type.as_str()
        };
        Ok(GeneratedImage {
            uri: format!("data:{mime};base64,{}", inline.data),
        })
    }

    fn try_audio(&self, sentence: &str) -> Result<String, AiError> {
        let request = build_speech_request(sentence, &self.voice);
        let response = self.generate(&self.speech_model, &request)?;
        response
            .first_inline_data()
            .map(|inline| inline.data.clone())
            .ok_or_else(|| AiError::Malformed("no audio part in response".to_string()))
    }

    fn try_judge(&self, image_base64: &str, target: &str) -> Result<Verdict, AiError> {
        let request = build_judge_request(image_base64, target);
        let response = self.generate(&self.judge_model, &request)?;
        let text = response
            .text()
            .ok_or_else(|| AiError::Malformed("empty judgment".to_string()))?;
        parse_verdict(&text)
    }
}

impl AiCapability for GeminiClient {
    fn generate_image(&self, sentence: &str) -> Option<GeneratedImage> {
        self.try_image(sentence)
            .inspect_err(|e| log::error!("image generation failed: {e}"))
            .ok()
    }

    fn generate_audio(&self, sentence: &str) -> Option<String> {
        self.try_audio(sentence)
            .inspect_err(|e| log::error!("speech generation failed: {e}"))
            .ok()
    }

    fn judge_handwriting(&self, image_base64: &str, target_sentence: &str) -> Verdict {
        self.try_judge(image_base64, target_sentence)
            .unwrap_or_else(|e| {
                log::error!("handwriting check failed: {e}");
                Verdict::fail(JUDGE_ERROR_FEEDBACK)
            })
    }
}
