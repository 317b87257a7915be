use std::path::Path;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::Error,
    gen::{check_status, fetch_to_file, ImageParams, ImageSynthesizer, ScriptPlanner, VoiceSynthesizer},
    script::{parse_script, Script},
};

/// Client for the OpenAI-compatible endpoints the pipeline consumes: chat
/// completions (script planning), speech synthesis, and image generation.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    const SYSTEM_PROMPT: &str = include_str!("./prompts/system_script.txt");

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, Error> {
        let body = serde_json::json!({
            "model": model_name.into(),
            "response_format": { "type": "json_object" },
            "messages": [
                {
                    "role": "system",
                    "content": Self::SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        Ok(check_status(resp).await?.json::<CompletionResponse>().await?)
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

impl ScriptPlanner for OpenAIClient {
    const PLANNER_MODEL: &str = "gpt-4-1106-preview";

    type Error = Error;

    async fn plan(&self, topic: &str) -> Result<Script, Error> {
        let response = self
            .send_completion_request(Self::PLANNER_MODEL, topic)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to plan script"))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| Error::Upstream("no content in completion response".into()))?;

        parse_script(&content)
    }
}

impl VoiceSynthesizer for OpenAIClient {
    const VOICE_MODEL: &str = "tts-1-hd";

    type Error = Error;

    async fn synthesize_voice(&self, narration: &str, dest: &Path) -> Result<(), Error> {
        let body = serde_json::json!({
            "model": Self::VOICE_MODEL,
            "voice": "onyx",
            "input": narration,
        });

        let resp = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let bytes = check_status(resp).await?.bytes().await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        tracing::info!(dest = %dest.display(), "voiceover saved");
        Ok(())
    }
}

impl ImageSynthesizer for OpenAIClient {
    const IMAGE_MODEL: &str = "dall-e-3";

    type Error = Error;

    async fn synthesize_image(
        &self,
        prompt: &str,
        params: &ImageParams,
        dest: &Path,
    ) -> Result<(), Error> {
        let body = serde_json::json!({
            "model": Self::IMAGE_MODEL,
            "prompt": prompt,
            "n": 1,
            "size": params.size,
            "quality": params.quality,
            "response_format": "b64_json",
        });

        let resp = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let response = check_status(resp).await?.json::<ImagesResponse>().await?;
        let datum = response
            .data
            .first()
            .ok_or_else(|| Error::Upstream("image response contains no data".into()))?;

        // The service answers with the image inline or with a URL to fetch;
        // either way the file is fully on disk before returning.
        if let Some(b64) = &datum.b64_json {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| Error::Transport {
                    status: 0,
                    message: format!("invalid base64 image payload: {e}"),
                })?;
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, &bytes).await?;
        } else if let Some(url) = &datum.url {
            fetch_to_file(&self.client, url, dest).await?;
        } else {
            return Err(Error::Upstream(
                "image response has neither b64_json nor url".into(),
            ));
        }

        tracing::debug!(dest = %dest.display(), "image saved");
        Ok(())
    }
}
