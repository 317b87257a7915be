use std::path::Path;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Error,
    gen::{check_status, fetch_to_file, VideoParams, VideoSynthesizer},
    poll::{poll_until, PollPolicy},
};

/// Client for the Replicate prediction API, driving stable-video-diffusion
/// to animate one still image into a short clip.
///
/// A prediction either resolves with its output inline (the service held the
/// request until the job finished) or returns a job id to poll.
pub struct ReplicateClient {
    client: Client,
    api_token: String,
    base_url: String,
    poll: PollPolicy,
}

impl ReplicateClient {
    const VIDEO_MODEL_VERSION: &str =
        "3f0457e4619daac51203dedb472816fd4af51f3149fa7a9e0b5ffcf1b8172438";

    pub fn new(api_token: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.into(),
            base_url: "https://api.replicate.com/v1".into(),
            poll,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn submit_prediction(
        &self,
        image_path: &Path,
        params: &VideoParams,
    ) -> Result<Prediction, Error> {
        let image_bytes = tokio::fs::read(image_path).await?;
        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(image_bytes)
        );

        let body = serde_json::json!({
            "version": Self::VIDEO_MODEL_VERSION,
            "input": {
                "input_image": data_url,
                "video_length": params.clip_length,
            }
        });

        let resp = self
            .client
            .post(format!("{}/predictions", self.base_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        Ok(check_status(resp).await?.json::<Prediction>().await?)
    }

    async fn get_prediction(&self, id: &str) -> Result<Prediction, Error> {
        let resp = self
            .client
            .get(format!("{}/predictions/{id}", self.base_url))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        Ok(check_status(resp).await?.json::<Prediction>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: Option<String>,
    status: Option<String>,
    output: Option<serde_json::Value>,
    error: Option<String>,
}

impl Prediction {
    /// The output is a single URI or a list of URIs depending on the model.
    fn output_url(&self) -> Option<String> {
        match &self.output {
            Some(serde_json::Value::String(url)) => Some(url.clone()),
            Some(serde_json::Value::Array(items)) => items
                .first()
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            _ => None,
        }
    }

    /// `Ok(Some(url))` when terminal and successful, `Ok(None)` while still
    /// running, `Err` on a terminal failure.
    fn resolve(&self) -> Result<Option<String>, Error> {
        match self.status.as_deref() {
            Some("succeeded") => self.output_url().map(Some).ok_or_else(|| {
                Error::Upstream("succeeded prediction carries no output".into())
            }),
            Some("failed") | Some("canceled") => Err(Error::Transport {
                status: 0,
                message: format!(
                    "prediction ended as {}: {}",
                    self.status.as_deref().unwrap_or_default(),
                    self.error.as_deref().unwrap_or("no error detail")
                ),
            }),
            _ => Ok(None),
        }
    }
}

impl VideoSynthesizer for ReplicateClient {
    type Error = Error;

    #[tracing::instrument(skip(self, params, cancel))]
    async fn synthesize_video(
        &self,
        image_path: &Path,
        params: &VideoParams,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let prediction = self.submit_prediction(image_path, params).await?;

        let url = if let Some(url) = prediction.resolve()? {
            url
        } else {
            let id = prediction
                .id
                .ok_or_else(|| Error::Upstream("prediction response carries no id".into()))?;
            tracing::debug!(%id, "prediction submitted, polling");
            poll_until(self.poll, cancel, || {
                let id = id.clone();
                async move { self.get_prediction(&id).await?.resolve() }
            })
            .await?
        };

        fetch_to_file(&self.client, &url, dest).await?;
        tracing::info!(dest = %dest.display(), "video clip saved");
        Ok(())
    }
}
