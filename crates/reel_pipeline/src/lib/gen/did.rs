use std::path::Path;

use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    error::Error,
    gen::{check_status, fetch_to_file, TalkingHeadSynthesizer},
    poll::{poll_until, PollPolicy},
};

/// Client for the D-ID talks API: upload the narration audio, submit a talk
/// against a fixed reference image, poll until a `result_url` appears.
///
/// When credits are exhausted the service answers the submit without a job
/// id; that is surfaced as `Error::AuthorizationExhausted` immediately rather
/// than entering the poll loop.
pub struct DidClient {
    client: Client,
    authorization: String,
    base_url: String,
    source_url: String,
    poll: PollPolicy,
}

impl DidClient {
    const DEFAULT_SOURCE_URL: &str = "https://i.ibb.co/bszCKKS/7.png";

    pub fn new(authorization: impl Into<String>, poll: PollPolicy) -> Self {
        Self {
            client: Client::new(),
            authorization: authorization.into(),
            base_url: "https://api.d-id.com".into(),
            source_url: Self::DEFAULT_SOURCE_URL.into(),
            poll,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Uploads the audio file so the talks endpoint can reach it by URL.
    async fn upload_audio(&self, audio_path: &Path) -> Result<String, Error> {
        let bytes = tokio::fs::read(audio_path).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("narration.mp3")
            .mime_str("audio/mpeg")?;
        let form = reqwest::multipart::Form::new().part("audio", part);

        let resp = self
            .client
            .post(format!("{}/audios", self.base_url))
            .header("authorization", &self.authorization)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let upload = check_status(resp).await?.json::<AudioUpload>().await?;
        upload
            .url
            .ok_or_else(|| Error::Upstream("audio upload response carries no url".into()))
    }

    async fn submit_talk(&self, audio_url: &str) -> Result<String, Error> {
        let body = serde_json::json!({
            "script": {
                "type": "audio",
                "subtitles": "false",
                "provider": {
                    "type": "microsoft",
                    "voice_id": "en-US-JennyNeural"
                },
                "ssml": "false",
                "audio_url": audio_url
            },
            "config": {
                "fluent": "false",
                "pad_audio": "0.0",
                "stitch": true
            },
            "source_url": self.source_url,
        });

        let resp = self
            .client
            .post(format!("{}/talks", self.base_url))
            .header("authorization", &self.authorization)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let talk = check_status(resp).await?.json::<TalkSubmission>().await?;
        // No id means the account is out of credits, not a transient state.
        talk.id.ok_or(Error::AuthorizationExhausted)
    }

    async fn get_talk(&self, id: &str) -> Result<TalkStatus, Error> {
        let resp = self
            .client
            .get(format!("{}/talks/{id}", self.base_url))
            .header("authorization", &self.authorization)
            .send()
            .await?;

        Ok(check_status(resp).await?.json::<TalkStatus>().await?)
    }
}

#[derive(Debug, Deserialize)]
struct AudioUpload {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TalkSubmission {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TalkStatus {
    result_url: Option<String>,
}

impl TalkingHeadSynthesizer for DidClient {
    type Error = Error;

    #[tracing::instrument(skip(self, cancel))]
    async fn synthesize_talking_head(
        &self,
        audio_path: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let audio_url = self.upload_audio(audio_path).await?;
        let id = self.submit_talk(&audio_url).await?;
        tracing::debug!(%id, "talk submitted, polling for result_url");

        let result_url = poll_until(self.poll, cancel, || {
            let id = id.clone();
            async move { Ok(self.get_talk(&id).await?.result_url) }
        })
        .await?;

        fetch_to_file(&self.client, &result_url, dest).await?;
        tracing::info!(dest = %dest.display(), "talking-head video saved");
        Ok(())
    }
}
