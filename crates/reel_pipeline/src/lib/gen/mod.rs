//! Trait seams for the remote generation services.
//!
//! Each stage of the pipeline talks to a remote service through one of these
//! traits; concrete clients live in the sibling modules, test doubles in the
//! integration test mocks.

pub mod did;
pub mod openai;
pub mod replicate;

use std::{
    fmt::Debug,
    future::Future,
    path::{Path, PathBuf},
};

use tokio_util::sync::CancellationToken;

use crate::{error::Error, script::Script};

pub trait ScriptPlanner {
    const PLANNER_MODEL: &str;

    type Error: Debug;

    /// Turns a topic prompt into a structured script. No retry; a failure
    /// here is fatal to the run.
    fn plan(&self, topic: &str) -> impl Future<Output = Result<Script, Self::Error>> + Send;
}

pub trait VoiceSynthesizer {
    const VOICE_MODEL: &str;

    type Error: Debug;

    /// Synthesizes the narration into one audio artifact at `dest`.
    fn synthesize_voice(
        &self,
        narration: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct ImageParams {
    pub size: String,
    pub quality: String,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            size: "1792x1024".into(),
            quality: "hd".into(),
        }
    }
}

pub trait ImageSynthesizer {
    const IMAGE_MODEL: &str;

    type Error: Debug;

    /// Synthesizes one still image for `prompt` and fully persists it at
    /// `dest` before returning, whether the service answered inline or with a
    /// fetchable URL.
    fn synthesize_image(
        &self,
        prompt: &str,
        params: &ImageParams,
        dest: &Path,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct VideoParams {
    pub clip_length: String,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            clip_length: "25_frames_with_svd_xt".into(),
        }
    }
}

pub trait VideoSynthesizer {
    type Error: Debug;

    /// Animates one still image into a short clip at `dest`. Completion is
    /// asynchronous on the remote side; implementations poll under a bounded
    /// policy and honor `cancel`.
    fn synthesize_video(
        &self,
        image_path: &Path,
        params: &VideoParams,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

pub trait TalkingHeadSynthesizer {
    type Error: Debug;

    /// Submits a narration track to the avatar service and persists the
    /// resulting video at `dest`. Polls under a bounded policy; an exhausted
    /// credits response fails immediately, it never enters the poll loop.
    fn synthesize_talking_head(
        &self,
        audio_path: &Path,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Downloads `url` to `dest`, failing with `Error::Transport` on a
/// non-success status.
pub(crate) async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
) -> Result<(), Error> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(Error::Transport {
            status: resp.status().as_u16(),
            message: format!("failed to download {url}"),
        });
    }

    let bytes = resp.bytes().await?;
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, &bytes).await?;
    Ok(())
}

/// Reads the response body, mapping a non-success status to the typed error.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        return Err(Error::Transport { status, message });
    }
    Ok(resp)
}
