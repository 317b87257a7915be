use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use reel_pipeline::{poll_until, Error, PollPolicy, VideoParams, VideoSynthesizer};
use tokio_util::sync::CancellationToken;

use crate::mocks::index_from_artifact;

/// Records (source image, dest) per call; optional per-segment delays let
/// tests force completion order away from index order.
#[derive(Clone, Default)]
pub struct MockVideoSynthesizer {
    pub calls: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
    pub delays: Arc<HashMap<usize, Duration>>,
    pub fail_with: Option<String>,
}

impl MockVideoSynthesizer {
    pub fn with_delays(delays: HashMap<usize, Duration>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            delays: Arc::new(delays),
            fail_with: None,
        }
    }
}

impl VideoSynthesizer for MockVideoSynthesizer {
    type Error = anyhow::Error;

    async fn synthesize_video(
        &self,
        image_path: &Path,
        _params: &VideoParams,
        dest: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), Self::Error> {
        let index = index_from_artifact(image_path);
        if let Some(delay) = self.delays.get(&index) {
            tokio::time::sleep(*delay).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push((image_path.to_path_buf(), dest.to_path_buf()));
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        tokio::fs::write(dest, b"mock video").await?;
        Ok(())
    }
}

/// Double for the submit-then-poll shape: each synthesis polls under the
/// given policy and becomes ready after `ready_after` checks, or never.
#[derive(Clone)]
pub struct PollingVideoSynthesizer {
    pub policy: PollPolicy,
    pub ready_after: Option<usize>,
    pub polls: Arc<Mutex<usize>>,
}

impl PollingVideoSynthesizer {
    pub fn ready_after(policy: PollPolicy, checks: usize) -> Self {
        Self {
            policy,
            ready_after: Some(checks),
            polls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn never_ready(policy: PollPolicy) -> Self {
        Self {
            policy,
            ready_after: None,
            polls: Arc::new(Mutex::new(0)),
        }
    }
}

impl VideoSynthesizer for PollingVideoSynthesizer {
    type Error = Error;

    async fn synthesize_video(
        &self,
        _image_path: &Path,
        _params: &VideoParams,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), Self::Error> {
        let ready_after = self.ready_after;
        let polls = self.polls.clone();

        poll_until(self.policy, cancel, move || {
            let polls = polls.clone();
            async move {
                let mut count = polls.lock().unwrap();
                *count += 1;
                match ready_after {
                    Some(checks) if *count >= checks => Ok(Some(())),
                    _ => Ok(None),
                }
            }
        })
        .await?;

        tokio::fs::write(dest, b"mock video").await?;
        Ok(())
    }
}
