use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use reel_pipeline::{Error, TalkingHeadSynthesizer};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub struct MockTalkingHeadSynthesizer {
    pub calls: Arc<Mutex<Vec<PathBuf>>>,
    pub no_credits: bool,
}

impl MockTalkingHeadSynthesizer {
    pub fn out_of_credits() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            no_credits: true,
        }
    }
}

impl TalkingHeadSynthesizer for MockTalkingHeadSynthesizer {
    type Error = Error;

    async fn synthesize_talking_head(
        &self,
        audio_path: &Path,
        dest: &Path,
        _cancel: &CancellationToken,
    ) -> Result<(), Self::Error> {
        self.calls.lock().unwrap().push(audio_path.to_path_buf());
        if self.no_credits {
            return Err(Error::AuthorizationExhausted);
        }
        tokio::fs::write(dest, b"mock avatar video").await?;
        Ok(())
    }
}
