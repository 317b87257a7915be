use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use reel_pipeline::VoiceSynthesizer;

#[derive(Clone, Default)]
pub struct MockVoiceSynthesizer {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockVoiceSynthesizer {
    pub fn failing(msg: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl VoiceSynthesizer for MockVoiceSynthesizer {
    const VOICE_MODEL: &str = "mock-tts";
    type Error = anyhow::Error;

    async fn synthesize_voice(&self, narration: &str, dest: &Path) -> Result<(), Self::Error> {
        self.calls.lock().unwrap().push(narration.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        tokio::fs::write(dest, b"mock audio").await?;
        Ok(())
    }
}
