use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use reel_pipeline::{ImageParams, ImageSynthesizer};

#[derive(Clone, Default)]
pub struct MockImageSynthesizer {
    pub calls: Arc<Mutex<Vec<(String, PathBuf)>>>,
    /// Fails any call whose prompt contains this needle; other segments are
    /// untouched.
    pub fail_when_contains: Option<String>,
}

impl MockImageSynthesizer {
    pub fn failing_for(needle: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_when_contains: Some(needle.to_string()),
        }
    }
}

impl ImageSynthesizer for MockImageSynthesizer {
    const IMAGE_MODEL: &str = "mock-dall-e";
    type Error = anyhow::Error;

    async fn synthesize_image(
        &self,
        prompt: &str,
        _params: &ImageParams,
        dest: &Path,
    ) -> Result<(), Self::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), dest.to_path_buf()));
        if let Some(ref needle) = self.fail_when_contains {
            if prompt.contains(needle.as_str()) {
                return Err(anyhow::anyhow!("image synthesis refused for '{}'", needle));
            }
        }
        tokio::fs::write(dest, b"mock image").await?;
        Ok(())
    }
}
