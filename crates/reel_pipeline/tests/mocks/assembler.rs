use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use reel_media::{Assembler, Assembly, AssemblyError};

#[derive(Clone)]
pub struct MockAssembler {
    pub calls: Arc<Mutex<Vec<(Vec<PathBuf>, PathBuf, PathBuf)>>>,
    pub clip_duration: f64,
    pub fail_with: Option<String>,
    last_count: Arc<Mutex<usize>>,
}

impl Default for MockAssembler {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            clip_duration: 2.5,
            fail_with: None,
            last_count: Arc::new(Mutex::new(0)),
        }
    }
}

impl MockAssembler {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Assembler for MockAssembler {
    async fn assemble(
        &self,
        segments: &[PathBuf],
        audio: &Path,
        dest: &Path,
    ) -> Result<Assembly, AssemblyError> {
        self.calls.lock().unwrap().push((
            segments.to_vec(),
            audio.to_path_buf(),
            dest.to_path_buf(),
        ));
        if let Some(ref msg) = self.fail_with {
            return Err(AssemblyError::CommandFailed {
                tool: "ffmpeg",
                status: 1,
                stderr: msg.clone(),
            });
        }
        *self.last_count.lock().unwrap() = segments.len();
        tokio::fs::write(dest, b"mock final video").await?;
        Ok(Assembly {
            output_path: dest.to_path_buf(),
            segments_assembled: segments.len(),
        })
    }

    async fn probe_duration(&self, _path: &Path) -> Result<f64, AssemblyError> {
        Ok(*self.last_count.lock().unwrap() as f64 * self.clip_duration)
    }
}
