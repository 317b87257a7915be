//! Artifact layout and provenance.
//!
//! Artifacts land under category directories inside one workdir. File names
//! are `{prefix}_{uuid}` rather than a truncated prompt slug, which collides
//! across near-duplicate prompts; the prompt that produced each artifact is
//! recorded in a `manifest.json` next to them, and a run report captures the
//! finished script for provenance.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Image,
    Video,
    Voiceover,
    Report,
}

impl ArtifactKind {
    fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "images",
            ArtifactKind::Video => "videos",
            ArtifactKind::Voiceover => "voiceover",
            ArtifactKind::Report => "reports",
        }
    }
}

/// Run report written next to the final video: the finished script, style,
/// per-segment prompts, and which segments (if any) were dropped.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub title: String,
    pub narration: String,
    pub visual_style: String,
    pub video_logline: Option<String>,
    pub segment_prompts: Vec<String>,
    pub dropped_segments: Vec<usize>,
    pub output_path: Option<PathBuf>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    manifest: Mutex<HashMap<String, String>>,
    allocated: Mutex<Vec<PathBuf>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: Mutex::new(HashMap::new()),
            allocated: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserves a collision-resistant path for a new artifact and records the
    /// generating prompt in the manifest.
    pub async fn allocate(
        &self,
        kind: ArtifactKind,
        prefix: &str,
        ext: &str,
        prompt: &str,
    ) -> Result<PathBuf, Error> {
        let dir = self.root.join(kind.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{prefix}_{}.{ext}", Uuid::new_v4());
        self.manifest
            .lock()
            .unwrap()
            .insert(name.clone(), prompt.to_string());

        let path = dir.join(name);
        self.allocated.lock().unwrap().push(path.clone());
        Ok(path)
    }

    /// Writes the name → prompt manifest at the workdir root.
    pub async fn write_manifest(&self) -> Result<PathBuf, Error> {
        let manifest = self.manifest.lock().unwrap().clone();
        let path = self.root.join("manifest.json");
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, serde_json::to_vec_pretty(&manifest)?).await?;
        Ok(path)
    }

    pub async fn write_report(&self, report: &RunReport) -> Result<PathBuf, Error> {
        let dir = self.root.join(ArtifactKind::Report.dir());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("report_{}.json", Uuid::new_v4()));
        tokio::fs::write(&path, serde_json::to_vec_pretty(report)?).await?;
        self.allocated.lock().unwrap().push(path.clone());
        Ok(path)
    }

    /// Best-effort removal of every artifact allocated so far. Used when a
    /// run is cancelled or aborted so partial outputs don't linger.
    pub async fn cleanup(&self) {
        let allocated: Vec<PathBuf> = self.allocated.lock().unwrap().drain(..).collect();
        for path in allocated {
            if !path.exists() {
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(error = ?e, path = %path.display(), "failed to remove partial artifact");
            } else {
                tracing::debug!(path = %path.display(), "removed partial artifact");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allocate_gives_distinct_names_for_identical_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let a = store
            .allocate(ArtifactKind::Image, "img_0", "png", "same prompt")
            .await
            .unwrap();
        let b = store
            .allocate(ArtifactKind::Image, "img_0", "png", "same prompt")
            .await
            .unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with(dir.path().join("images")));
    }

    #[tokio::test]
    async fn manifest_maps_names_to_prompts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store
            .allocate(ArtifactKind::Video, "clip_1", "mp4", "a red fox")
            .await
            .unwrap();
        let manifest_path = store.write_manifest().await.unwrap();

        let manifest: HashMap<String, String> =
            serde_json::from_slice(&std::fs::read(manifest_path).unwrap()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(manifest.get(name).map(String::as_str), Some("a red fox"));
    }

    #[tokio::test]
    async fn cleanup_removes_written_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let path = store
            .allocate(ArtifactKind::Voiceover, "speech", "mp3", "narration")
            .await
            .unwrap();
        tokio::fs::write(&path, b"audio").await.unwrap();
        assert!(path.exists());

        store.cleanup().await;
        assert!(!path.exists());
    }
}
