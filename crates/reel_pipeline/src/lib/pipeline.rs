pub mod builder;

use std::{fmt::Debug, future::Future, path::PathBuf, str::FromStr, sync::Mutex};

use itertools::Itertools;
use reel_media::Assembler;
use tokio_util::sync::CancellationToken;

use crate::{
    artifacts::{ArtifactKind, ArtifactStore, RunReport},
    cache::{CacheKey, ResultCache, Stage},
    gen::{
        ImageParams, ImageSynthesizer, ScriptPlanner, TalkingHeadSynthesizer, VideoParams,
        VideoSynthesizer, VoiceSynthesizer,
    },
    script::{Script, Segment},
};

/// What to do when some segments fail and others succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Assemble the successful segments and report the dropped indices.
    SkipFailed,
    /// Abort the whole run on the first segment failure.
    AbortRun,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip-failed" | "skip" => Ok(FailurePolicy::SkipFailed),
            "abort-run" | "abort" => Ok(FailurePolicy::AbortRun),
            other => Err(format!(
                "unknown failure policy '{other}', expected 'skip-failed' or 'abort-run'"
            )),
        }
    }
}

/// Terminal state of one segment's pipeline. Errors never cross this
/// boundary; they are captured into the `Failed` variant.
#[derive(Debug, Clone)]
pub enum SegmentOutcome {
    Completed { index: usize, video_path: PathBuf },
    Failed { index: usize, reason: String },
}

impl SegmentOutcome {
    pub fn index(&self) -> usize {
        match self {
            SegmentOutcome::Completed { index, .. } | SegmentOutcome::Failed { index, .. } => {
                *index
            }
        }
    }
}

/// Everything a finished run produced, ordered by segment index.
#[derive(Debug)]
pub struct RunResult {
    pub title: String,
    pub output_path: PathBuf,
    pub report_path: PathBuf,
    pub audio_path: PathBuf,
    pub outcomes: Vec<SegmentOutcome>,
    pub dropped_segments: Vec<usize>,
}

enum StageFailure {
    Cancelled,
    Other(String),
}

impl StageFailure {
    fn reason(&self) -> String {
        match self {
            StageFailure::Cancelled => "run cancelled".into(),
            StageFailure::Other(reason) => reason.clone(),
        }
    }
}

impl From<crate::error::Error> for StageFailure {
    fn from(e: crate::error::Error) -> Self {
        StageFailure::Other(format!("{e:?}"))
    }
}

/// The prompt-to-video orchestrator.
///
/// Plans a script, then fans out one task per segment (image → video) plus
/// one task for the narration audio, joins the full set, and assembles the
/// surviving clips in segment-index order over the single audio track.
pub struct ReelPipeline<P, V, I, M, H, A>
where
    P: ScriptPlanner + Send + Sync + 'static,
    V: VoiceSynthesizer + Send + Sync + 'static,
    I: ImageSynthesizer + Send + Sync + 'static,
    M: VideoSynthesizer + Send + Sync + 'static,
    H: TalkingHeadSynthesizer + Send + Sync + 'static,
    A: Assembler + Send + Sync + 'static,
{
    artifacts: ArtifactStore,
    cache: ResultCache,
    cancel: CancellationToken,
    abort_cause: Mutex<Option<String>>,
    planner: P,
    voice: V,
    image: I,
    video: M,
    talking_head: H,
    assembler: A,
    image_params: ImageParams,
    video_params: VideoParams,
    failure_policy: FailurePolicy,
}

impl<P, V, I, M, H, A> ReelPipeline<P, V, I, M, H, A>
where
    P: ScriptPlanner + Send + Sync + 'static,
    V: VoiceSynthesizer + Send + Sync + 'static,
    I: ImageSynthesizer + Send + Sync + 'static,
    M: VideoSynthesizer + Send + Sync + 'static,
    H: TalkingHeadSynthesizer + Send + Sync + 'static,
    A: Assembler + Send + Sync + 'static,
{
    /// Handle for aborting the run from outside (e.g. on ctrl-c). Cancelling
    /// it stops in-flight polling and removes partial artifacts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Records the first fatal cause and cancels the fan-out set.
    fn abort(&self, cause: String) {
        let mut guard = self.abort_cause.lock().unwrap();
        if guard.is_none() {
            *guard = Some(cause);
            self.cancel.cancel();
        }
    }

    /// Races `fut` against the cancellation token.
    async fn with_cancel<T, E: Debug>(
        &self,
        fut: impl Future<Output = Result<T, E>>,
    ) -> Result<T, StageFailure> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(StageFailure::Cancelled),
            res = fut => res.map_err(|e| StageFailure::Other(format!("{e:?}"))),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn plan_script(&self, topic: &str) -> anyhow::Result<Script> {
        let script = self
            .planner
            .plan(topic)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to plan script: {e:?}"))?;
        tracing::info!(
            title = %script.title,
            segments = script.segments.len(),
            "script planned"
        );
        Ok(script)
    }

    /// Synthesizes the single narration track shared by all segments.
    #[tracing::instrument(skip_all)]
    async fn narration_audio(&self, script: &Script) -> Result<PathBuf, StageFailure> {
        let key = CacheKey::new(Stage::Voice, None, &[&script.narration]);
        if let Some(path) = self.cache.get(&key) {
            tracing::debug!(path = %path.display(), "voiceover cache hit");
            return Ok(path);
        }

        let dest = self
            .artifacts
            .allocate(ArtifactKind::Voiceover, "speech", "mp3", &script.narration)
            .await?;
        self.with_cancel(self.voice.synthesize_voice(&script.narration, &dest))
            .await?;

        self.cache.put(key, dest.clone());
        Ok(dest)
    }

    /// One segment's pipeline: image, then video, only on success. Returns a
    /// terminal outcome; nothing escapes this boundary.
    #[tracing::instrument(skip(self, segment, style), fields(index = segment.index))]
    async fn run_segment(&self, segment: &Segment, style: &str) -> SegmentOutcome {
        let index = segment.index;
        match self.synthesize_segment(segment, style).await {
            Ok(video_path) => {
                tracing::info!(index, video = %video_path.display(), "segment complete");
                SegmentOutcome::Completed { index, video_path }
            }
            Err(failure) => {
                let reason = failure.reason();
                tracing::warn!(index, %reason, "segment failed");
                if self.failure_policy == FailurePolicy::AbortRun
                    && !matches!(failure, StageFailure::Cancelled)
                {
                    self.abort(format!("segment {index} failed: {reason}"));
                }
                SegmentOutcome::Failed { index, reason }
            }
        }
    }

    async fn synthesize_segment(
        &self,
        segment: &Segment,
        style: &str,
    ) -> Result<PathBuf, StageFailure> {
        let index = segment.index;
        let full_prompt = if style.is_empty() {
            segment.image_prompt.clone()
        } else {
            format!("{} + {}", segment.image_prompt, style)
        };

        let image_key = CacheKey::new(
            Stage::Image,
            Some(index),
            &[
                &full_prompt,
                &self.image_params.size,
                &self.image_params.quality,
            ],
        );
        let image_path = match self.cache.get(&image_key) {
            Some(path) => {
                tracing::debug!(index, "image cache hit");
                path
            }
            None => {
                let dest = self
                    .artifacts
                    .allocate(ArtifactKind::Image, &format!("img_{index}"), "png", &full_prompt)
                    .await?;
                self.with_cancel(self.image.synthesize_image(
                    &full_prompt,
                    &self.image_params,
                    &dest,
                ))
                .await?;
                self.cache.put(image_key, dest.clone());
                dest
            }
        };

        let image_str = image_path.display().to_string();
        let video_key = CacheKey::new(
            Stage::Video,
            Some(index),
            &[&image_str, &self.video_params.clip_length],
        );
        let video_path = match self.cache.get(&video_key) {
            Some(path) => {
                tracing::debug!(index, "video cache hit");
                path
            }
            None => {
                let dest = self
                    .artifacts
                    .allocate(ArtifactKind::Video, &format!("clip_{index}"), "mp4", &full_prompt)
                    .await?;
                self.with_cancel(self.video.synthesize_video(
                    &image_path,
                    &self.video_params,
                    &dest,
                    &self.cancel,
                ))
                .await?;
                self.cache.put(video_key, dest.clone());
                dest
            }
        };

        Ok(video_path)
    }

    /// Runs the full prompt-to-video pipeline for one topic.
    ///
    /// Script or narration failure aborts the run; segment failures are
    /// handled per the configured [`FailurePolicy`]. The final segment order
    /// always equals the script's segment order, independent of completion
    /// order.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, topic: &str) -> anyhow::Result<RunResult> {
        let script = self.plan_script(topic).await?;

        let voice_fut = async {
            let res = self.narration_audio(&script).await;
            if let Err(ref failure) = res {
                // One shared track; without it no segment can ship.
                if !matches!(failure, StageFailure::Cancelled) {
                    self.abort(format!("narration synthesis failed: {}", failure.reason()));
                }
            }
            res
        };
        let segments_fut = futures::future::join_all(
            script
                .segments
                .iter()
                .map(|segment| self.run_segment(segment, &script.visual_style)),
        );

        // The join is the only barrier: assembly starts strictly after every
        // launched task has reached a terminal state.
        let (voice_res, outcomes) = tokio::join!(voice_fut, segments_fut);

        self.finish(script, voice_res, outcomes).await
    }

    async fn finish(
        &self,
        script: Script,
        voice_res: Result<PathBuf, StageFailure>,
        outcomes: Vec<SegmentOutcome>,
    ) -> anyhow::Result<RunResult> {
        if let Some(cause) = self.abort_cause.lock().unwrap().take() {
            self.artifacts.cleanup().await;
            anyhow::bail!("run aborted: {cause}");
        }
        if self.cancel.is_cancelled() {
            self.artifacts.cleanup().await;
            anyhow::bail!("run cancelled");
        }
        let audio_path = match voice_res {
            Ok(path) => path,
            Err(failure) => {
                self.artifacts.cleanup().await;
                anyhow::bail!("narration synthesis failed: {}", failure.reason());
            }
        };

        let dropped = outcomes
            .iter()
            .filter_map(|o| match o {
                SegmentOutcome::Failed { index, .. } => Some(*index),
                SegmentOutcome::Completed { .. } => None,
            })
            .collect_vec();
        let clips = outcomes
            .iter()
            .filter_map(|o| match o {
                SegmentOutcome::Completed { video_path, .. } => Some(video_path.clone()),
                SegmentOutcome::Failed { .. } => None,
            })
            .collect_vec();

        if clips.is_empty() {
            self.artifacts.cleanup().await;
            anyhow::bail!("no media produced: all {} segments failed", outcomes.len());
        }
        if !dropped.is_empty() {
            tracing::warn!(?dropped, "segments dropped from the final video");
        }

        let dest = self
            .artifacts
            .allocate(ArtifactKind::Video, "final", "mp4", &script.title)
            .await?;
        let assembly = self
            .assembler
            .assemble(&clips, &audio_path, &dest)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to assemble final video: {e:?}"))?;

        let report_path = self.write_report(&script, &dropped, &assembly.output_path).await?;
        self.artifacts.write_manifest().await?;

        tracing::info!(
            output = %assembly.output_path.display(),
            segments = assembly.segments_assembled,
            dropped = dropped.len(),
            "run complete"
        );

        Ok(RunResult {
            title: script.title,
            output_path: assembly.output_path,
            report_path,
            audio_path,
            outcomes,
            dropped_segments: dropped,
        })
    }

    /// Variant pipeline: one avatar clip narrating the script instead of
    /// per-segment image-to-video synthesis.
    #[tracing::instrument(skip(self))]
    pub async fn run_talking_head(&self, topic: &str) -> anyhow::Result<RunResult> {
        let script = self.plan_script(topic).await?;

        let audio_path = match self.narration_audio(&script).await {
            Ok(path) => path,
            Err(failure) => {
                self.artifacts.cleanup().await;
                anyhow::bail!("narration synthesis failed: {}", failure.reason());
            }
        };

        let key = CacheKey::new(
            Stage::TalkingHead,
            None,
            &[&audio_path.display().to_string()],
        );
        let avatar_path = match self.cache.get(&key) {
            Some(path) => path,
            None => {
                let dest = self
                    .artifacts
                    .allocate(ArtifactKind::Video, "avatar", "mp4", &script.title)
                    .await?;
                let synth = self.with_cancel(self.talking_head.synthesize_talking_head(
                    &audio_path,
                    &dest,
                    &self.cancel,
                ))
                .await;
                if let Err(failure) = synth {
                    self.artifacts.cleanup().await;
                    anyhow::bail!("talking-head synthesis failed: {}", failure.reason());
                }
                self.cache.put(key, dest.clone());
                dest
            }
        };

        let dest = self
            .artifacts
            .allocate(ArtifactKind::Video, "final", "mp4", &script.title)
            .await?;
        let assembly = self
            .assembler
            .assemble(&[avatar_path.clone()], &audio_path, &dest)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to assemble final video: {e:?}"))?;

        let report_path = self.write_report(&script, &[], &assembly.output_path).await?;
        self.artifacts.write_manifest().await?;

        Ok(RunResult {
            title: script.title,
            output_path: assembly.output_path,
            report_path,
            audio_path,
            outcomes: vec![SegmentOutcome::Completed {
                index: 0,
                video_path: avatar_path,
            }],
            dropped_segments: Vec::new(),
        })
    }

    async fn write_report(
        &self,
        script: &Script,
        dropped: &[usize],
        output_path: &std::path::Path,
    ) -> anyhow::Result<PathBuf> {
        let report = RunReport {
            title: script.title.clone(),
            narration: script.narration.clone(),
            visual_style: script.visual_style.clone(),
            video_logline: script.video_logline.clone(),
            segment_prompts: script
                .segments
                .iter()
                .map(|s| s.image_prompt.clone())
                .collect(),
            dropped_segments: dropped.to_vec(),
            output_path: Some(output_path.to_path_buf()),
            generated_at: chrono::Utc::now(),
        };
        Ok(self.artifacts.write_report(&report).await?)
    }
}
