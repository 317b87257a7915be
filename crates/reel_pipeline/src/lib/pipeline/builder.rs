use std::{path::PathBuf, sync::Mutex};

use reel_media::Assembler;
use tokio_util::sync::CancellationToken;

use crate::{
    artifacts::ArtifactStore,
    cache::ResultCache,
    gen::{
        ImageParams, ImageSynthesizer, ScriptPlanner, TalkingHeadSynthesizer, VideoParams,
        VideoSynthesizer, VoiceSynthesizer,
    },
    FailurePolicy, ReelPipeline,
};

pub struct ReelPipelineBuilder<P = (), V = (), I = (), M = (), H = (), A = ()> {
    workdir: PathBuf,
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

impl ReelPipelineBuilder {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            planner: (),
            voice: (),
            image: (),
            video: (),
            talking_head: (),
            assembler: (),
            image_params: ImageParams::default(),
            video_params: VideoParams::default(),
            failure_policy: FailurePolicy::SkipFailed,
        }
    }
}

impl<P, V, I, M, H, A> ReelPipelineBuilder<P, V, I, M, H, A> {
    pub fn planner<P2: ScriptPlanner + Send + Sync + 'static>(
        self,
        planner: P2,
    ) -> ReelPipelineBuilder<P2, V, I, M, H, A> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner,
            voice: self.voice,
            image: self.image,
            video: self.video,
            talking_head: self.talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn voice_synthesizer<V2: VoiceSynthesizer + Send + Sync + 'static>(
        self,
        voice: V2,
    ) -> ReelPipelineBuilder<P, V2, I, M, H, A> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner: self.planner,
            voice,
            image: self.image,
            video: self.video,
            talking_head: self.talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn image_synthesizer<I2: ImageSynthesizer + Send + Sync + 'static>(
        self,
        image: I2,
    ) -> ReelPipelineBuilder<P, V, I2, M, H, A> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner: self.planner,
            voice: self.voice,
            image,
            video: self.video,
            talking_head: self.talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn video_synthesizer<M2: VideoSynthesizer + Send + Sync + 'static>(
        self,
        video: M2,
    ) -> ReelPipelineBuilder<P, V, I, M2, H, A> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner: self.planner,
            voice: self.voice,
            image: self.image,
            video,
            talking_head: self.talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn talking_head_synthesizer<H2: TalkingHeadSynthesizer + Send + Sync + 'static>(
        self,
        talking_head: H2,
    ) -> ReelPipelineBuilder<P, V, I, M, H2, A> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner: self.planner,
            voice: self.voice,
            image: self.image,
            video: self.video,
            talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn assembler<A2: Assembler + Send + Sync + 'static>(
        self,
        assembler: A2,
    ) -> ReelPipelineBuilder<P, V, I, M, H, A2> {
        ReelPipelineBuilder {
            workdir: self.workdir,
            planner: self.planner,
            voice: self.voice,
            image: self.image,
            video: self.video,
            talking_head: self.talking_head,
            assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }

    pub fn image_params(mut self, image_params: ImageParams) -> Self {
        self.image_params = image_params;
        self
    }

    pub fn video_params(mut self, video_params: VideoParams) -> Self {
        self.video_params = video_params;
        self
    }

    pub fn failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}

impl<P, V, I, M, H, A> ReelPipelineBuilder<P, V, I, M, H, A>
where
    P: ScriptPlanner + Send + Sync + 'static,
    V: VoiceSynthesizer + Send + Sync + 'static,
    I: ImageSynthesizer + Send + Sync + 'static,
    M: VideoSynthesizer + Send + Sync + 'static,
    H: TalkingHeadSynthesizer + Send + Sync + 'static,
    A: Assembler + Send + Sync + 'static,
{
    pub fn build(self) -> ReelPipeline<P, V, I, M, H, A> {
        ReelPipeline {
            artifacts: ArtifactStore::new(self.workdir),
            cache: ResultCache::default(),
            cancel: CancellationToken::new(),
            abort_cause: Mutex::new(None),
            planner: self.planner,
            voice: self.voice,
            image: self.image,
            video: self.video,
            talking_head: self.talking_head,
            assembler: self.assembler,
            image_params: self.image_params,
            video_params: self.video_params,
            failure_policy: self.failure_policy,
        }
    }
}
