pub mod artifacts;
pub mod cache;
pub mod error;
pub mod gen;
mod pipeline;
pub mod poll;
pub mod script;
pub mod tracing;

pub use error::Error;
pub use gen::{
    did::DidClient, openai::OpenAIClient, replicate::ReplicateClient, ImageParams,
    ImageSynthesizer, ScriptPlanner, TalkingHeadSynthesizer, VideoParams, VideoSynthesizer,
    VoiceSynthesizer,
};
pub use pipeline::{
    builder::ReelPipelineBuilder, FailurePolicy, ReelPipeline, RunResult, SegmentOutcome,
};
pub use poll::{poll_until, PollPolicy};
pub use script::{parse_script, Script, Segment};
