use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use reel_media::FfmpegAssembler;
use reel_pipeline::{
    tracing::init_tracing_subscriber, DidClient, FailurePolicy, OpenAIClient, PollPolicy,
    ReelPipelineBuilder, ReplicateClient, RunResult,
};

#[derive(Parser)]
#[command(name = "storyreel", about = "Prompt-to-narrated-video generator")]
struct Cli {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: String,

    /// Replicate API token
    #[arg(long, env = "REPLICATE_API_TOKEN")]
    replicate_token: String,

    /// D-ID authorization header value (talking-head runs only)
    #[arg(long, env = "DID_AUTHORIZATION")]
    did_authorization: Option<String>,

    /// Working directory for generated media
    #[arg(long, env = "STORYREEL_WORKDIR", default_value = "./media")]
    workdir: PathBuf,

    /// Seconds between remote job status checks
    #[arg(long, default_value = "5")]
    poll_interval: u64,

    /// Deadline in seconds for one image-to-video job
    #[arg(long, default_value = "600")]
    video_deadline: u64,

    /// Deadline in seconds for one talking-head job
    #[arg(long, default_value = "300")]
    talking_head_deadline: u64,

    /// What to do when some segments fail: skip-failed or abort-run
    #[arg(long, env = "STORYREEL_ON_FAILURE", default_value = "skip-failed")]
    on_failure: FailurePolicy,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a narrated multi-segment video from a topic
    Generate {
        /// Topic prompt for the script planner
        topic: String,
    },
    /// Generate a talking-head video narrating the script for a topic
    TalkingHead {
        /// Topic prompt for the script planner
        topic: String,
    },
}

async fn run(cli: Cli) -> anyhow::Result<RunResult> {
    let interval = Duration::from_secs(cli.poll_interval);
    let openai = OpenAIClient::new(&cli.openai_key);
    let replicate = ReplicateClient::new(
        &cli.replicate_token,
        PollPolicy::new(interval, Duration::from_secs(cli.video_deadline)),
    );
    let did = DidClient::new(
        cli.did_authorization.clone().unwrap_or_default(),
        PollPolicy::new(interval, Duration::from_secs(cli.talking_head_deadline)),
    );

    let pipeline = ReelPipelineBuilder::new(&cli.workdir)
        .planner(openai.clone())
        .voice_synthesizer(openai.clone())
        .image_synthesizer(openai)
        .video_synthesizer(replicate)
        .talking_head_synthesizer(did)
        .assembler(FfmpegAssembler::default())
        .failure_policy(cli.on_failure)
        .build();

    // Ctrl-c cancels the fan-out set and cleans up partial artifacts.
    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    match cli.command {
        Command::Generate { ref topic } => pipeline.run(topic).await,
        Command::TalkingHead { ref topic } => {
            anyhow::ensure!(
                cli.did_authorization.is_some(),
                "talking-head runs require DID_AUTHORIZATION"
            );
            pipeline.run_talking_head(topic).await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let result = run(cli).await?;

    tracing::info!(
        title = %result.title,
        output = %result.output_path.display(),
        report = %result.report_path.display(),
        "finished"
    );
    if !result.dropped_segments.is_empty() {
        tracing::warn!(
            dropped = ?result.dropped_segments,
            "final video is missing these segments"
        );
    }

    Ok(())
}
