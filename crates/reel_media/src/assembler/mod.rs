use std::{
    future::Future,
    path::{Path, PathBuf},
};

pub mod ffmpeg;

pub trait Assembler {
    /// Concatenates `segments` in list order and muxes `audio` over the
    /// result, writing one output file at `dest`.
    fn assemble(
        &self,
        segments: &[PathBuf],
        audio: &Path,
        dest: &Path,
    ) -> impl Future<Output = Result<Assembly, AssemblyError>> + Send;

    /// Returns the duration of a media file in seconds.
    fn probe_duration(&self, path: &Path) -> impl Future<Output = Result<f64, AssemblyError>> + Send;
}

impl<T: Assembler + Send + Sync> Assembler for &T {
    async fn assemble(
        &self,
        segments: &[PathBuf],
        audio: &Path,
        dest: &Path,
    ) -> Result<Assembly, AssemblyError> {
        (**self).assemble(segments, audio, dest).await
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, AssemblyError> {
        (**self).probe_duration(path).await
    }
}

#[derive(Debug)]
pub struct Assembly {
    pub output_path: PathBuf,
    pub segments_assembled: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no video segments to assemble")]
    NoSegments,
    #[error("{tool} failed with status {status}: {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: i32,
        stderr: String,
    },
    #[error("could not parse ffprobe output: {0}")]
    Probe(String),
}
