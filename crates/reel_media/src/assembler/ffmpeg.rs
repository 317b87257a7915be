use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::assembler::{Assembler, Assembly, AssemblyError};

/// Assembles segment clips with `ffmpeg` via the concat demuxer, then muxes
/// the narration audio over the concatenated stream.
#[derive(Debug, Clone)]
pub struct FfmpegAssembler {
    ffmpeg_bin: PathBuf,
    ffprobe_bin: PathBuf,
}

impl Default for FfmpegAssembler {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegAssembler {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, ffprobe_bin: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    async fn run_checked(
        &self,
        tool: &'static str,
        cmd: &mut Command,
    ) -> Result<Vec<u8>, AssemblyError> {
        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(tool, %stderr, "media tool failed");
            return Err(AssemblyError::CommandFailed {
                tool,
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        Ok(output.stdout)
    }
}

/// Renders the concat demuxer list: one `file '...'` line per segment,
/// single quotes in paths escaped per the demuxer's quoting rules.
fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

impl Assembler for FfmpegAssembler {
    #[tracing::instrument(skip(self, segments))]
    async fn assemble(
        &self,
        segments: &[PathBuf],
        audio: &Path,
        dest: &Path,
    ) -> Result<Assembly, AssemblyError> {
        if segments.is_empty() {
            return Err(AssemblyError::NoSegments);
        }

        // Scratch dir holds the list file and the intermediate concat output;
        // dropping it releases both on every exit path, errors included.
        let scratch = tempfile::tempdir()?;
        let list_path = scratch.path().join("segments.txt");
        tokio::fs::write(&list_path, concat_list(segments)).await?;

        let concat_path = scratch.path().join("concat.mp4");
        self.run_checked(
            "ffmpeg",
            Command::new(&self.ffmpeg_bin).args([
                "-y",
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                &list_path.display().to_string(),
                "-c",
                "copy",
                &concat_path.display().to_string(),
            ]),
        )
        .await?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Replace whatever audio the clips carry with the narration track.
        self.run_checked(
            "ffmpeg",
            Command::new(&self.ffmpeg_bin).args([
                "-y",
                "-i",
                &concat_path.display().to_string(),
                "-i",
                &audio.display().to_string(),
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "libx264",
                "-c:a",
                "aac",
                "-shortest",
                &dest.display().to_string(),
            ]),
        )
        .await?;

        tracing::info!(dest = %dest.display(), segments = segments.len(), "assembly complete");
        Ok(Assembly {
            output_path: dest.to_path_buf(),
            segments_assembled: segments.len(),
        })
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, AssemblyError> {
        let stdout = self
            .run_checked(
                "ffprobe",
                Command::new(&self.ffprobe_bin).args([
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                    &path.display().to_string(),
                ]),
            )
            .await?;

        let text = String::from_utf8_lossy(&stdout);
        text.trim()
            .parse::<f64>()
            .map_err(|_| AssemblyError::Probe(text.trim().to_string()))
    }
}
