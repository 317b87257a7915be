//! # Media Assembly
//!
//! This crate provides the final assembly stage of the video generation
//! pipeline: concatenating ordered video segments into one continuous stream
//! and replacing its audio with a single narration track.
//!
//! The concrete implementation shells out to `ffmpeg`/`ffprobe`; the
//! [`Assembler`] trait is the seam the pipeline crate programs against.

mod assembler;

pub use assembler::ffmpeg::FfmpegAssembler;
pub use assembler::{Assembler, Assembly, AssemblyError};
