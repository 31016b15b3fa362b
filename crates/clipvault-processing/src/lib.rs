//! Clipvault Processing Library
//!
//! Wraps the two external media tools the upload pipeline depends on:
//! `ffprobe` for stream geometry and `ffmpeg` for the fast-start remux.
//! Neither tool is invoked directly; every call goes through a
//! [`CommandRunner`] behind a bounded [`ToolPool`].

pub mod command;
pub mod error;
pub mod faststart;
pub mod pool;
pub mod probe;

pub use command::{CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner};
pub use error::ProcessingError;
pub use faststart::{FastStartProcessor, PROCESSING_SUFFIX};
pub use pool::ToolPool;
pub use probe::{classify, MediaProbe};
