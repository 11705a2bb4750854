//! Transcoder sessions.

mod command;
mod progress;

pub use command::{
    EndHook, ErrorHook, OutputTarget, PipedTranscode, ProgressHook, StartHook, TranscodeSession,
};
pub use progress::{parse_progress_line, TranscodeProgress};
