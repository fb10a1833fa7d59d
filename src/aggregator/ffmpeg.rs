use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Output codec handed to ffmpeg.
pub const OUTPUT_CODEC: &str = "libmp3lame";
/// Output bitrate handed to ffmpeg.
pub const OUTPUT_BITRATE: &str = "256k";

/// Bytes of ffmpeg's stderr kept for the error log.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, thiserror::Error)]
pub enum ConcatError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed { program: String, status: ExitStatus, stderr: String },
    #[error("concat job timed out after {0:?}")]
    TimedOut(Duration),
    #[error("concat job cancelled")]
    Cancelled,
}

/// Runs a single concatenation of `inputs` into `output`.
///
/// Implementations must not leave a usable-looking file behind on error;
/// the caller additionally removes `output` after a failure.
#[async_trait]
pub trait ConcatRunner: Send + Sync {
    async fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConcatError>;
}

/// Builds the ffmpeg argument vector for an audio-only concat of `inputs`.
///
/// `-i <in>...  -filter_complex concat=n=N:v=0:a=1[a] -map [a] -codec:a libmp3lame -b:a 256k <out>`
pub fn concat_args(inputs: &[PathBuf], output: &Path) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = Vec::with_capacity(inputs.len() * 2 + 9);
    for input in inputs {
        args.push("-i".into());
        args.push(input.as_os_str().to_owned());
    }
    args.push("-filter_complex".into());
    args.push(format!("concat=n={}:v=0:a=1[a]", inputs.len()).into());
    args.push("-map".into());
    args.push("[a]".into());
    args.push("-codec:a".into());
    args.push(OUTPUT_CODEC.into());
    args.push("-b:a".into());
    args.push(OUTPUT_BITRATE.into());
    args.push(output.as_os_str().to_owned());
    args
}

/// Spawns the real ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: String,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self { program: program.into(), timeout }
    }
}

#[async_trait]
impl ConcatRunner for FfmpegRunner {
    async fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ConcatError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(concat_args(inputs, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!("cmd: {:?}", cmd.as_std());

        // Dropping the output future kills the child (kill_on_drop)
        let limit = self.timeout;
        let run = cmd.output();
        let limited = async move {
            match limit {
                Some(l) => tokio::time::timeout(l, run).await.map_err(|_| ConcatError::TimedOut(l)),
                None => Ok(run.await),
            }
        };
        let result = tokio::select! {
            _ = cancel.cancelled() => return Err(ConcatError::Cancelled),
            r = limited => r?,
        };

        let out = result.map_err(|source| ConcatError::Launch { program: self.program.clone(), source })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let tail_start = stderr.len().saturating_sub(STDERR_TAIL);
            let tail = stderr
                .char_indices()
                .find(|(i, _)| *i >= tail_start)
                .map(|(i, _)| &stderr[i..])
                .unwrap_or("");
            return Err(ConcatError::Failed {
                program: self.program.clone(),
                status: out.status,
                stderr: tail.trim().to_string(),
            });
        }
        Ok(())
    }
}
