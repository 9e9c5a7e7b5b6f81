use crate::encode::{Encoder, StepProgress};
use crate::error::{RenderError, Result};
use crate::plan::{ConcatStep, RenderStep, SegmentId, TrimStep};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONCAT_LIST: &str = "concat_list.txt";
const STDERR_TAIL: usize = 20;

/// Encoder that shells out to the `ffmpeg` binary. Segments are written as
/// MPEG-TS files under `work_dir` so they can be joined with stream copy.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    work_dir: PathBuf,
    output: PathBuf,
    /// Seconds of media each segment holds, for concat progress.
    segment_secs: HashMap<SegmentId, f64>,
}

impl FfmpegEncoder {
    pub fn new(work_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            work_dir: work_dir.into(),
            output: output.into(),
            segment_secs: HashMap::new(),
        }
    }

    /// Use a specific ffmpeg binary instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn segment_path(&self, segment: SegmentId) -> PathBuf {
        self.work_dir.join(format!("{segment}.ts"))
    }

    async fn run_trim(&mut self, step: &TrimStep, progress: StepProgress<'_>) -> Result<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let out = self.segment_path(step.output);
        let args = trim_args(step, &out);
        let secs = step.duration().as_seconds();
        self.execute(&args, secs, progress).await?;
        self.segment_secs.insert(step.output, secs);
        Ok(())
    }

    async fn run_concat(&mut self, step: &ConcatStep, progress: StepProgress<'_>) -> Result<()> {
        let paths: Vec<PathBuf> = step
            .segments
            .iter()
            .map(|s| self.segment_path(*s))
            .collect();
        let list_path = self.work_dir.join(CONCAT_LIST);
        tokio::fs::write(&list_path, concat_list(&paths)).await?;

        let total: f64 = step
            .segments
            .iter()
            .filter_map(|s| self.segment_secs.get(s))
            .sum();
        let args = concat_args(&list_path, &self.output);
        let result = self.execute(&args, total, progress).await;

        if let Err(e) = tokio::fs::remove_file(&list_path).await {
            tracing::debug!(path = %list_path.display(), error = %e, "concat list not removed");
        }
        result
    }

    /// Spawn ffmpeg and forward its progress until it exits.
    async fn execute(
        &self,
        args: &[String],
        expected_secs: f64,
        progress: StepProgress<'_>,
    ) -> Result<()> {
        use std::collections::VecDeque;
        use std::process::Stdio;
        use tokio::io::{AsyncBufReadExt, BufReader};
        use tokio::process::Command;

        tracing::debug!(program = %self.program.display(), ?args, "spawning ffmpeg");
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RenderError::FfmpegNotFound
                } else {
                    RenderError::Io(e)
                }
            })?;

        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(secs) = parse_progress_time(&line) {
                    if expected_secs > 0.0 {
                        progress((secs / expected_secs).min(1.0));
                    }
                    continue;
                }
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let detail = Vec::from(tail).join("\n");
            return Err(RenderError::FfmpegFailed(format!(
                "ffmpeg exited with {status}: {detail}"
            )));
        }
        progress(1.0);
        Ok(())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn run_step(
        &mut self,
        index: usize,
        step: &RenderStep,
        progress: StepProgress<'_>,
    ) -> anyhow::Result<()> {
        tracing::info!(step = index, "ffmpeg step");
        match step {
            RenderStep::Trim(trim) => self.run_trim(trim, progress).await?,
            RenderStep::Concat(concat) => self.run_concat(concat, progress).await?,
        }
        Ok(())
    }

    async fn release(&mut self, segment: SegmentId) -> anyhow::Result<()> {
        self.segment_secs.remove(&segment);
        let path = self.segment_path(segment);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RenderError::Io(e).into()),
        }
    }
}

/// Arguments that cut one segment and normalize it to the step's target.
/// Sources with a different aspect ratio are scaled to fit and padded.
pub fn trim_args(step: &TrimStep, output: &Path) -> Vec<String> {
    let w = step.normalize.width;
    let h = step.normalize.height;
    let fps = step.normalize.frame_rate;
    let vf = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,fps={fps}"
    );
    let mut args = progress_args();
    args.extend([
        "-ss".to_string(),
        step.trim_start.as_seconds().to_string(),
        "-t".to_string(),
        step.duration().as_seconds().to_string(),
        "-i".to_string(),
        step.source.as_str().to_string(),
        "-vf".to_string(),
        vf,
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "ultrafast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-ar".to_string(),
        "44100".to_string(),
        "-f".to_string(),
        "mpegts".to_string(),
        output.to_string_lossy().to_string(),
    ]);
    args
}

/// Arguments that join the listed segments without re-encoding.
pub fn concat_args(list: &Path, output: &Path) -> Vec<String> {
    let mut args = progress_args();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list.to_string_lossy().to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]);
    args
}

/// Machine-readable progress on stderr, one `key=value` per line.
fn progress_args() -> Vec<String> {
    ["-y", "-nostats", "-progress", "pipe:2"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Contents of an ffmpeg concat demuxer list.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            let escaped = p.to_string_lossy().replace('\'', "'\\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

/// Seconds of output written so far, from a progress line such as
/// `out_time=00:01:02.050000` or a stats line containing `time=00:01:02.05`.
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let (_, rest) = line.split_once("time=")?;
    let value = rest.split_whitespace().next()?;
    let mut fields = 0;
    let mut secs = 0.0;
    for part in value.split(':') {
        secs = secs * 60.0 + part.parse::<f64>().ok()?;
        fields += 1;
    }
    (fields == 3).then_some(secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
