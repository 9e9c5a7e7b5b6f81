//! Export an edit script to a video file with ffmpeg.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use cutline_core::EngineConfig;
use cutline_render::{
    compile, run_plan, EncodeProgress, Encoder, FfmpegEncoder, RenderError, RenderPlan,
};
use tempfile::TempDir;
use tokio::sync::watch;

/// Where intermediate segments go. A temporary directory is removed on drop;
/// a directory the user named is never removed.
enum WorkDir {
    Temp(TempDir),
    User(PathBuf),
}

impl WorkDir {
    fn prepare(user: Option<PathBuf>) -> anyhow::Result<Self> {
        match user {
            Some(dir) => Ok(WorkDir::User(dir)),
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("cutline-")
                    .tempdir()
                    .context("failed to create a temporary work directory")?;
                Ok(WorkDir::Temp(dir))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            WorkDir::Temp(dir) => dir.path(),
            WorkDir::User(dir) => dir,
        }
    }
}

pub async fn run(
    config: &EngineConfig,
    script: PathBuf,
    output: PathBuf,
    work_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session = super::load_session(config, &script)?;
    let plan = compile(&session)?;
    plan.ensure_fresh(session.catalog())?;

    let work_dir = WorkDir::prepare(work_dir)?;
    println!("Rendering {} step(s)", plan.step_count());
    println!("  Output: {}", output.display());
    println!(
        "  Format: {}x{} @ {}fps",
        plan.target.width, plan.target.height, plan.target.frame_rate
    );

    let mut encoder = FfmpegEncoder::new(work_dir.path(), &output);
    let cancel = AtomicBool::new(false);
    let result = export(&plan, &mut encoder, &cancel).await;
    drop(work_dir);

    match result {
        Ok(()) => {
            println!("\nExport complete: {}", output.display());
            Ok(())
        }
        Err(RenderError::Cancelled { step_index }) => {
            println!();
            anyhow::bail!("export cancelled before step {step_index}")
        }
        Err(e) => {
            println!();
            Err(e.into())
        }
    }
}

/// Run the plan, printing progress. The first Ctrl-C stops after the
/// current step; a second one abandons the step in flight.
async fn export<E>(plan: &RenderPlan, encoder: &mut E, cancel: &AtomicBool) -> Result<(), RenderError>
where
    E: Encoder + ?Sized,
{
    let (progress_tx, mut progress_rx) = watch::channel(EncodeProgress::default());
    let printer = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let p = progress_rx.borrow_and_update().clone();
            print!(
                "\r  Progress: {:.1}% ({}/{} steps)  ",
                p.fraction * 100.0,
                p.completed_steps,
                p.total_steps
            );
            std::io::stdout().flush().ok();
        }
    });

    let result = tokio::select! {
        result = run_plan(plan, encoder, &progress_tx, cancel) => result,
        () = interrupted(cancel) => Err(RenderError::Cancelled {
            step_index: progress_tx.borrow().completed_steps,
        }),
    };

    // An abandoned run never reached its own cleanup.
    if cancel.load(Ordering::SeqCst) && matches!(result, Err(RenderError::Cancelled { .. })) {
        for segment in plan.segments() {
            if let Err(e) = encoder.release(segment).await {
                tracing::debug!(%segment, error = %e, "segment not released");
            }
        }
    }

    drop(progress_tx);
    printer.await.ok();
    result
}

/// Resolves on the second Ctrl-C; the first only sets `cancel`. Never
/// resolves if the signal handler cannot be installed.
async fn interrupted(cancel: &AtomicBool) {
    if tokio::signal::ctrl_c().await.is_err() {
        return std::future::pending().await;
    }
    cancel.store(true, Ordering::SeqCst);
    eprintln!("\nStopping after the current step; press Ctrl-C again to abort it");
    if tokio::signal::ctrl_c().await.is_err() {
        return std::future::pending().await;
    }
    tracing::warn!("render abandoned mid-step");
}
