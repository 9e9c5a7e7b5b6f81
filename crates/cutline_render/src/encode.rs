//! Executes a [`RenderPlan`] against an [`Encoder`].
//!
//! Steps run strictly in order. Progress is published on a watch channel
//! after every step, and encoders may report finer progress within a step.
//! Every segment a started trim step may have written is released once the
//! run ends, whether it completed, failed, or was cancelled.

use crate::error::{RenderError, Result};
use crate::plan::{RenderPlan, RenderStep, SegmentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Progress of a plan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeProgress {
    pub completed_steps: usize,
    pub total_steps: usize,
    /// Overall completion in `[0, 1]`.
    pub fraction: f64,
}

impl EncodeProgress {
    /// Progress with `completed` whole steps done and `step_fraction` of the
    /// next one.
    pub fn at(completed: usize, total: usize, step_fraction: f64) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            ((completed as f64 + step_fraction.clamp(0.0, 1.0)) / total as f64).min(1.0)
        };
        Self {
            completed_steps: completed,
            total_steps: total,
            fraction,
        }
    }
}

/// Callback an encoder uses to report how far through the current step it
/// is, as a fraction in `[0, 1]`.
pub type StepProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// The transcoding backend. The engine decides what to run; the encoder
/// decides how.
#[async_trait]
pub trait Encoder: Send {
    /// Execute one step. A trim step produces its `output` segment; the
    /// concat step produces the final output.
    async fn run_step(
        &mut self,
        index: usize,
        step: &RenderStep,
        progress: StepProgress<'_>,
    ) -> anyhow::Result<()>;

    /// Free an intermediate segment. Called once for every trim step that
    /// was started, after the run has finished or aborted, even if that step
    /// failed and the segment may not exist.
    async fn release(&mut self, segment: SegmentId) -> anyhow::Result<()>;
}

/// Run every step of `plan` in order.
///
/// `cancel` is checked before each step; once set, no further steps start.
/// Release failures are logged and do not change the result.
pub async fn run_plan<E>(
    plan: &RenderPlan,
    encoder: &mut E,
    progress_tx: &watch::Sender<EncodeProgress>,
    cancel: &AtomicBool,
) -> Result<()>
where
    E: Encoder + ?Sized,
{
    let mut produced = Vec::new();
    let result = run_steps(plan, encoder, progress_tx, cancel, &mut produced).await;

    for segment in produced {
        if let Err(e) = encoder.release(segment).await {
            tracing::warn!(%segment, error = %e, "failed to release segment");
        }
    }

    match &result {
        Ok(()) => tracing::info!(steps = plan.step_count(), "render complete"),
        Err(e) => tracing::warn!(error = %e, "render aborted"),
    }
    result
}

async fn run_steps<E>(
    plan: &RenderPlan,
    encoder: &mut E,
    progress_tx: &watch::Sender<EncodeProgress>,
    cancel: &AtomicBool,
    produced: &mut Vec<SegmentId>,
) -> Result<()>
where
    E: Encoder + ?Sized,
{
    let total = plan.step_count();
    progress_tx.send_replace(EncodeProgress::at(0, total, 0.0));

    for (index, step) in plan.steps.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            return Err(RenderError::Cancelled { step_index: index });
        }

        tracing::debug!(step = index, total, "running render step");
        // A failing step may still leave a partial segment behind.
        if let RenderStep::Trim(trim) = step {
            produced.push(trim.output);
        }
        let report = |f: f64| {
            progress_tx.send_replace(EncodeProgress::at(index, total, f));
        };
        encoder
            .run_step(index, step, &report)
            .await
            .map_err(|e| RenderError::EncodeFailed {
                step_index: index,
                reason: format!("{e:#}"),
            })?;

        progress_tx.send_replace(EncodeProgress::at(index + 1, total, 0.0));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
