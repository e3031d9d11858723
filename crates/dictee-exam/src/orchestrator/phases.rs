//! The narrated phases, as sequences of scope steps.

use std::sync::Arc;

use dictee_core::{ExamError, ExamEvent, ExamPhase, ReadingPass};
use tracing::{debug, error, info};

use super::context::RunMaterial;
use super::scope::RunScope;
use super::{RunOutcome, Shared};
use crate::playback::StopMode;

/// Run every narrated phase from `from` onwards, then finish the exam.
pub(crate) async fn drive(scope: RunScope, from: ExamPhase) -> RunOutcome {
    let token = scope.token();
    match run_phases(&scope, from).await {
        Ok(()) => finish(scope.shared(), token),
        Err(ExamError::Aborted) => {
            debug!(token, "Run superseded");
            RunOutcome::Superseded
        }
        Err(err) => {
            if fail(scope.shared(), token, &err) {
                error!(token, error = %err, "Exam run failed");
                RunOutcome::Failed(err)
            } else {
                debug!(token, error = %err, "Superseded run failed late");
                RunOutcome::Superseded
            }
        }
    }
}

async fn run_phases(scope: &RunScope, from: ExamPhase) -> Result<(), ExamError> {
    let material = scope.material()?;
    for phase in from.narrated_from() {
        scope.enter_phase(phase)?;
        match phase {
            ExamPhase::Lecture1 => lecture1(scope, &material).await?,
            ExamPhase::Dictee => dictee(scope, &material).await?,
            ExamPhase::Relecture => relecture(scope, &material).await?,
            ExamPhase::Idle | ExamPhase::Finished => {}
        }
    }
    scope.ensure_current()
}

// ── Phase 1: full reading ──────────────────────────────────────────────

async fn lecture1(scope: &RunScope, material: &RunMaterial) -> Result<(), ExamError> {
    let timings = scope.settings().timings;

    scope.begin_intro()?;
    let intro = announce_intro(scope, &material.announcements.lecture1).await;
    let skipped = scope.end_intro()?;
    intro?;
    if !skipped {
        scope.pause_for(timings.intro_settle()).await?;
    }

    scope.wait_for_resume().await?;
    scope
        .speak(&material.dictation.text, scope.settings().dictation_speed)
        .await?;
    scope.pause_for(timings.after_full_reading()).await
}

/// The announcement can be cut short; a skip that lands while it is still
/// being narrated means it is never played at all.
async fn announce_intro(scope: &RunScope, text: &str) -> Result<(), ExamError> {
    let audio = scope.narrate(text).await?;
    if scope.intro_skipped()? {
        return Ok(());
    }
    scope.play(&audio, scope.settings().announcement_rate).await
}

// ── Phase 2: sentence by sentence ──────────────────────────────────────

async fn dictee(scope: &RunScope, material: &RunMaterial) -> Result<(), ExamError> {
    let timings = scope.settings().timings;

    scope
        .speak(&material.announcements.dictee, scope.settings().announcement_rate)
        .await?;
    scope.pause_for(timings.dictee_lead_in()).await?;

    let total = material.sentences.len();
    for (index, (sentence, spoken)) in material
        .sentences
        .iter()
        .zip(&material.spoken)
        .enumerate()
    {
        for pass in [ReadingPass::First, ReadingPass::Second] {
            scope.wait_for_resume().await?;
            scope.begin_reading(index, total, pass, sentence)?;
            scope.speak(spoken, scope.settings().dictation_speed).await?;
            let gap = match pass {
                ReadingPass::First => timings.between_passes(),
                ReadingPass::Second => timings.after_second_pass(),
            };
            scope.pause_for(gap).await?;
        }
    }

    scope.end_readings()?;
    scope.pause_for(timings.dictee_tail()).await
}

// ── Phase 3: proofreading ──────────────────────────────────────────────

async fn relecture(scope: &RunScope, material: &RunMaterial) -> Result<(), ExamError> {
    let timings = scope.settings().timings;

    scope
        .speak(
            &material.announcements.relecture,
            scope.settings().announcement_rate,
        )
        .await?;
    scope.pause_for(timings.relecture_lead_in()).await?;
    scope.wait_for_resume().await?;
    scope
        .speak(&material.dictation.text, scope.settings().dictation_speed)
        .await?;
    scope.pause_for(timings.relecture_tail()).await
}

// ── Terminal transitions ───────────────────────────────────────────────

fn finish(shared: &Arc<Shared>, token: u64) -> RunOutcome {
    let mut ctx = shared.lock();
    if ctx.run_token != token {
        return RunOutcome::Superseded;
    }
    ctx.phase = ExamPhase::Finished;
    ctx.exam_in_progress = false;
    ctx.skip_in_progress = false;
    ctx.paused = false;
    ctx.intro_active = false;
    ctx.clear_reading();
    ctx.stop_ticker();
    let elapsed = ctx.elapsed().unwrap_or_default();
    shared.playback.stop(StopMode::Complete);
    shared.emit(ExamEvent::PhaseChanged {
        phase: ExamPhase::Finished,
    });
    shared.emit(ExamEvent::Finished { elapsed });
    drop(ctx);

    info!(token, elapsed_secs = elapsed.as_secs(), "Exam finished");
    RunOutcome::Finished
}

/// The run halts where it failed. The phase is kept so the caller can see
/// where; a reset is needed before the next start.
///
/// Returns `false`, leaving everything untouched, when the run was already
/// superseded.
fn fail(shared: &Arc<Shared>, token: u64, err: &ExamError) -> bool {
    let mut ctx = shared.lock();
    if ctx.run_token != token {
        return false;
    }
    ctx.exam_in_progress = false;
    ctx.skip_in_progress = false;
    ctx.intro_active = false;
    ctx.stop_ticker();
    ctx.cancel.cancel();
    shared.emit(ExamEvent::RunFailed {
        message: err.to_string(),
    });
    true
}
