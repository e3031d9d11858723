//! Integration tests for audio pre-generation through the orchestrator.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{FOUR_SENTENCES, Harness, ScriptedBackend, dictation};
use dictee_core::{ExamError, ExamEvent, pregeneration_segments};
use dictee_exam::PregenerationStatus;

#[tokio::test(start_paused = true)]
async fn skip_after_two_segments_unlocks_start() {
    let mut h = Harness::new(ScriptedBackend::new()).await;
    h.exam.select_dictation(dictation(FOUR_SENTENCES));

    let blocked_during_first = Arc::new(AtomicBool::new(false));
    {
        let exam = h.exam.clone();
        let blocked = Arc::clone(&blocked_during_first);
        h.backend.on_call(move |call| match call {
            1 => {
                blocked.store(!exam.can_start(), Ordering::SeqCst);
                assert_eq!(
                    exam.start().err(),
                    Some(ExamError::PregenerationInProgress)
                );
            }
            2 => assert!(exam.skip_pregeneration()),
            _ => {}
        });
    }

    let progress = h.exam.pregenerate().await.unwrap();

    assert!(blocked_during_first.load(Ordering::SeqCst));
    assert_eq!(progress.total, 8);
    assert_eq!(progress.completed, 2);
    assert_eq!(progress.failed, 0);
    assert_eq!(progress.status, PregenerationStatus::Skipped);
    assert_eq!(h.backend.requests().len(), 2);
    assert!(h.exam.can_start());

    let events = h.drain();
    assert!(events.contains(&ExamEvent::PregenerationProgress {
        completed: 2,
        total: 8
    }));
    assert_eq!(
        events.last(),
        Some(&ExamEvent::PregenerationFinished {
            completed: 2,
            failed: 0,
            total: 8,
            skipped: true,
        })
    );

    let run = h.exam.start().unwrap();
    assert!(run.is_some());
}

#[tokio::test(start_paused = true)]
async fn full_pass_warms_every_segment_the_run_needs() {
    let mut h = Harness::new(ScriptedBackend::new()).await;
    let text = dictation(FOUR_SENTENCES);
    let segments = pregeneration_segments(&text);
    h.exam.select_dictation(text);

    let progress = h.exam.pregenerate().await.unwrap();
    assert_eq!(progress.status, PregenerationStatus::Completed);
    assert_eq!(progress.completed, segments.len());
    assert!(!h.exam.skip_pregeneration());

    let narration = Arc::clone(h.exam.narration());
    let speed = h.exam.settings().generation_speed;
    for segment in &segments {
        assert!(narration.is_cached(segment, speed), "{segment} not warmed");
    }

    // The run itself never goes back to the backend.
    let before = narration.stats().backend_calls;
    let run = h.exam.start().unwrap().expect("run started");
    assert_eq!(run.settled().await, dictee_exam::RunOutcome::Finished);
    assert_eq!(narration.stats().backend_calls, before);
    assert!(
        h.drain()
            .iter()
            .any(|event| matches!(event, ExamEvent::Finished { .. }))
    );
}

#[tokio::test]
async fn failed_segments_do_not_block_start() {
    let h = Harness::new(ScriptedBackend::failing()).await;
    h.exam.select_dictation(dictation(FOUR_SENTENCES));

    let progress = h.exam.pregenerate().await.unwrap();
    assert_eq!(progress.completed, 8);
    assert_eq!(progress.failed, 8);
    assert_eq!(progress.status, PregenerationStatus::Completed);
    assert!(h.exam.can_start());
}

#[tokio::test]
async fn pregeneration_needs_a_text() {
    let h = Harness::new(ScriptedBackend::new()).await;
    assert_eq!(
        h.exam.pregenerate().await.err(),
        Some(ExamError::NoDictationSelected)
    );
    assert!(!h.exam.skip_pregeneration());
}

#[tokio::test]
async fn offline_backend_is_never_asked_to_pregenerate() {
    let h = Harness::new(ScriptedBackend::offline()).await;
    h.exam.select_dictation(dictation(FOUR_SENTENCES));

    assert_eq!(
        h.exam.pregenerate().await.err(),
        Some(ExamError::NarrationOffline)
    );
    assert!(h.backend.requests().is_empty());
    assert!(h.exam.snapshot().pregeneration.is_none());
}

#[tokio::test(start_paused = true)]
async fn new_text_cancels_pregeneration() {
    let h = Harness::new(ScriptedBackend::new()).await;
    h.exam.select_dictation(dictation(FOUR_SENTENCES));
    {
        let exam = h.exam.clone();
        h.backend.on_call(move |call| {
            if call == 3 {
                exam.select_dictation(dictation("Un autre texte."));
            }
        });
    }

    let progress = h.exam.pregenerate().await.unwrap();
    assert_eq!(progress.status, PregenerationStatus::Cancelled);
    assert!(progress.completed < 8);
    assert!(h.exam.snapshot().pregeneration.is_none());
    assert!(h.exam.can_start());
}
