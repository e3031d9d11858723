//! Run command handler: a full exam driven from the terminal.
//!
//! Events are printed as they arrive; stdin lines are mapped to
//! [`Control`]s. Audio preparation runs first (unless `--no-pregen`) and
//! can be skipped with `s`.

use anyhow::Result;
use dictee_core::{ExamError, ExamEvent, ExamSettings};
use dictee_exam::ExamOrchestrator;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::bootstrap::CliContext;
use crate::controls::{Control, HELP};
use crate::error::CliError;
use crate::presentation::describe_event;

#[derive(Debug, Clone, Copy)]
pub struct RunArgs {
    pub id: u32,
    pub speed: Option<f32>,
    pub silent: bool,
    pub no_pregen: bool,
}

/// Terminal input, closed once stdin reaches EOF.
struct Input {
    lines: Lines<BufReader<Stdin>>,
    open: bool,
}

impl Input {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            open: true,
        }
    }

    /// Next control, or `None` for blank/unknown lines. Pends forever once
    /// stdin is closed.
    async fn next(&mut self) -> Option<Control> {
        if !self.open {
            return std::future::pending().await;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => {
                let control = Control::parse(&line);
                if control.is_none() && !line.trim().is_empty() {
                    println!("Unknown key '{}', h for help", line.trim());
                }
                control
            }
            Ok(None) | Err(_) => {
                debug!("stdin closed, controls disabled");
                self.open = false;
                None
            }
        }
    }
}

/// How an event loop stage ended.
enum Stage {
    Continue,
    Quit,
}

pub async fn execute(ctx: &CliContext, args: RunArgs) -> Result<()> {
    let dictation = ctx.dictation(args.id)?.clone();
    let mut settings = ExamSettings::default();
    if let Some(speed) = args.speed {
        settings = settings.with_dictation_speed(speed);
    }

    let (exam, mut events) = ctx.orchestrator(settings, args.silent)?;
    if !exam.check_narration().await {
        return Err(CliError::Offline(ctx.backend_url().to_string()).into());
    }
    exam.select_dictation(dictation);
    println!("{HELP}\n");

    let mut input = Input::new();
    if !args.no_pregen {
        if let Stage::Quit = prepare(&exam, &mut events, &mut input).await {
            exam.go_home();
            return Ok(());
        }
    }

    let Some(_run) = exam.start()? else {
        return Err(ExamError::ExamInProgress.into());
    };
    drive(&exam, &mut events, &mut input).await
}

/// Pre-generate the narration, until done or skipped.
async fn prepare(
    exam: &ExamOrchestrator,
    events: &mut mpsc::UnboundedReceiver<ExamEvent>,
    input: &mut Input,
) -> Stage {
    let mut pregen = tokio::spawn({
        let exam = exam.clone();
        async move { exam.pregenerate().await }
    });

    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => {
                show(&event);
                if matches!(event, ExamEvent::PregenerationFinished { .. }) {
                    return Stage::Continue;
                }
            }
            control = input.next() => match control {
                Some(Control::SkipPregeneration) => {
                    if exam.skip_pregeneration() {
                        // Start is allowed right away; the segment in flight
                        // finishes in the background.
                        return Stage::Continue;
                    }
                }
                Some(Control::Quit) => return Stage::Quit,
                Some(Control::Help) => println!("{HELP}"),
                Some(_) => println!("The exam has not started yet (s to skip preparation)"),
                None => {}
            },
            result = &mut pregen => {
                match result {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => warn!(error = %err, "Audio preparation refused"),
                    Err(err) => warn!(error = %err, "Audio preparation task failed"),
                }
                return Stage::Continue;
            }
        }
    }
}

/// Show events and apply controls until the exam ends.
async fn drive(
    exam: &ExamOrchestrator,
    events: &mut mpsc::UnboundedReceiver<ExamEvent>,
    input: &mut Input,
) -> Result<()> {
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { return Ok(()) };
                show(&event);
                match event {
                    ExamEvent::Finished { .. } => {
                        println!("Write your transcript to a file and mark it with 'dictee score'.");
                        return Ok(());
                    }
                    ExamEvent::RunFailed { message } => anyhow::bail!(message),
                    _ => {}
                }
            }
            control = input.next() => {
                let Some(control) = control else { continue };
                if control == Control::Help {
                    println!("{HELP}");
                } else if !control.apply(exam) {
                    println!("Not available right now");
                } else if control == Control::Quit {
                    println!("Exam abandoned.");
                    return Ok(());
                }
            }
        }
    }
}

fn show(event: &ExamEvent) {
    if let Some(line) = describe_event(event) {
        println!("{line}");
    }
}
