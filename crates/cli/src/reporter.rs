//! Console rendering of provisioning steps.

use std::error::Error;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use console::style;
use events::RunOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use orchestrator::{reporter::error_chain, Step, StepReporter};

const SPINNER_TEMPLATE: &str = "{spinner:.cyan} {msg} {elapsed:.dim}";

struct ActiveStep {
    title: String,
    started: Instant,
    spinner: Option<ProgressBar>,
}

/// Shows one spinner per step, or plain lines when running in CI.
pub struct ConsoleStepReporter {
    ci: bool,
    active: Mutex<Option<ActiveStep>>,
}

impl ConsoleStepReporter {
    pub fn new(ci: bool) -> Self {
        Self {
            ci,
            active: Mutex::new(None),
        }
    }

    fn take_active(&self) -> Option<ActiveStep> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn spinner(&self, message: String) -> Option<ProgressBar> {
        if self.ci {
            return None;
        }
        let style = ProgressStyle::with_template(SPINNER_TEMPLATE).ok()?;
        let spinner = ProgressBar::new_spinner().with_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

impl StepReporter for ConsoleStepReporter {
    fn begin_step(&self, step: &Step) {
        let message = format!(
            "{} {}",
            style(&step.title).bold(),
            style(format!("(~{} min)", step.estimated_minutes)).dim()
        );
        let spinner = self.spinner(message.clone());
        if spinner.is_none() {
            println!("==> {}", message);
        }

        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveStep {
            title: step.title.clone(),
            started: Instant::now(),
            spinner,
        });
    }

    fn complete_step(&self) {
        let Some(active) = self.take_active() else {
            return;
        };
        let line = format!(
            "{} {} {}",
            style("✔").green(),
            active.title,
            style(format_elapsed(active.started.elapsed())).dim()
        );
        match active.spinner {
            Some(spinner) => spinner.finish_with_message(line),
            None => println!("{}", line),
        }
    }

    fn fail_step(&self, error: &(dyn Error + 'static)) {
        let Some(active) = self.take_active() else {
            return;
        };
        let line = format!(
            "{} {}: {}",
            style("✘").red(),
            active.title,
            style(error_chain(error)).red()
        );
        match active.spinner {
            Some(spinner) => spinner.abandon_with_message(line),
            None => println!("{}", line),
        }
    }

    fn finish_run(&self, outcome: &RunOutcome) {
        let summary = match outcome {
            RunOutcome::Completed => style("Platform provisioned".to_string()).green().bold(),
            RunOutcome::Halted { phase } => {
                style(format!("Halted after {} as requested", phase)).yellow().bold()
            }
            RunOutcome::Failed { phase: Some(phase) } => {
                style(format!("Provisioning failed in {}", phase)).red().bold()
            }
            RunOutcome::Failed { phase: None } => {
                style("Configuration rejected".to_string()).red().bold()
            }
            RunOutcome::Cancelled { .. } => style("Provisioning cancelled".to_string()).yellow(),
        };
        println!();
        println!("{}", summary);
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}
