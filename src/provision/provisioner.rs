//! Provisioner - walks the checklist one step at a time.

use console::style;

use crate::error::Result;
use crate::progress::Progress;
use crate::steplog::StepLog;

use super::runner::CommandRunner;
use super::types::{FailurePolicy, ProvisionReport, Step, StepOutcome};

/// Runs steps strictly in order, writing one log line per step and moving
/// the progress bar.
pub struct Provisioner<'a> {
    runner: &'a dyn CommandRunner,
    log: StepLog,
    policy: FailurePolicy,
    show_progress: bool,
    dry_run: bool,
}

impl<'a> Provisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, log: StepLog) -> Self {
        Self {
            runner,
            log,
            policy: FailurePolicy::default(),
            show_progress: false,
            dry_run: false,
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every step and report what happened.
    ///
    /// A non-zero exit is not an `Err`: it lands in the report as
    /// `StepOutcome::Failed`. Under `FailFast` the remaining steps are
    /// marked `Skipped` and never run. A step that cannot be started at all
    /// counts as failed with exit code 1. `Err` means the log could not be
    /// written.
    pub async fn run(&self, steps: &[Step]) -> Result<ProvisionReport> {
        let total = steps.len();
        let mut report = ProvisionReport::new(steps, self.dry_run);
        let mut progress = if self.show_progress {
            Progress::new(total)
        } else {
            Progress::hidden(total)
        };

        tracing::info!("Starting provisioning ({} steps)", total);
        self.log
            .line(&format!(
                "Provisioning started ({} steps{})",
                total,
                if self.dry_run { ", dry run" } else { "" }
            ))
            .await?;

        let mut halted = false;

        for (idx, step) in steps.iter().enumerate() {
            if halted {
                report.steps[idx].outcome = StepOutcome::Skipped;
                continue;
            }

            let current = progress.advance();
            self.log
                .line(&format!("Step {}/{}: {}", current, total, step.title))
                .await?;
            if self.dry_run {
                println!(
                    "  {} {}",
                    style(format!("[{}/{}]", current, total)).dim(),
                    style(&step.title).white()
                );
            } else {
                progress.draw(&step.title);
            }
            tracing::debug!("Step {} started", step.id);

            let code = match self.runner.execute(&step.action, &self.log).await {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!("Step {} could not run: {}", step.id, e);
                    self.log
                        .line(&format!("Step {} could not run: {}", step.id, e))
                        .await?;
                    1
                }
            };

            if code == 0 {
                report.steps[idx].outcome = StepOutcome::Done;
                tracing::debug!("Step {} done", step.id);
            } else {
                report.steps[idx].outcome = StepOutcome::Failed { code };
                self.log
                    .line(&format!("Step {} failed with exit code {}", step.id, code))
                    .await?;
                tracing::debug!("Step {} failed with exit code {}", step.id, code);

                if self.policy == FailurePolicy::FailFast {
                    halted = true;
                }
            }
        }

        progress.finish();
        report.completed_at = Some(chrono::Utc::now());

        match report.first_failure() {
            None => {
                self.log.line("Provisioning completed").await?;
                tracing::info!("Provisioning completed");
            }
            Some((step, code)) => {
                self.log
                    .line(&format!(
                        "Provisioning failed at step {} (exit code {})",
                        step.id, code
                    ))
                    .await?;
            }
        }

        Ok(report)
    }
}
