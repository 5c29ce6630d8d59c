use std::path::Path;

use console::style;

use crate::cli::RunArgs;
use crate::config::ProvisionConfig;
use crate::error::{DevstrapError, Result};
use crate::preflight;
use crate::provision::{
    plan, summary, CommandRunner, DryRunRunner, FailurePolicy, ProvisionReport, Provisioner,
    ShellRunner, Step, StepOutcome,
};
use crate::steplog::StepLog;
use crate::utils::format_duration;

pub async fn execute(config_path: Option<&Path>, args: RunArgs) -> Result<()> {
    let config = ProvisionConfig::load(config_path)?;

    if args.dry_run || args.skip_preflight {
        tracing::debug!("Skipping preflight checks");
    } else {
        preflight::verify()?;
    }

    let steps = plan::build(&config);

    // A dry run only touches a log when one is asked for explicitly.
    let log = match (&args.log_file, args.dry_run) {
        (Some(path), _) => StepLog::open(path).await?,
        (None, true) => StepLog::disabled(),
        (None, false) => StepLog::open(config.log_path()).await?,
    };

    println!();
    println!(
        "{} {}",
        style("devstrap").cyan().bold(),
        if args.dry_run {
            style("dry run").yellow().to_string()
        } else {
            style(format!("{} steps", steps.len())).dim().to_string()
        }
    );
    if let Some(path) = log.path() {
        println!("  {} {}", style("Log:").dim(), style(path.display()).dim());
    }
    println!();

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunRunner)
    } else {
        Box::new(ShellRunner)
    };

    run_with(runner.as_ref(), &config, &steps, &log, &args).await
}

/// Walk `steps` with `runner`, write the report and print the outcome.
/// A failed step comes back as `StepFailed` carrying its exit code.
async fn run_with(
    runner: &dyn CommandRunner,
    config: &ProvisionConfig,
    steps: &[Step],
    log: &StepLog,
    args: &RunArgs,
) -> Result<()> {
    let policy = if args.keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    };

    let report = Provisioner::new(runner, log.clone())
        .policy(policy)
        .show_progress(!args.dry_run)
        .dry_run(args.dry_run)
        .run(steps)
        .await?;

    if let Some(path) = &args.report {
        write_report(&report, path)?;
        tracing::info!("Report written to {}", path.display());
    }

    print_outcome(&report, log);

    if report.succeeded() && !args.dry_run && !args.no_summary {
        let versions = summary::collect(runner, config).await;
        summary::print(&versions);
    }

    match report.first_failure() {
        Some((step, _)) => Err(DevstrapError::StepFailed {
            step: step.id.clone(),
            code: report.exit_code(),
        }),
        None => Ok(()),
    }
}

fn write_report(report: &ProvisionReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_outcome(report: &ProvisionReport, log: &StepLog) {
    let elapsed = report
        .completed_at
        .map(|end| (end - report.started_at).num_seconds())
        .unwrap_or(0);

    println!();

    if report.succeeded() {
        println!(
            "  {} {} in {}",
            style("✓").green().bold(),
            if report.dry_run {
                "Dry run finished"
            } else {
                "Provisioning completed"
            },
            style(format_duration(elapsed)).white()
        );
        return;
    }

    for record in &report.steps {
        let (symbol, detail) = match &record.outcome {
            StepOutcome::Done => (style("✓").green(), String::new()),
            StepOutcome::Failed { code } => (style("✕").red(), format!("exit code {}", code)),
            StepOutcome::Skipped => (style("-").dim(), "skipped".to_string()),
            StepOutcome::Pending => (style("○").dim(), String::new()),
        };
        println!("  {} {} {}", symbol, record.title, style(detail).dim());
    }

    println!();
    println!(
        "  {} done, {} failed, {} skipped",
        report.count(&StepOutcome::Done),
        report.steps.len()
            - report.count(&StepOutcome::Done)
            - report.count(&StepOutcome::Skipped)
            - report.count(&StepOutcome::Pending),
        report.count(&StepOutcome::Skipped)
    );
    if let Some(path) = log.path() {
        println!("  {} {}", style("Details in").dim(), style(path.display()).white());
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use async_trait::async_trait;

    use super::*;
    use crate::provision::StepAction;

    /// Fails every shell step whose script matches `script`.
    struct FailingRunner {
        script: &'static str,
        code: i32,
    }

    #[async_trait]
    impl CommandRunner for FailingRunner {
        async fn execute(&self, action: &StepAction, _log: &StepLog) -> Result<i32> {
            match action {
                StepAction::Shell { script, .. } if script == self.script => Ok(self.code),
                _ => Ok(0),
            }
        }

        async fn probe(&self, _script: &str, _env: &BTreeMap<String, String>) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_failed_step_exit_code_is_returned() {
        let temp_dir = tempfile::tempdir().unwrap();
        let report_path = temp_dir.path().join("report.json");
        let config = ProvisionConfig::default();
        let steps = plan::build(&config);
        let runner = FailingRunner {
            script: "apt-get update",
            code: 100,
        };
        let args = RunArgs {
            report: Some(report_path.clone()),
            ..Default::default()
        };

        let err = run_with(&runner, &config, &steps, &StepLog::disabled(), &args)
            .await
            .unwrap_err();

        match &err {
            DevstrapError::StepFailed { step, code } => {
                assert_eq!(step, "apt-update");
                assert_eq!(*code, 100);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.exit_code(), 100);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["steps"][1]["status"], "failed");
        assert_eq!(report["steps"][1]["code"], 100);
        assert_eq!(report["steps"][2]["status"], "skipped");
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let profile = temp_dir.path().join("bash.bashrc");
        let config_path = temp_dir.path().join("config.yaml");
        let report_path = temp_dir.path().join("report.json");
        let log_path = temp_dir.path().join("devstrap.log");

        let config = ProvisionConfig {
            profile_path: profile.display().to_string(),
            ..Default::default()
        };
        config.save(&config_path).unwrap();

        let args = RunArgs {
            dry_run: true,
            report: Some(report_path.clone()),
            log_file: Some(log_path.clone()),
            ..Default::default()
        };
        execute(Some(config_path.as_path()), args).await.unwrap();

        assert!(!profile.exists());

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(report["dry_run"], true);
        assert_eq!(report["steps"].as_array().unwrap().len(), 10);
        assert_eq!(report["steps"][0]["id"], "timezone");
        assert_eq!(report["steps"][0]["status"], "done");

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("] Step 10/10: Installing Composer"));
        assert!(log.contains("[DRY-RUN] apt-get update"));
    }

    #[tokio::test]
    async fn test_missing_config_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        let args = RunArgs {
            dry_run: true,
            ..Default::default()
        };
        let err = execute(Some(missing.as_path()), args).await.unwrap_err();
        assert!(matches!(err, DevstrapError::Config(_)));
    }
}
