//! Command execution seam.
//!
//! `ShellRunner` does the real work; `DryRunRunner` only describes it. Tests
//! plug in their own recorder.

use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use async_trait::async_trait;
use console::style;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::Result;
use crate::steplog::StepLog;

use super::types::StepAction;

/// Executes step actions and version probes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one action and return its exit code. `Err` is reserved for
    /// failures to run at all (spawn or I/O errors).
    async fn execute(&self, action: &StepAction, log: &StepLog) -> Result<i32>;

    /// Run a short script and return trimmed stdout if it exited zero.
    async fn probe(&self, script: &str, env: &BTreeMap<String, String>) -> Option<String>;
}

/// Runs shell steps with `bash -c`, capturing output into the log.
#[derive(Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn execute(&self, action: &StepAction, log: &StepLog) -> Result<i32> {
        match action {
            StepAction::Shell { script, env } => {
                log.line(&format!("[CMD] {}", script)).await?;
                tracing::debug!("Running: {}", script);

                let output = Command::new("bash")
                    .arg("-c")
                    .arg(format!("set -o pipefail\n{}", script))
                    .envs(env)
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .context("Failed to start bash")?;

                log.block("OUTPUT", &String::from_utf8_lossy(&output.stdout))
                    .await?;
                log.block("STDERR", &String::from_utf8_lossy(&output.stderr))
                    .await?;

                let code = exit_code(output.status);
                if code != 0 {
                    log.line(&format!("[EXIT] {}", code)).await?;
                }
                Ok(code)
            }
            StepAction::AppendFile { path, lines } => {
                log.line(&format!("[APPEND] {}", path.display())).await?;

                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .with_context(|| format!("Cannot create {}", parent.display()))?;
                    }
                }

                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await
                    .with_context(|| format!("Cannot open {} for appending", path.display()))?;

                let mut text = String::from("\n");
                for line in lines {
                    text.push_str(line);
                    text.push('\n');
                }
                file.write_all(text.as_bytes()).await?;
                file.flush().await?;
                Ok(0)
            }
        }
    }

    async fn probe(&self, script: &str, env: &BTreeMap<String, String>) -> Option<String> {
        let output = Command::new("bash")
            .arg("-c")
            .arg(script)
            .envs(env)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!stdout.is_empty()).then_some(stdout)
    }
}

/// Prints what would run and reports success for everything.
#[derive(Debug, Default)]
pub struct DryRunRunner;

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn execute(&self, action: &StepAction, log: &StepLog) -> Result<i32> {
        let description = describe(action);
        log.line(&format!("[DRY-RUN] {}", description)).await?;
        println!("    {} {}", style("$").dim(), style(description).dim());
        Ok(0)
    }

    async fn probe(&self, _script: &str, _env: &BTreeMap<String, String>) -> Option<String> {
        None
    }
}

/// One-line human description of an action.
pub fn describe(action: &StepAction) -> String {
    match action {
        StepAction::Shell { script, .. } => script.clone(),
        StepAction::AppendFile { path, lines } => {
            format!("append {} line(s) to {}", lines.len(), path.display())
        }
    }
}

/// Exit code as a shell would report it: 128+N when killed by signal N.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> StepAction {
        StepAction::Shell {
            script: script.to_string(),
            env: BTreeMap::from([("GREETING".to_string(), "hello".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_shell_success_captures_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = StepLog::open(temp_dir.path().join("run.log")).await.unwrap();

        let code = ShellRunner
            .execute(&shell("echo \"$GREETING world\""), &log)
            .await
            .unwrap();
        assert_eq!(code, 0);

        let content = std::fs::read_to_string(log.path().unwrap()).unwrap();
        assert!(content.contains("[CMD] echo \"$GREETING world\""));
        assert!(content.contains("[OUTPUT] hello world"));
        assert!(!content.contains("[EXIT]"));
    }

    #[tokio::test]
    async fn test_shell_failure_returns_exit_code() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = StepLog::open(temp_dir.path().join("run.log")).await.unwrap();

        let code = ShellRunner
            .execute(&shell("echo broken >&2; exit 42"), &log)
            .await
            .unwrap();
        assert_eq!(code, 42);

        let content = std::fs::read_to_string(log.path().unwrap()).unwrap();
        assert!(content.contains("[STDERR] broken"));
        assert!(content.contains("[EXIT] 42"));
    }

    #[tokio::test]
    async fn test_shell_pipe_failure_is_not_masked() {
        let code = ShellRunner
            .execute(&shell("false | cat"), &StepLog::disabled())
            .await
            .unwrap();
        assert_ne!(code, 0);
    }

    #[tokio::test]
    async fn test_append_file_appends_each_time() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("etc").join("bash.bashrc");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# existing\n").unwrap();

        let action = StepAction::AppendFile {
            path: path.clone(),
            lines: vec!["export NVM_DIR=\"/usr/local/nvm\"".to_string()],
        };

        assert_eq!(ShellRunner.execute(&action, &StepLog::disabled()).await.unwrap(), 0);
        assert_eq!(ShellRunner.execute(&action, &StepLog::disabled()).await.unwrap(), 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# existing\n"));
        assert_eq!(content.matches("export NVM_DIR").count(), 2);
    }

    #[tokio::test]
    async fn test_append_file_error_names_the_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("etc");
        std::fs::write(&blocker, "").unwrap();

        let action = StepAction::AppendFile {
            path: blocker.join("bash.bashrc"),
            lines: vec!["export NVM_DIR=/usr/local/nvm".to_string()],
        };
        let err = ShellRunner
            .execute(&action, &StepLog::disabled())
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::DevstrapError::Other(_)));
        assert!(err
            .to_string()
            .starts_with(&format!("Cannot create {}", blocker.display())));
    }

    #[tokio::test]
    async fn test_probe() {
        let env = BTreeMap::new();
        assert_eq!(
            ShellRunner.probe("echo ' v20.11.1 '", &env).await,
            Some("v20.11.1".to_string())
        );
        assert_eq!(ShellRunner.probe("exit 3", &env).await, None);
        assert_eq!(ShellRunner.probe("true", &env).await, None);
    }

    #[tokio::test]
    async fn test_dry_run_never_executes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let marker = temp_dir.path().join("marker");
        let action = shell(&format!("touch {}", marker.display()));

        let code = DryRunRunner.execute(&action, &StepLog::disabled()).await.unwrap();
        assert_eq!(code, 0);
        assert!(!marker.exists());
        assert_eq!(DryRunRunner.probe("echo hi", &BTreeMap::new()).await, None);
    }

    #[test]
    fn test_describe_append() {
        let action = StepAction::AppendFile {
            path: "/etc/bash.bashrc".into(),
            lines: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(describe(&action), "append 2 line(s) to /etc/bash.bashrc");
    }
}
