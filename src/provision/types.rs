//! Core types for a provisioning run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// What a step does when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Script run through `bash -c` with extra environment variables
    Shell {
        script: String,
        env: BTreeMap<String, String>,
    },
    /// Lines appended to a file, which is created if missing
    AppendFile { path: PathBuf, lines: Vec<String> },
}

/// A single entry of the install checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: &'static str,
    pub title: String,
    pub action: StepAction,
}

/// Result of a single step
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepOutcome {
    /// Not reached yet
    #[default]
    Pending,
    /// Command exited zero
    Done,
    /// Command exited non-zero
    Failed { code: i32 },
    /// Not run because an earlier step failed
    Skipped,
}

/// What to do after a step fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure; later steps are skipped
    #[default]
    FailFast,
    /// Record the failure and keep going
    KeepGoing,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StepRecord {
    pub id: String,
    pub title: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub steps: Vec<StepRecord>,
    pub dry_run: bool,
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ProvisionReport {
    pub fn new(steps: &[Step], dry_run: bool) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|s| StepRecord {
                    id: s.id.to_string(),
                    title: s.title.clone(),
                    outcome: StepOutcome::Pending,
                })
                .collect(),
            dry_run,
            started_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    pub fn first_failure(&self) -> Option<(&StepRecord, i32)> {
        self.steps.iter().find_map(|s| match s.outcome {
            StepOutcome::Failed { code } => Some((s, code)),
            _ => None,
        })
    }

    pub fn succeeded(&self) -> bool {
        self.first_failure().is_none()
    }

    /// Exit code of the first failed step, or 0.
    pub fn exit_code(&self) -> i32 {
        self.first_failure().map(|(_, code)| code).unwrap_or(0)
    }

    pub fn count(&self, outcome: &StepOutcome) -> usize {
        self.steps.iter().filter(|s| &s.outcome == outcome).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &'static str) -> Step {
        Step {
            id,
            title: id.to_string(),
            action: StepAction::Shell {
                script: "true".to_string(),
                env: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&StepOutcome::Done).unwrap(),
            r#"{"status":"done"}"#
        );
        assert_eq!(
            serde_json::to_string(&StepOutcome::Failed { code: 100 }).unwrap(),
            r#"{"status":"failed","code":100}"#
        );
    }

    #[test]
    fn test_record_flattens_outcome() {
        let record = StepRecord {
            id: "php".to_string(),
            title: "Installing PHP".to_string(),
            outcome: StepOutcome::Skipped,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "php");
        assert_eq!(json["status"], "skipped");
    }

    #[test]
    fn test_report_exit_code_is_first_failure() {
        let mut report = ProvisionReport::new(&[step("a"), step("b"), step("c")], false);
        assert!(report.succeeded());
        assert_eq!(report.exit_code(), 0);

        report.steps[0].outcome = StepOutcome::Done;
        report.steps[1].outcome = StepOutcome::Failed { code: 7 };
        report.steps[2].outcome = StepOutcome::Failed { code: 3 };

        assert!(!report.succeeded());
        assert_eq!(report.exit_code(), 7);
        assert_eq!(report.first_failure().map(|(s, _)| s.id.as_str()), Some("b"));
        assert_eq!(report.count(&StepOutcome::Done), 1);
    }
}
