//! Provisioning of a development box.
//!
//! ## Module structure
//! - `types` - Core types (Step, StepAction, StepOutcome, ProvisionReport)
//! - `plan` - The ordered install checklist built from config
//! - `runner` - CommandRunner trait with shell and dry-run implementations
//! - `provisioner` - Provisioner that walks the checklist
//! - `summary` - Installed version probes

pub mod plan;
mod provisioner;
mod runner;
pub mod summary;
mod types;

pub use provisioner::Provisioner;
pub use runner::{describe, CommandRunner, DryRunRunner, ShellRunner};
pub use types::{FailurePolicy, ProvisionReport, Step, StepAction, StepOutcome};
