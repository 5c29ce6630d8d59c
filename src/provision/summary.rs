//! Post-run version summary.

use console::style;
use serde::Serialize;

use crate::config::ProvisionConfig;

use super::plan::{step_env, with_nvm};
use super::runner::CommandRunner;

/// A command that prints a tool's version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionProbe {
    pub name: &'static str,
    pub script: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstalledVersion {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Probes for everything the plan installs.
pub fn probes(config: &ProvisionConfig) -> Vec<VersionProbe> {
    let mut probes = vec![
        VersionProbe {
            name: "git",
            script: "git --version".to_string(),
        },
        VersionProbe {
            name: "vim",
            script: "vim --version | head -n1".to_string(),
        },
        VersionProbe {
            name: "nvm",
            script: with_nvm("nvm --version"),
        },
        VersionProbe {
            name: "node",
            script: with_nvm("node --version"),
        },
        VersionProbe {
            name: "npm",
            script: with_nvm("npm --version"),
        },
    ];

    if config.yarn {
        probes.push(VersionProbe {
            name: "yarn",
            script: with_nvm("yarn --version"),
        });
    }

    probes.push(VersionProbe {
        name: "php",
        script: "php --version | head -n1".to_string(),
    });

    if config.composer {
        probes.push(VersionProbe {
            name: "composer",
            script: "composer --version 2>/dev/null | head -n1".to_string(),
        });
    }

    probes
}

/// Run every probe. A missing tool yields `version: None`, never an error.
pub async fn collect(runner: &dyn CommandRunner, config: &ProvisionConfig) -> Vec<InstalledVersion> {
    let env = step_env(config);
    let mut versions = Vec::new();

    for probe in probes(config) {
        let version = runner.probe(&probe.script, &env).await;
        if version.is_none() {
            tracing::debug!("Version probe for {} returned nothing", probe.name);
        }
        versions.push(InstalledVersion {
            name: probe.name.to_string(),
            version,
        });
    }

    versions
}

/// Print the installed versions as an aligned list.
pub fn print(versions: &[InstalledVersion]) {
    println!();
    println!("{}", style("Installed versions").cyan().bold());
    println!();

    let width = versions.iter().map(|v| v.name.len()).max().unwrap_or(0);
    for v in versions {
        match &v.version {
            Some(version) => println!(
                "  {} {:<width$}  {}",
                style("✓").green(),
                v.name,
                style(version).white(),
                width = width
            ),
            None => println!(
                "  {} {:<width$}  {}",
                style("✕").red(),
                v.name,
                style("not found").dim(),
                width = width
            ),
        }
    }
    println!();
}
