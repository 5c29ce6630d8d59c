use std::path::PathBuf;

use console::style;
use dialoguer::{Confirm, Input};

use crate::config::{ProvisionConfig, SYSTEM_CONFIG_PATH};
use crate::error::{DevstrapError, Result};

use super::config::to_yaml;

pub async fn execute(path: Option<PathBuf>, defaults: bool, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(SYSTEM_CONFIG_PATH));

    if path.exists() && !force {
        if defaults {
            return Err(DevstrapError::Config(format!(
                "{} already exists. Pass --force to overwrite it.",
                path.display()
            )));
        }

        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("{}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    let config = if defaults {
        ProvisionConfig::default()
    } else {
        prompt()?
    };
    config.validate()?;

    if !defaults {
        println!();
        println!("{}", style(to_yaml(&config)?).dim());
    }

    config.save(&path)?;

    println!(
        "{} Wrote {}",
        style("✓").green().bold(),
        style(path.display()).cyan()
    );
    println!(
        "Run {} to provision this machine.",
        style("sudo devstrap run").cyan()
    );

    Ok(())
}

fn prompt() -> Result<ProvisionConfig> {
    println!("{}", style("devstrap setup").bold().cyan());
    println!("Press enter to keep a default.\n");

    let defaults = ProvisionConfig::default();

    let timezone: String = Input::new()
        .with_prompt("Timezone")
        .default(defaults.timezone.clone())
        .interact_text()?;

    let packages: String = Input::new()
        .with_prompt("Base packages (space separated)")
        .default(defaults.packages.join(" "))
        .interact_text()?;

    let node_version: String = Input::new()
        .with_prompt("Node.js version for nvm")
        .default(defaults.node.version.clone())
        .interact_text()?;

    let yarn = Confirm::new()
        .with_prompt("Install Yarn?")
        .default(true)
        .interact()?;

    let php_version: String = Input::new()
        .with_prompt("PHP version (empty for the distribution default)")
        .default(defaults.php.version.clone())
        .allow_empty(true)
        .interact_text()?;

    let php_extensions: String = Input::new()
        .with_prompt("PHP extensions (space separated)")
        .default(defaults.php.extensions.join(" "))
        .allow_empty(true)
        .interact_text()?;

    let composer = Confirm::new()
        .with_prompt("Install Composer?")
        .default(true)
        .interact()?;

    let mut config = defaults;
    config.timezone = timezone.trim().to_string();
    config.packages = split_words(&packages);
    config.node.version = node_version.trim().to_string();
    config.yarn = yarn;
    config.php.version = php_version.trim().to_string();
    config.php.extensions = split_words(&php_extensions);
    config.composer = composer;

    Ok(config)
}

fn split_words(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}
