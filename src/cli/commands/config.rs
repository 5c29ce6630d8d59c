use std::path::Path;

use console::style;

use crate::config::ProvisionConfig;
use crate::error::{DevstrapError, Result};

pub async fn show(config_path: Option<&Path>) -> Result<()> {
    let source = ProvisionConfig::resolve_path(config_path);
    let config = ProvisionConfig::load(config_path)?;

    println!("{}", style("Current Configuration").bold().cyan());
    println!();
    println!("  Timezone:     {}", style(&config.timezone).white());
    println!("  Packages:     {}", style(config.packages.join(", ")).white());
    println!(
        "  nvm:          {} {}",
        style(&config.nvm.version).white(),
        style(format!("({})", config.nvm.dir)).dim()
    );
    println!("  Node.js:      {}", style(&config.node.version).white());
    println!("  Yarn:         {}", enabled(config.yarn));
    println!("  PHP:          {}", style(config.php_packages().join(", ")).white());
    println!("  Composer:     {}", enabled(config.composer));
    println!("  Profile:      {}", style(&config.profile_path).dim());
    println!("  Log file:     {}", style(&config.log_file).dim());
    println!();

    match source {
        Some(path) => println!("Config file: {}", style(path.display()).dim()),
        None => println!(
            "{} Run {} to write one.",
            style("Using built-in defaults.").dim(),
            style("devstrap config init").cyan()
        ),
    }

    Ok(())
}

/// Render the config as the YAML that `config init` would write.
pub fn to_yaml(config: &ProvisionConfig) -> Result<String> {
    serde_yaml::to_string(config)
        .map_err(|e| DevstrapError::Config(format!("Failed to serialize config: {}", e)))
}

fn enabled(on: bool) -> console::StyledObject<&'static str> {
    if on {
        style("enabled").green()
    } else {
        style("disabled").dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_yaml_round_trips_defaults() {
        let yaml = to_yaml(&ProvisionConfig::default()).unwrap();
        assert!(yaml.contains("timezone: UTC"));
        assert!(yaml.contains("composer: true"));
        let parsed: ProvisionConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, ProvisionConfig::default());
    }

    #[tokio::test]
    async fn test_show_with_explicit_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        ProvisionConfig::default().save(&path).unwrap();
        assert!(show(Some(path.as_path())).await.is_ok());
    }
}
