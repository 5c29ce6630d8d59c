use std::path::Path;

use console::style;

use crate::config::ProvisionConfig;
use crate::error::Result;
use crate::provision::{describe, plan};

pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = ProvisionConfig::load(config_path)?;
    let steps = plan::build(&config);

    println!("{}", style("Install checklist").bold().cyan());
    println!();

    let width = steps.len().to_string().len();
    for (idx, step) in steps.iter().enumerate() {
        println!(
            "  {:>width$}. {} {}",
            idx + 1,
            style(&step.title).white(),
            style(format!("[{}]", step.id)).dim(),
            width = width
        );
        println!(
            "  {:>width$}  {}",
            "",
            style(describe(&step.action)).dim(),
            width = width
        );
    }

    println!();
    println!("Log file: {}", style(config.log_path().display()).dim());

    Ok(())
}
