pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::Result;

#[derive(Parser)]
#[command(name = "devstrap")]
#[command(version)]
#[command(about = "Provision a Debian/Ubuntu development box")]
#[command(long_about = "Sets the timezone, installs base packages, nvm, Node.js, Yarn, PHP and Composer, \
then prints the installed versions.\n\nRunning without a subcommand is the same as `devstrap run`.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: $DEVSTRAP_CONFIG, then /etc/devstrap/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the install checklist
    Run(RunArgs),

    /// Print the install checklist without running it
    Plan,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Default)]
pub struct RunArgs {
    /// Write the run log here instead of the configured log file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print every command instead of running it
    #[arg(long)]
    pub dry_run: bool,

    /// Keep running after a failed step
    #[arg(long)]
    pub keep_going: bool,

    /// Write a JSON report of step outcomes to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Skip the root and PATH checks
    #[arg(long)]
    pub skip_preflight: bool,

    /// Don't print installed versions at the end
    #[arg(long)]
    pub no_summary: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Write a config file
    Init {
        /// Where to write it (default: /etc/devstrap/config.yaml)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Write built-in defaults without asking
        #[arg(long)]
        defaults: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.config.as_deref();

        match self.command {
            None => commands::run::execute(config, RunArgs::default()).await,
            Some(Commands::Run(args)) => commands::run::execute(config, args).await,
            Some(Commands::Plan) => commands::plan::execute(config).await,
            Some(Commands::Config { command }) => match command {
                ConfigCommands::Show => commands::config::show(config).await,
                ConfigCommands::Init {
                    path,
                    defaults,
                    force,
                } => commands::init::execute(path, defaults, force).await,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["devstrap"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "devstrap",
            "run",
            "--dry-run",
            "--keep-going",
            "--log-file",
            "/tmp/devstrap.log",
            "-c",
            "/tmp/config.yaml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.yaml")));
        match cli.command {
            Some(Commands::Run(args)) => {
                assert!(args.dry_run);
                assert!(args.keep_going);
                assert!(!args.skip_preflight);
                assert_eq!(args.log_file, Some(PathBuf::from("/tmp/devstrap.log")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_config_init_flags() {
        let cli =
            Cli::try_parse_from(["devstrap", "config", "init", "--defaults", "--path", "x.yaml"])
                .unwrap();
        match cli.command {
            Some(Commands::Config {
                command:
                    ConfigCommands::Init {
                        path,
                        defaults,
                        force,
                    },
            }) => {
                assert_eq!(path, Some(PathBuf::from("x.yaml")));
                assert!(defaults);
                assert!(!force);
            }
            _ => panic!("expected config init"),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
