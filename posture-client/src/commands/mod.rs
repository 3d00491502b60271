mod config_cmd;
mod run;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::api::InferenceClient;
use crate::config::{ConfigStore, Settings};
use crate::models::ServiceDefaults;
use crate::storage::FileSlotStore;

pub use config_cmd::ConfigSetArgs;
pub use run::RunCommand;

#[derive(Parser)]
#[command(name = "posture")]
#[command(about = "Webcam posture monitor backed by a pose inference service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Inference service base URL (overrides the settings file)
    #[arg(long, global = true, env = "POSTURE_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start posture detection
    Run(RunCommand),

    /// Manage posture thresholds and settings
    #[command(subcommand)]
    Config(ConfigSubcommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show settings and the active posture thresholds
    Show,

    /// Save posture thresholds (prompts when no flags are given)
    Set(ConfigSetArgs),

    /// Forget saved thresholds and use the service defaults
    Reset,

    /// Edit settings file
    Edit,

    /// Initialize settings file with defaults
    Init {
        /// Overwrite existing settings
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// The dashboard owns the terminal, so its logs go to a file
    pub fn logs_to_file(&self) -> bool {
        matches!(&self.command, Commands::Run(cmd) if !cmd.is_headless())
    }

    pub async fn execute(self) -> Result<()> {
        if self.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        let mut settings = Settings::load()?;
        if let Some(url) = self.api_url {
            settings.api.base_url = url;
        }

        match self.command {
            Commands::Run(cmd) => cmd.execute(settings).await,
            Commands::Config(subcmd) => match subcmd {
                ConfigSubcommands::Show => config_cmd::show_config(&settings).await,
                ConfigSubcommands::Set(args) => config_cmd::set_config(&settings, args).await,
                ConfigSubcommands::Reset => config_cmd::reset_config(&settings).await,
                ConfigSubcommands::Edit => config_cmd::edit_config().await,
                ConfigSubcommands::Init { force } => config_cmd::init_config(force).await,
            },
            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

/// Store for the posture thresholds, in the settings directory
fn open_config_store(settings: &Settings) -> Result<ConfigStore> {
    let store = FileSlotStore::new(FileSlotStore::default_dir()?);
    Ok(ConfigStore::new(Arc::new(store), settings.storage.slot.clone()))
}

/// Ask the service for its thresholds, falling back to built-in values
async fn fetch_service_defaults(client: &InferenceClient) -> ServiceDefaults {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Contacting {}...", client.base_url()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let defaults = match client.config_defaults().await {
        Ok(defaults) => defaults,
        Err(e) => {
            tracing::warn!("Failed to fetch service defaults, using built-in values: {}", e);
            ServiceDefaults::fallback()
        }
    };

    spinner.finish_and_clear();
    defaults
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dashboard_logs_to_file() {
        let cli = Cli::try_parse_from(["posture", "run"]).unwrap();
        assert!(cli.logs_to_file());

        let cli = Cli::try_parse_from(["posture", "run", "--headless"]).unwrap();
        assert!(!cli.logs_to_file());

        let cli = Cli::try_parse_from(["posture", "-v", "config", "show"]).unwrap();
        assert!(!cli.logs_to_file());
        assert!(cli.verbose());
    }
}
