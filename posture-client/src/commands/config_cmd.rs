use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::Input;
use std::process::Command;

use super::{fetch_service_defaults, open_config_store};
use crate::api::InferenceClient;
use crate::config::{resolve, validate, PostureConfig, Settings};

/// Threshold fields to change; omitted ones keep their current value
#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Lower bound of the right neck angle (degrees, <= 0)
    #[arg(long, allow_hyphen_values = true)]
    right_min: Option<f64>,

    /// Upper bound of the right neck angle (degrees, <= 0)
    #[arg(long, allow_hyphen_values = true)]
    right_max: Option<f64>,

    /// Lower bound of the left neck angle (degrees, >= 0)
    #[arg(long, allow_hyphen_values = true)]
    left_min: Option<f64>,

    /// Upper bound of the left neck angle (degrees, >= 0)
    #[arg(long, allow_hyphen_values = true)]
    left_max: Option<f64>,

    /// Seconds of bad posture before an alert
    #[arg(long, value_name = "SECONDS")]
    alert_interval: Option<f64>,
}

impl ConfigSetArgs {
    pub fn is_empty(&self) -> bool {
        self.right_min.is_none()
            && self.right_max.is_none()
            && self.left_min.is_none()
            && self.left_max.is_none()
            && self.alert_interval.is_none()
    }

    /// Full candidate: `current` with the given fields replaced
    pub fn overlay(&self, current: PostureConfig) -> PostureConfig {
        PostureConfig {
            right_min_angle: self.right_min.unwrap_or(current.right_min_angle),
            right_max_angle: self.right_max.unwrap_or(current.right_max_angle),
            left_min_angle: self.left_min.unwrap_or(current.left_min_angle),
            left_max_angle: self.left_max.unwrap_or(current.left_max_angle),
            alert_interval_ms: self
                .alert_interval
                .map(PostureConfig::interval_ms_from_secs)
                .unwrap_or(current.alert_interval_ms),
        }
    }

    fn prompt(current: &PostureConfig) -> Result<Self> {
        let ask = |prompt: &str, value: f64| -> Result<f64> {
            Ok(Input::<f64>::new()
                .with_prompt(prompt)
                .default(value)
                .interact_text()?)
        };

        Ok(Self {
            right_min: Some(ask("Right min angle", current.right_min_angle)?),
            right_max: Some(ask("Right max angle", current.right_max_angle)?),
            left_min: Some(ask("Left min angle", current.left_min_angle)?),
            left_max: Some(ask("Left max angle", current.left_max_angle)?),
            alert_interval: Some(ask("Alert interval (seconds)", current.alert_interval_secs())?),
        })
    }
}

fn print_thresholds(config: &PostureConfig) {
    println!(
        "  Right neck angle: {}° .. {}°",
        config.right_min_angle, config.right_max_angle
    );
    println!(
        "  Left neck angle:  {}° .. {}°",
        config.left_min_angle, config.left_max_angle
    );
    println!("  Alert interval:   {}s", config.alert_interval_secs());
}

pub async fn show_config(settings: &Settings) -> Result<()> {
    let settings_str = toml::to_string_pretty(settings)?;

    println!("Current Settings");
    println!("────────────────────────────────");
    println!();
    println!("{}", settings_str);

    println!("Posture Thresholds");
    println!("────────────────────────────────");
    match open_config_store(settings)?.try_load() {
        Ok(Some(config)) => print_thresholds(&config),
        Ok(None) => println!("  Not set, the service defaults apply"),
        Err(e) => println!("  {} {}", "✗".red(), e),
    }

    Ok(())
}

pub async fn set_config(settings: &Settings, args: ConfigSetArgs) -> Result<()> {
    let client = InferenceClient::new(&settings.api)?;
    let defaults = fetch_service_defaults(&client).await;

    let store = open_config_store(settings)?;
    let current = resolve(&defaults, store.load());

    let args = if args.is_empty() {
        ConfigSetArgs::prompt(&current)?
    } else {
        args
    };

    let config = match validate(args.overlay(current)) {
        Ok(config) => config,
        Err(e) => {
            println!("{} {}", "✗".red(), e.user_message());
            return Err(e.into());
        }
    };

    store
        .save(&config)
        .context("Failed to save posture thresholds")?;

    println!("{} Configuration saved!", "✓".green());
    println!();
    print_thresholds(&config);

    Ok(())
}

pub async fn reset_config(settings: &Settings) -> Result<()> {
    let client = InferenceClient::new(&settings.api)?;
    let defaults = fetch_service_defaults(&client).await;

    let config = open_config_store(settings)?.reset(&defaults);

    println!("{} Thresholds reset to defaults", "✓".green());
    println!();
    print_thresholds(&config);

    Ok(())
}

pub async fn edit_config() -> Result<()> {
    let config_file = Settings::config_file()?;

    // Ensure settings file exists
    if !config_file.exists() {
        Settings::default().save()?;
    }

    // Open in default editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    Command::new(&editor)
        .arg(&config_file)
        .status()
        .with_context(|| format!("Failed to launch editor {}", editor))?;

    println!("{} Settings saved!", "✓".green());

    Ok(())
}

pub async fn init_config(force: bool) -> Result<()> {
    let config_file = Settings::config_file()?;

    if config_file.exists() && !force {
        println!(
            "Settings file already exists at: {}",
            config_file.display()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    Settings::default().save()?;

    println!(
        "{} Settings initialized at: {}",
        "✓".green(),
        config_file.display()
    );
    println!();
    println!("You can edit it with: posture config edit");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceDefaults;

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let current = PostureConfig::from_defaults(&ServiceDefaults::fallback());
        let args = ConfigSetArgs {
            left_max: Some(45.0),
            alert_interval: Some(2.5),
            ..ConfigSetArgs::default()
        };

        let candidate = args.overlay(current);

        assert_eq!(candidate.right_min_angle, -60.0);
        assert_eq!(candidate.left_max_angle, 45.0);
        assert_eq!(candidate.alert_interval_ms, 2500);
        assert!(!args.is_empty());
        assert!(ConfigSetArgs::default().is_empty());
    }
}
