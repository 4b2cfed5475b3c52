//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read};
use std::sync::Arc;
use tabled::Tabled;
use tracing::debug;

use crate::auth::{SessionProvider, StaticSessionProvider};
use crate::config::{init_default_config, Config, SecretBackend};
use crate::error::{Result, UserConfigsError};
use crate::secret::{FileSecretStore, SecretStore, VaultSecretStore};
use crate::ui::{RangeSlider, RangeSliderProps};
use crate::userconfigs::{
    get_config_key_path, ProfileDefaults, UserConfig, UserConfigKey, UserConfigsManager,
    UserConfigsState,
};
use crate::utils::format::{DisplayUtils, FormattableOutput, OutputFormat, TableFormatter};
use crate::utils::helpers::mask_value;

#[derive(Parser)]
#[command(name = "oxcfg")]
#[command(about = "Manage your Onyxia user configuration stored in the secret store")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load your configuration, writing defaults for missing entries
    Init,
    /// Show every configuration value with its sync status
    Show {
        /// Show credentials in clear text
        #[arg(long)]
        reveal: bool,
    },
    /// Print one configuration value
    Get {
        /// Configuration key (e.g. gitEmail or git-email)
        key: UserConfigKey,
        /// Show credentials in clear text
        #[arg(long)]
        reveal: bool,
    },
    /// Change one configuration value
    Set {
        /// Configuration key (e.g. gitEmail or git-email)
        key: UserConfigKey,
        /// New value; use "null" to clear an optional value
        value: Option<String>,
        /// Read value from stdin
        #[arg(long)]
        stdin: bool,
    },
    /// Generate a new service password
    RenewPassword,
    /// Show the "my secrets" usage dialog again
    RestoreDialog,
    /// Print the secret store path of a configuration key
    Path {
        /// Configuration key (e.g. gitEmail or git-email)
        key: UserConfigKey,
    },
    /// Render a range slider
    Range {
        #[arg(long, default_value_t = 0.0)]
        min: f64,
        #[arg(long)]
        max: f64,
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        #[arg(long)]
        low: f64,
        #[arg(long)]
        high: f64,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, default_value = "")]
        unit: String,
        /// Meaning of the low boundary (e.g. "guaranteed")
        #[arg(long)]
        low_semantic: Option<String>,
        /// Meaning of the high boundary (e.g. "limit")
        #[arg(long)]
        high_semantic: Option<String>,
        /// Track width in columns
        #[arg(long, default_value_t = 40)]
        width: usize,
    },
    /// Local settings management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,
    /// Show settings file path
    Path,
    /// Write a default settings file if none exists
    Init,
}

impl Commands {
    /// Whether the command talks to the secret store
    pub fn needs_secret_store(&self) -> bool {
        !matches!(
            self,
            Commands::Path { .. } | Commands::Range { .. } | Commands::Config { .. }
        )
    }
}

/// One line of `show` output
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UserConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl FormattableOutput for UserConfigRow {}

impl UserConfigRow {
    pub fn rows(state: &UserConfigsState, reveal: bool) -> Vec<Self> {
        UserConfigKey::ALL
            .into_iter()
            .map(|key| Self {
                key: key.to_string(),
                value: display_value(&state.value(key), reveal),
                status: state.status(key).to_string(),
            })
            .collect()
    }
}

fn display_value(value: &UserConfig, reveal: bool) -> String {
    let text = value.display_value();
    if reveal || !value.key().is_sensitive() || text == "null" {
        text
    } else {
        mask_value(&text)
    }
}

impl Cli {
    pub async fn execute(self, mut config: Config) -> Result<()> {
        if self.no_color {
            config.no_color = true;
        }
        let formatter = TableFormatter::new(self.format, config.no_color);
        let display = DisplayUtils::new(config.no_color);

        match self.command {
            Commands::Init => execute_init(&config, &display).await,
            Commands::Show { reveal } => execute_show(&config, &formatter, reveal).await,
            Commands::Get { key, reveal } => execute_get(&config, key, reveal).await,
            Commands::Set { key, value, stdin } => {
                execute_set(&config, &display, key, value, stdin).await
            }
            Commands::RenewPassword => execute_renew_password(&config, &display).await,
            Commands::RestoreDialog => execute_restore_dialog(&config, &display).await,
            Commands::Path { key } => execute_path(&config, key),
            Commands::Range {
                min,
                max,
                step,
                low,
                high,
                label,
                unit,
                low_semantic,
                high_semantic,
                width,
            } => {
                let props = RangeSliderProps {
                    min,
                    max,
                    step,
                    unit,
                    value_low: low,
                    value_high: high,
                    label,
                    low_extremity_semantic: low_semantic,
                    high_extremity_semantic: high_semantic,
                };
                execute_range(props, width)
            }
            Commands::Config { command } => {
                execute_config_command(command, &config, &formatter, &display).await
            }
        }
    }
}

/// Build the secret store selected in the settings
pub fn create_secret_store(config: &Config) -> Result<Arc<dyn SecretStore>> {
    match config.secret_backend {
        SecretBackend::Vault => Ok(Arc::new(VaultSecretStore::from_config(config)?)),
        SecretBackend::File => Ok(Arc::new(FileSecretStore::new(
            config.secrets_file_path()?,
        ))),
    }
}

/// Build a configuration manager for the session described by the settings
pub fn create_manager(config: &Config) -> Result<UserConfigsManager> {
    let secret_store = create_secret_store(config)?;
    let session = Arc::new(StaticSessionProvider::from_config(config)?);

    let dark_mode = config.default_dark_mode;
    let profile_defaults = ProfileDefaults::new(move || dark_mode)
        .with_deployment_region_id(config.default_deployment_region_id.clone());

    debug!("Using {} secret backend", config.secret_backend);
    Ok(UserConfigsManager::new(
        secret_store,
        session,
        profile_defaults,
    ))
}

async fn initialized_manager(config: &Config) -> Result<UserConfigsManager> {
    let manager = create_manager(config)?;
    manager.initialize().await?;
    Ok(manager)
}

async fn execute_init(config: &Config, display: &DisplayUtils) -> Result<()> {
    let manager = create_manager(config)?;
    let report = manager.initialize().await?;

    if report.repaired.is_empty() {
        display.print_success("Configuration loaded, every entry was already present");
    } else {
        let keys = report
            .repaired
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        display.print_success(&format!(
            "Configuration loaded, wrote defaults for {} entries",
            report.repaired.len()
        ));
        display.print_warning(&format!("Missing or outdated entries reset: {}", keys));
    }
    Ok(())
}

async fn execute_show(config: &Config, formatter: &TableFormatter, reveal: bool) -> Result<()> {
    let manager = initialized_manager(config).await?;
    let state = manager.state()?;

    println!(
        "{}",
        formatter.format_table(&UserConfigRow::rows(&state, reveal))?
    );
    Ok(())
}

async fn execute_get(config: &Config, key: UserConfigKey, reveal: bool) -> Result<()> {
    let manager = initialized_manager(config).await?;
    let value = manager.state()?.value(key);

    println!("{}", display_value(&value, reveal));
    Ok(())
}

fn read_value(key: UserConfigKey, value: Option<String>, stdin: bool) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }

    if stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer.trim().to_string());
    }

    if key.is_sensitive() {
        return Ok(rpassword::prompt_password(format!(
            "Enter value for '{key}': "
        ))?);
    }

    Err(UserConfigsError::invalid_argument(format!(
        "A value is required for '{key}' (pass it as an argument or use --stdin)"
    )))
}

async fn execute_set(
    config: &Config,
    display: &DisplayUtils,
    key: UserConfigKey,
    value: Option<String>,
    stdin: bool,
) -> Result<()> {
    let text = read_value(key, value, stdin)?;
    let change = UserConfig::parse(key, &text)?;

    let manager = initialized_manager(config).await?;
    manager.change_value(change).await?;

    display.print_success(&format!("Saved '{}'", key));
    Ok(())
}

async fn execute_renew_password(config: &Config, display: &DisplayUtils) -> Result<()> {
    let manager = initialized_manager(config).await?;
    manager.renew_user_service_password().await?;

    display.print_success("Generated a new service password");
    display.print_info("Run `oxcfg get userServicePassword --reveal` to see it");
    Ok(())
}

async fn execute_restore_dialog(config: &Config, display: &DisplayUtils) -> Result<()> {
    let manager = initialized_manager(config).await?;
    manager.restore_display_of_dialog().await?;

    display.print_success("The secrets usage dialog will be displayed again");
    Ok(())
}

fn config_key_path(config: &Config, key: UserConfigKey) -> Result<String> {
    let user = StaticSessionProvider::from_config(config)?.get_user()?;
    Ok(get_config_key_path(&user.username, key))
}

fn execute_path(config: &Config, key: UserConfigKey) -> Result<()> {
    println!("{}", config_key_path(config, key)?);
    Ok(())
}

fn execute_range(props: RangeSliderProps, width: usize) -> Result<()> {
    let mut slider = RangeSlider::new(props, |_, _| {})?;
    slider.on_layout(width as f64);

    println!("{}", slider.render(width));
    Ok(())
}

async fn execute_config_command(
    command: ConfigCommands,
    config: &Config,
    formatter: &TableFormatter,
    display: &DisplayUtils,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            display.print_header("Settings");
            println!("{}", formatter.format_item(config)?);
            let timeout = format!("{}s", config.request_timeout_secs);
            let secrets_file = config
                .secrets_file_path()
                .map(|path| path.display().to_string())
                .unwrap_or_default();
            println!(
                "{}",
                display.format_key_value_pairs(&[
                    ("Vault address", config.vault.address.as_str()),
                    ("Vault mount", config.vault.mount.as_str()),
                    ("Secrets file", secrets_file.as_str()),
                    ("Request timeout", timeout.as_str()),
                ])
            );
        }
        ConfigCommands::Path => {
            println!("{}", Config::get_config_path()?.display());
        }
        ConfigCommands::Init => {
            let path = init_default_config().await?;
            display.print_success(&format!("Settings file: {}", path.display()));
        }
    }
    Ok(())
}
