use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use duallist::config::{Config, LookupConfig};
use duallist::tui::{self, themes::Theme};
use duallist::SelectOption;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::build_widget;
use super::print::PrintCommand;

/// duallist - pick a subset of options in your terminal
#[derive(Parser, Debug)]
#[command(
    name = "duallist",
    version,
    about = "Pick a subset of options with a staged confirm/cancel dialog",
    long_about = r#"duallist shows a dual-list selection widget. Options come from a static
list, a picklist metadata catalog, or a remote lookup service. The committed
value is printed on exit.

Examples:
  duallist --options fruit.json                  # Pick from a static list
  duallist --object Account --field Industry     # Picklist from the metadata catalog
  duallist --field OwnerId --lookup-url URL      # Remote lookup keyed on a field
  duallist print                                 # Print the resolved options as JSON"#
)]
pub struct Cli {
    /// Configuration file, instead of the default search paths
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// JSON file with an array of {"value", "label"} options
    #[arg(long = "options", global = true)]
    pub options: Option<PathBuf>,

    /// Lookup service base URL
    #[arg(long = "lookup-url", global = true)]
    pub lookup_url: Option<String>,

    /// Object API name for picklist metadata
    #[arg(long = "object", global = true, requires = "field")]
    pub object: Option<String>,

    /// Field API name for picklist metadata or field lookups
    #[arg(long = "field", global = true)]
    pub field: Option<String>,

    /// Query the lookup service while typing instead of filtering locally
    #[arg(long = "remote-search", global = true)]
    pub remote_search: bool,

    /// Color theme (dark, light)
    #[arg(long = "theme", default_value = "dark")]
    pub theme: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve the options and print them as JSON
    Print(PrintCommand),
}

impl Cli {
    /// Whether the terminal UI will own the terminal
    pub fn is_interactive(&self) -> bool {
        self.command.is_none()
    }

    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let config = self.load_config().await?;
        config.validate()?;
        debug!("Configuration initialized");

        let mut widget = build_widget(&config).await?;
        widget.connect().await;

        match &self.command {
            Some(Commands::Print(print_cmd)) => print_cmd.execute(&widget),
            None => {
                info!("Starting interactive mode");
                let theme = Theme::by_name(&self.theme).unwrap_or_default();
                let widget = tui::run(widget, theme).await?;
                println!("{}", widget.value());
                Ok(())
            }
        }
    }

    async fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                dotenvy::dotenv().ok();
                let mut config = Config::load_from_path(path).await?;
                config.load_from_env()?;
                config
            }
            None => Config::init().await?,
        };
        self.apply_overrides(&mut config).await?;
        Ok(config)
    }

    /// Command-line flags win over files and the environment
    async fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(path) = &self.options {
            config.widget.options = load_options(path).await?;
        }
        if let Some(url) = &self.lookup_url {
            config
                .lookup
                .get_or_insert_with(|| LookupConfig::new(url.clone()))
                .base_url = url.clone();
        }
        if let Some(object) = &self.object {
            config.widget.object_api_name = Some(object.clone());
        }
        if let Some(field) = &self.field {
            config.widget.field_api_name = Some(field.clone());
        }
        if self.remote_search {
            config.search.remote_search = true;
        }
        Ok(())
    }
}

async fn load_options(path: &Path) -> Result<Vec<SelectOption>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid options file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "duallist",
            "--object",
            "Account",
            "--field",
            "Industry",
            "print",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.object.as_deref(), Some("Account"));
        assert_eq!(cli.field.as_deref(), Some("Industry"));
        assert!(!cli.is_interactive());
        assert!(matches!(cli.command, Some(Commands::Print(ref cmd)) if cmd.pretty));
    }

    #[test]
    fn test_object_requires_field() {
        assert!(Cli::try_parse_from(["duallist", "--object", "Account"]).is_err());
    }

    #[tokio::test]
    async fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("fruit.json");
        std::fs::write(
            &options,
            r#"[{"value": "a", "label": "Apple"}, {"value": "b", "label": "Banana"}]"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "duallist",
            "--options",
            options.to_str().unwrap(),
            "--lookup-url",
            "http://lookup.local",
            "--remote-search",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config).await.unwrap();

        assert_eq!(config.widget.options.len(), 2);
        assert_eq!(config.lookup.unwrap().base_url, "http://lookup.local");
        assert!(config.search.remote_search);
    }

    #[tokio::test]
    async fn test_invalid_options_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("broken.json");
        std::fs::write(&options, "not json").unwrap();

        let error = load_options(&options).await.unwrap_err();
        assert!(error.to_string().contains("Invalid options file"));
    }
}
