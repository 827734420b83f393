use chronicle::config::Config;
use clap::{Parser, Subcommand};

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser)]
pub struct ConfigCommand {
    #[clap(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    #[clap(about = "Show the effective configuration")]
    Show,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        match self.command {
            ConfigSubcommand::Show => {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
                    OutputFormat::Table => print!("{}", toml::to_string_pretty(config)?),
                }
                Ok(())
            }
        }
    }
}
