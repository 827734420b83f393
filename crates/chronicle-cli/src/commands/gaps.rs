use std::path::PathBuf;

use chrono::Duration;
use chronicle::CommunicationGap;
use chronicle::config::Config;
use chronicle::curator::detect_gaps;
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::error::{CliError, CliResult};
use crate::input::load_messages;
use crate::output::{OutputFormat, format_duration, format_timestamp};

#[derive(Parser)]
pub struct GapsCommand {
    #[clap(help = "Path to a JSON array of messages")]
    pub messages: PathBuf,

    #[clap(long, help = "Minimum silence in days (defaults to the configured threshold)")]
    pub days: Option<i64>,
}

impl GapsCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let days = self.days.unwrap_or(config.curation.gap_threshold_days);
        if days <= 0 {
            return Err(CliError(format!("--days must be positive, got {days}")));
        }

        let messages = load_messages(&self.messages)?;
        let gaps = detect_gaps(&messages, Duration::days(days));

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&gaps)?);
            }
            OutputFormat::Table => {
                if gaps.is_empty() {
                    println!(
                        "No silences of {} days or more in {} messages.",
                        days,
                        messages.len()
                    );
                } else {
                    println!("{}", gaps_table(&gaps));
                    println!("\nTotal: {} gaps", gaps.len());
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn gaps_table(gaps: &[CommunicationGap]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["From", "To", "Silence"]);

    for gap in gaps {
        table.add_row([
            format_timestamp(&gap.start),
            format_timestamp(&gap.end),
            format_duration(gap.duration()),
        ]);
    }

    table
}
