use std::path::PathBuf;

use chronicle::config::Config;
use chronicle::embedding::FastEmbedProvider;
use chronicle::{CurationOptions, CurationResult, EmbeddingSource, MessageCurator};
use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tokio_util::sync::CancellationToken;

use crate::commands::gaps::gaps_table;
use crate::error::CliResult;
use crate::input::load_input;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct CurateCommand {
    #[clap(help = "Path to a JSON array of messages")]
    pub messages: PathBuf,

    #[clap(
        long,
        short,
        help = "JSON array of precomputed embeddings, one per message in file order"
    )]
    pub embeddings: Option<PathBuf>,

    #[clap(long, short, help = "Maximum number of messages to keep")]
    pub target: Option<usize>,
}

impl CurateCommand {
    pub async fn execute(
        &self,
        config: &Config,
        cancel: &CancellationToken,
        format: OutputFormat,
    ) -> CliResult<()> {
        let input = load_input(&self.messages, self.embeddings.as_deref())?;
        let options = CurationOptions::with_target(
            self.target.unwrap_or(config.curation.target_count),
        );
        let curator = MessageCurator::new(config.curation.clone());

        let result = match &input.embeddings {
            Some(vectors) => {
                curator
                    .curate(
                        &input.messages,
                        EmbeddingSource::Precomputed(vectors),
                        options,
                        cancel,
                    )
                    .await?
            }
            None => {
                tracing::info!("Loading embedding model {}", config.embedding.model);
                let provider = FastEmbedProvider::new(&config.embedding)?;
                curator
                    .curate(
                        &input.messages,
                        EmbeddingSource::Provider(&provider),
                        options,
                        cancel,
                    )
                    .await?
            }
        };

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            OutputFormat::Table => {
                println!(
                    "Curated {} of {} messages",
                    result.messages.len(),
                    result.stats.input_count
                );
                if result.stats.passed_through {
                    println!("Input fits the target; returned unchanged.\n");
                } else {
                    println!(
                        "{} windows of {} days ({} non-empty, {} clustered), {} near-duplicates skipped\n",
                        result.stats.window_count,
                        result.stats.window_days,
                        result.stats.non_empty_windows,
                        result.stats.clustered_windows,
                        result.stats.duplicates_skipped
                    );
                }

                if !result.messages.is_empty() {
                    println!("{}\n", messages_table(&result));
                }

                if result.gaps.is_empty() {
                    println!("No communication gaps.");
                } else {
                    println!("Communication gaps:");
                    println!("{}", gaps_table(&result.gaps));
                }
            }
        }

        Ok(())
    }
}

fn messages_table(result: &CurationResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Time", "Sender", "Window", "Score", "Content"]);

    for message in &result.messages {
        table.add_row([
            format_timestamp(&message.timestamp),
            message.sender.clone(),
            message.window_label.clone(),
            format!("{:.3}", message.representativeness_score),
            truncate_string(&message.content, 60),
        ]);
    }

    table
}
