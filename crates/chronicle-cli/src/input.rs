//! Loading messages and precomputed embeddings from JSON files

use std::path::Path;

use chrono::{DateTime, Utc};
use chronicle::Message;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{CliError, CliResult};

/// A message as written in an input file
#[derive(Debug, Deserialize)]
struct MessageRecord {
    #[serde(default)]
    id: Option<Uuid>,
    sender: String,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    sequence: Option<usize>,
}

/// Messages ready for curation, with embeddings in the same order
#[derive(Debug)]
pub struct CurationInput {
    pub messages: Vec<Message>,
    pub embeddings: Option<Vec<Vec<f32>>>,
}

/// Read a messages file and an optional embeddings file.
///
/// Messages are stably sorted by timestamp and the embeddings follow the same
/// reordering. Missing ids are generated and missing sequence indices are
/// taken from the sorted position.
pub fn load_input(messages_path: &Path, embeddings_path: Option<&Path>) -> CliResult<CurationInput> {
    let records = read_records(messages_path)?;
    let embeddings = match embeddings_path {
        Some(path) => Some(read_embeddings(path)?),
        None => None,
    };
    build_input(records, embeddings)
}

/// Read and order a messages file
pub fn load_messages(path: &Path) -> CliResult<Vec<Message>> {
    Ok(build_input(read_records(path)?, None)?.messages)
}

fn read_records(path: &Path) -> CliResult<Vec<MessageRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError(format!("Invalid messages file {}: {}", path.display(), e)))
}

fn read_embeddings(path: &Path) -> CliResult<Vec<Vec<f32>>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError(format!("Invalid embeddings file {}: {}", path.display(), e)))
}

fn build_input(
    records: Vec<MessageRecord>,
    embeddings: Option<Vec<Vec<f32>>>,
) -> CliResult<CurationInput> {
    if let Some(vectors) = &embeddings {
        if vectors.len() != records.len() {
            return Err(CliError(format!(
                "{} embeddings for {} messages",
                vectors.len(),
                records.len()
            )));
        }
    }

    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].timestamp);

    let mut slots: Vec<Option<MessageRecord>> = records.into_iter().map(Some).collect();
    let messages = order
        .iter()
        .enumerate()
        .filter_map(|(position, &i)| {
            slots[i].take().map(|record| Message {
                id: record.id.unwrap_or_else(Uuid::new_v4),
                sender: record.sender,
                content: record.content,
                timestamp: record.timestamp,
                sequence: record.sequence.unwrap_or(position),
            })
        })
        .collect();

    let embeddings = embeddings.map(|mut vectors| {
        order
            .iter()
            .map(|&i| std::mem::take(&mut vectors[i]))
            .collect()
    });

    Ok(CurationInput {
        messages,
        embeddings,
    })
}
