pub mod commands;
pub mod error;
pub mod input;
pub mod output;

pub use commands::{ConfigCommand, CurateCommand, GapsCommand};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, format_duration, format_timestamp, truncate_string};
