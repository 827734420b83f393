pub mod config;
pub mod curate;
pub mod gaps;

pub use config::ConfigCommand;
pub use curate::CurateCommand;
pub use gaps::GapsCommand;
