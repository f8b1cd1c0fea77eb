pub mod config;
pub mod export;

pub use config::{Config, ConfigError};
pub use export::{CellRecord, GridExport, LabelRecord};
