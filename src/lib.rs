pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::TomlConfig, ReceiptSettings};

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::core::{etl::EtlEngine, pipeline::ReceiptPipeline, words::resolve_converter};
pub use domain::model::{CellValue, Recipient, Record, RunSummary};
pub use utils::error::{ReceiptError, Result};
