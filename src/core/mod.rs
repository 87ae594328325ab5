pub mod etl;
pub mod loader;
pub mod pipeline;
pub mod template;
pub mod words;

pub use crate::domain::model::{PopulatedReceipt, Record, RunSummary};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
