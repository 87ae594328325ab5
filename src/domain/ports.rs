use crate::domain::model::{PopulatedReceipt, Recipient, Record, RunSummary};
use crate::utils::error::Result;
use std::path::Path;

pub trait Storage {
    fn exists(&self, path: &Path) -> bool;
    fn read_file(&self, path: &Path) -> Result<Vec<u8>>;
    /// Writes `name` below the storage root.
    fn write_file(&self, name: &str, data: &[u8]) -> Result<()>;
}

pub trait ConfigProvider {
    fn table_path(&self) -> &Path;
    fn template_path(&self) -> &Path;
    fn output_dir(&self) -> &Path;
    fn recipient(&self) -> &Recipient;
    fn namespace(&self) -> &str;
    fn date_column(&self) -> &str;
    fn amount_column(&self) -> &str;
    fn csv_delimiter(&self) -> u8;
    fn dry_run(&self) -> bool;
}

pub trait Pipeline {
    /// Checks that must pass before anything is read.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }
    fn extract(&self) -> Result<Vec<Record>>;
    fn transform(&self, records: Vec<Record>) -> Result<PopulatedReceipt>;
    fn load(&self, receipt: PopulatedReceipt) -> Result<RunSummary>;
}

/// Spells out a whole number. `None` means the value could not be spelled.
pub trait SumInWords {
    fn spell(&self, value: i64) -> Option<String>;

    fn is_available(&self) -> bool {
        true
    }
}
