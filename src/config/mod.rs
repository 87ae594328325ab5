pub mod cli;
pub mod toml_config;

use crate::core::template::LUCOM_NAMESPACE;
use crate::core::ConfigProvider;
use crate::domain::model::Recipient;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_TEMPLATE: &str = "vorlage.xml";
pub const DEFAULT_DATE_COLUMN: &str = "Belegdatum";
pub const DEFAULT_AMOUNT_COLUMN: &str = "Betrag (Brutto)";
pub const DEFAULT_WORDS_LANGUAGE: &str = "de";

/// Fully resolved settings for one run: defaults, then the config file, then flags.
#[derive(Debug, Clone)]
pub struct ReceiptSettings {
    pub table_path: PathBuf,
    pub recipient: Recipient,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub namespace: String,
    pub date_column: String,
    pub amount_column: String,
    pub csv_delimiter: u8,
    pub words_enabled: bool,
    pub words_language: String,
    pub dry_run: bool,
    pub monitor: bool,
}

impl ReceiptSettings {
    pub fn new(table_path: impl Into<PathBuf>, recipient: Recipient) -> Self {
        Self {
            table_path: table_path.into(),
            recipient,
            template_path: PathBuf::from(DEFAULT_TEMPLATE),
            output_dir: PathBuf::from("."),
            namespace: LUCOM_NAMESPACE.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            amount_column: DEFAULT_AMOUNT_COLUMN.to_string(),
            csv_delimiter: b',',
            words_enabled: true,
            words_language: DEFAULT_WORDS_LANGUAGE.to_string(),
            dry_run: false,
            monitor: false,
        }
    }

    pub fn apply_file_config(mut self, file: &TomlConfig) -> Result<Self> {
        file.validate()?;

        if let Some(date) = file.date_column() {
            self.date_column = date.trim().to_string();
        }
        if let Some(amount) = file.amount_column() {
            self.amount_column = amount.trim().to_string();
        }
        if let Some(path) = file.template_path() {
            self.template_path = PathBuf::from(path);
        }
        if let Some(namespace) = file.namespace() {
            self.namespace = namespace.to_string();
        }
        if let Some(delimiter) = file.csv_delimiter() {
            self.csv_delimiter = validation::validate_delimiter("csv.delimiter", delimiter)?;
        }
        if let Some(directory) = file.output_directory() {
            self.output_dir = PathBuf::from(directory);
        }
        if let Some(enabled) = file.words_enabled() {
            self.words_enabled = enabled;
        }
        if let Some(language) = file.words_language() {
            self.words_language = language.to_string();
        }
        self.monitor = self.monitor || file.monitoring_enabled();
        Ok(self)
    }
}

impl Validate for ReceiptSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("table", &self.table_path.to_string_lossy())?;
        validation::validate_path("template", &self.template_path.to_string_lossy())?;
        validation::validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validation::validate_file_name_part("last_name", &self.recipient.last_name)?;
        validation::validate_non_empty_string("namespace", &self.namespace)?;
        validation::validate_non_empty_string("date_column", &self.date_column)?;
        validation::validate_non_empty_string("amount_column", &self.amount_column)?;
        Ok(())
    }
}

impl ConfigProvider for ReceiptSettings {
    fn table_path(&self) -> &Path {
        &self.table_path
    }

    fn template_path(&self) -> &Path {
        &self.template_path
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn date_column(&self) -> &str {
        &self.date_column
    }

    fn amount_column(&self) -> &str {
        &self.amount_column
    }

    fn csv_delimiter(&self) -> u8 {
        self.csv_delimiter
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(feature = "cli")]
const EXAMPLE: &str = "Beispiel:\n  spendenbeleg daten.xlsx Max Mustermann Straße 1 12345 Musterort";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "spendenbeleg")]
#[command(about = "Fill the donation receipt XML template from a CSV or spreadsheet table")]
#[command(after_help = EXAMPLE)]
pub struct CliConfig {
    /// Table with the donations (.csv, .xlsx, .xls, .ods)
    pub table: PathBuf,

    /// Vorname
    pub first_name: String,

    /// Nachname, also used in the output file name
    pub last_name: String,

    /// Straße
    pub street: String,

    /// Hausnummer
    pub house_no: String,

    /// PLZ
    pub postal_code: String,

    /// Ort
    pub city: String,

    #[arg(long, help = "Template XML [default: vorlage.xml]")]
    pub template: Option<PathBuf>,

    #[arg(long, help = "Directory for the output file [default: .]")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, help = "TOML file with column names and other settings")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Do not write the total in words")]
    pub no_words: bool,

    #[arg(long, help = "Populate the template without writing the output file")]
    pub dry_run: bool,

    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log phase timings and peak memory")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn recipient(&self) -> Recipient {
        Recipient {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            street: self.street.clone(),
            house_no: self.house_no.clone(),
            postal_code: self.postal_code.clone(),
            city: self.city.clone(),
        }
    }

    /// Loads the optional config file and lets the flags override it.
    pub fn resolve(&self) -> Result<ReceiptSettings> {
        let mut settings = ReceiptSettings::new(self.table.clone(), self.recipient());

        if let Some(path) = &self.config {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            let file = TomlConfig::from_file(path)?;
            settings = settings.apply_file_config(&file)?;
        }

        if let Some(template) = &self.template {
            settings.template_path = template.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
        if self.no_words {
            settings.words_enabled = false;
        }
        settings.dry_run = self.dry_run;
        settings.monitor = settings.monitor || self.monitor;

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> Recipient {
        Recipient {
            first_name: "Max".to_string(),
            last_name: "Mustermann".to_string(),
            street: "Straße".to_string(),
            house_no: "1".to_string(),
            postal_code: "12345".to_string(),
            city: "Musterort".to_string(),
        }
    }

    #[test]
    fn test_defaults() {
        let settings = ReceiptSettings::new("daten.xlsx", recipient());
        assert_eq!(settings.template_path(), Path::new("vorlage.xml"));
        assert_eq!(settings.date_column(), "Belegdatum");
        assert_eq!(settings.amount_column(), "Betrag (Brutto)");
        assert_eq!(settings.namespace(), LUCOM_NAMESPACE);
        assert_eq!(settings.csv_delimiter(), b',');
        assert!(settings.words_enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_config_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            "[columns]\ndate = \" Datum \"\n[csv]\ndelimiter = \";\"\n[words]\nlanguage = \"fr\"\n",
        )
        .unwrap();
        let settings = ReceiptSettings::new("daten.csv", recipient())
            .apply_file_config(&file)
            .unwrap();

        assert_eq!(settings.date_column, "Datum");
        assert_eq!(settings.amount_column, DEFAULT_AMOUNT_COLUMN);
        assert_eq!(settings.csv_delimiter, b';');
        assert_eq!(settings.words_language, "fr");
    }

    #[test]
    fn test_invalid_last_name_is_rejected() {
        let mut r = recipient();
        r.last_name = "a/b".to_string();
        assert!(ReceiptSettings::new("daten.csv", r).validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_flags_win_over_defaults() {
        let cli = CliConfig::try_parse_from([
            "spendenbeleg",
            "daten.csv",
            "Max",
            "Mustermann",
            "Straße",
            "1",
            "12345",
            "Musterort",
            "--template",
            "andere.xml",
            "--no-words",
            "--dry-run",
        ])
        .unwrap();

        let settings = cli.resolve().unwrap();
        assert_eq!(settings.template_path, PathBuf::from("andere.xml"));
        assert!(!settings.words_enabled);
        assert!(settings.dry_run);
        assert_eq!(settings.recipient.city, "Musterort");
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_requires_all_positionals() {
        let result = CliConfig::try_parse_from(["spendenbeleg", "daten.csv", "Max"]);
        assert!(result.is_err());
    }
}
