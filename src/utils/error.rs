use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Table,
    Template,
    Config,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Table => write!(f, "Table"),
            FileKind::Template => write!(f, "Template"),
            FileKind::Config => write!(f, "Config file"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("{kind} '{}' not found", path.display())]
    MissingFile { kind: FileKind, path: PathBuf },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Failed to read table: {message}")]
    LoadError { message: String },

    #[error("Malformed template XML: {0}")]
    TemplateParseError(#[from] xml::reader::Error),

    #[error("Template has no element with id '{id}'")]
    MissingElement { id: String },

    #[error("Row {row}: column '{column}' {reason}")]
    RecordFieldError {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("XML write error: {0}")]
    XmlWriteError(#[from] xml::writer::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input: arguments, missing files, unreadable table, bad rows, bad config.
    Validation,
    /// The template lacks an element the receipt cannot do without.
    Structure,
    /// Writing the result failed.
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ReceiptError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReceiptError::MissingFile { .. }
            | ReceiptError::CsvError(_)
            | ReceiptError::SpreadsheetError(_)
            | ReceiptError::LoadError { .. }
            | ReceiptError::RecordFieldError { .. }
            | ReceiptError::ConfigError { .. }
            | ReceiptError::InvalidConfigValueError { .. } => ErrorCategory::Validation,
            ReceiptError::TemplateParseError(_) | ReceiptError::MissingElement { .. } => {
                ErrorCategory::Structure
            }
            ReceiptError::XmlWriteError(_)
            | ReceiptError::IoError(_)
            | ReceiptError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Structure => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// Process exit code: 2 for bad input, 3 for a broken template, 1 for write failures.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Validation => 2,
            ErrorCategory::Structure => 3,
            ErrorCategory::Io => 1,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReceiptError::MissingFile { kind, .. } => match kind {
                FileKind::Table => "Check the table path argument".to_string(),
                FileKind::Template => {
                    "Place vorlage.xml in the working directory or pass --template".to_string()
                }
                FileKind::Config => "Check the --config path".to_string(),
            },
            ReceiptError::CsvError(_) | ReceiptError::LoadError { .. } => {
                "Make sure the table is a valid CSV file with a header row".to_string()
            }
            ReceiptError::SpreadsheetError(_) => {
                "Make sure the table is a valid xlsx/xls/ods workbook".to_string()
            }
            ReceiptError::TemplateParseError(_) => {
                "Open the template in an XML editor and fix the syntax".to_string()
            }
            ReceiptError::MissingElement { id } => {
                format!("Add an element with id=\"{}\" to the template", id)
            }
            ReceiptError::RecordFieldError { column, .. } => {
                format!("Fill in the column '{}' for every row of the table", column)
            }
            ReceiptError::ConfigError { .. } | ReceiptError::InvalidConfigValueError { .. } => {
                "Check the configuration file and command line flags".to_string()
            }
            ReceiptError::XmlWriteError(_)
            | ReceiptError::IoError(_)
            | ReceiptError::SerializationError(_) => {
                "Check that the output directory is writable".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReceiptError::MissingFile { kind, path } => match kind {
                FileKind::Table => format!("Fehler: Tabelle '{}' nicht gefunden.", path.display()),
                FileKind::Template => {
                    format!("Fehler: Vorlage '{}' nicht gefunden.", path.display())
                }
                FileKind::Config => {
                    format!("Fehler: Konfiguration '{}' nicht gefunden.", path.display())
                }
            },
            ReceiptError::CsvError(_)
            | ReceiptError::SpreadsheetError(_)
            | ReceiptError::LoadError { .. } => {
                format!("Fehler beim Lesen der Tabelle: {}", self)
            }
            ReceiptError::TemplateParseError(_) | ReceiptError::MissingElement { .. } => {
                format!("Fehler in der Vorlage: {}", self)
            }
            ReceiptError::RecordFieldError { .. } => {
                format!("Fehler in den Tabellendaten: {}", self)
            }
            ReceiptError::ConfigError { .. } | ReceiptError::InvalidConfigValueError { .. } => {
                format!("Fehler in der Konfiguration: {}", self)
            }
            ReceiptError::XmlWriteError(_)
            | ReceiptError::IoError(_)
            | ReceiptError::SerializationError(_) => {
                format!("Fehler beim Schreiben der Ausgabe: {}", self)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ReceiptError>;
