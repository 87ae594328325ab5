use crate::core::template::ReceiptTemplate;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single table cell. The variant is fixed when the table is loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Receipt date column text: `DD.MM.YYYY 00:00:00` for real dates, raw text plus the
    /// time suffix for anything else.
    pub fn to_receipt_date(&self) -> Option<String> {
        match self {
            CellValue::DateTime(dt) => Some(dt.format("%d.%m.%Y 00:00:00").to_string()),
            CellValue::Empty => None,
            CellValue::Text(text) if text.trim().is_empty() => None,
            other => Some(format!("{} 00:00:00", other)),
        }
    }

    pub fn to_amount(&self) -> std::result::Result<f64, String> {
        match self {
            CellValue::Number(n) => Ok(*n),
            CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err("is empty".to_string());
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(n),
                    _ => Err(format!("is not a number: '{}'", text)),
                }
            }
            CellValue::Empty => Err("is empty".to_string()),
            CellValue::DateTime(dt) => Err(format!("holds a date instead of an amount: {}", dt)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub fields: HashMap<String, CellValue>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.fields.get(column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub house_no: String,
    pub postal_code: String,
    pub city: String,
}

impl Recipient {
    /// `Vorname Nachname | Strasse Hausnummer | PLZ Ort`
    pub fn display(&self) -> String {
        format!(
            "{} {} | {} {} | {} {}",
            self.first_name, self.last_name, self.street, self.house_no, self.postal_code, self.city
        )
    }
}

/// Two decimals of the exact binary value; exact halves round to even.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

#[derive(Debug, Clone)]
pub struct PopulatedReceipt {
    pub document: ReceiptTemplate,
    pub recipient: String,
    pub total: f64,
    pub rows: usize,
    pub words_written: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub recipient: String,
    pub total: String,
    pub rows: usize,
    pub words_written: bool,
    pub written: bool,
}

impl RunSummary {
    /// Path for the console report: just the file name when it lands in the working
    /// directory, the full path otherwise.
    pub fn display_path(&self) -> String {
        match (self.output_path.parent(), self.output_path.file_name()) {
            (Some(parent), Some(name))
                if parent.as_os_str().is_empty() || parent == Path::new(".") =>
            {
                name.to_string_lossy().into_owned()
            }
            _ => self.output_path.display().to_string(),
        }
    }
}
