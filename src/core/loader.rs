use crate::domain::model::{CellValue, Record};
use crate::utils::error::{ReceiptError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    /// `.csv` (any case) is delimited text, everything else goes to the workbook reader.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => TableFormat::Csv,
            _ => TableFormat::Spreadsheet,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableLoader {
    delimiter: u8,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn build_record(headers: &[String], cells: impl Iterator<Item = CellValue>) -> Option<Record> {
    let mut fields = HashMap::with_capacity(headers.len());
    let mut has_content = false;
    for (header, value) in headers.iter().zip(cells) {
        if !value.is_empty() {
            has_content = true;
        }
        // first column wins when headers repeat
        fields.entry(header.clone()).or_insert(value);
    }
    has_content.then_some(Record { fields })
}

impl TableLoader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn load(&self, format: TableFormat, data: &[u8]) -> Result<Vec<Record>> {
        let records = match format {
            TableFormat::Csv => self.load_csv(data)?,
            TableFormat::Spreadsheet => self.load_spreadsheet(data)?,
        };
        tracing::debug!("Loaded {} records ({:?})", records.len(), format);
        Ok(records)
    }

    fn load_csv(&self, data: &[u8]) -> Result<Vec<Record>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        if headers.iter().all(String::is_empty) {
            return Err(ReceiptError::LoadError {
                message: "CSV file has no header row".to_string(),
            });
        }
        tracing::debug!("CSV columns: {:?}", headers);

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let cells = row.iter().map(|cell| {
                if cell.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(cell.to_string())
                }
            });
            if let Some(record) = build_record(&headers, cells) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn load_spreadsheet(&self, data: &[u8]) -> Result<Vec<Record>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ReceiptError::LoadError {
                message: "Workbook has no worksheets".to_string(),
            })??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| normalize_header(&cell.to_string()))
                .collect(),
            None => {
                return Err(ReceiptError::LoadError {
                    message: "First worksheet is empty".to_string(),
                })
            }
        };
        tracing::debug!("Worksheet columns: {:?}", headers);

        Ok(rows
            .filter_map(|row| build_record(&headers, row.iter().map(cell_value)))
            .collect())
    }
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) if value.is_datetime() => match value.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Number(value.as_f64()),
        },
        Data::DateTime(value) => CellValue::Text(value.to_string()),
        Data::DateTimeIso(text) => match parse_iso_datetime(text) {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Text(text.clone()),
        },
        Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(err) => CellValue::Text(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_path(Path::new("daten.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("DATEN.CSV")), TableFormat::Csv);
        assert_eq!(
            TableFormat::from_path(Path::new("daten.xlsx")),
            TableFormat::Spreadsheet
        );
        assert_eq!(TableFormat::from_path(Path::new("daten")), TableFormat::Spreadsheet);
    }

    #[test]
    fn test_csv_headers_are_trimmed() {
        let csv = "\u{feff} Belegdatum , Betrag (Brutto) ,Notiz\n2024-01-15,50.00,a\n2024-02-01,25.5,\n";
        let records = TableLoader::default().load(TableFormat::Csv, csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].get("Belegdatum"),
            Some(&CellValue::Text("2024-01-15".to_string()))
        );
        assert_eq!(
            records[1].get("Betrag (Brutto)"),
            Some(&CellValue::Text("25.5".to_string()))
        );
        assert_eq!(records[1].get("Notiz"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_custom_delimiter_and_blank_rows() {
        let csv = "Belegdatum;Betrag (Brutto)\n01.02.2024;10\n;\n03.02.2024;20\n";
        let records = TableLoader::new(b';').load(TableFormat::Csv, csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1].get("Belegdatum"),
            Some(&CellValue::Text("03.02.2024".to_string()))
        );
    }

    #[test]
    fn test_csv_short_rows_leave_columns_missing() {
        let csv = "Belegdatum,Betrag (Brutto)\n2024-01-15\n";
        let records = TableLoader::default().load(TableFormat::Csv, csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].get("Betrag (Brutto)").is_none());
    }

    #[test]
    fn test_empty_csv_is_a_load_error() {
        let result = TableLoader::default().load(TableFormat::Csv, b"");
        assert!(matches!(result, Err(ReceiptError::LoadError { .. })));
    }

    #[test]
    fn test_garbage_spreadsheet_is_a_load_error() {
        let result = TableLoader::default().load(TableFormat::Spreadsheet, b"not a workbook");
        assert!(matches!(result, Err(ReceiptError::SpreadsheetError(_))));
    }

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Int(5)), CellValue::Number(5.0));
        assert_eq!(
            cell_value(&Data::String("x".to_string())),
            CellValue::Text("x".to_string())
        );

        // 45358 is 2024-03-07 in the 1900 date system
        let excel = ExcelDateTime::new(45358.0, ExcelDateTimeType::DateTime, false);
        match cell_value(&Data::DateTime(excel)) {
            CellValue::DateTime(dt) => {
                assert_eq!(dt.format("%d.%m.%Y").to_string(), "07.03.2024")
            }
            other => panic!("expected a date, got {:?}", other),
        }

        match cell_value(&Data::DateTimeIso("2024-03-07".to_string())) {
            CellValue::DateTime(dt) => assert_eq!(dt.format("%Y%m%d").to_string(), "20240307"),
            other => panic!("expected a date, got {:?}", other),
        }
    }
}
