use crate::core::loader::{TableFormat, TableLoader};
use crate::core::template::{field_element, ReceiptTemplate};
use crate::core::{ConfigProvider, Pipeline, PopulatedReceipt, Record, RunSummary, Storage};
use crate::domain::model::format_amount;
use crate::domain::ports::SumInWords;
use crate::utils::error::{FileKind, ReceiptError, Result};
use std::path::{Path, PathBuf};
use xmltree::{Element, XMLNode};

pub const NAME_ID: &str = "name";
pub const TOTAL_ID: &str = "gesamtsumme";
pub const WORDS_ID: &str = "wert2";
pub const DATASET_ID: &str = "betraege";

pub const LINE_ID: &str = "ID_LINE";
pub const DATE_ID: &str = "dat1";
pub const KIND_ID: &str = "art";
pub const WAIVER_ID: &str = "ja_nein";
pub const AMOUNT_ID: &str = "betrag1";

/// Every row is a money donation ...
pub const DONATION_KIND: &str = "Geldzuwendung";
/// ... without a waiver of reimbursement.
pub const WAIVER: &str = "nein";

/// `output_{table stem}_{last name}.xml`
pub fn output_file_name(table_path: &Path, last_name: &str) -> String {
    let stem = table_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("output_{}_{}.xml", stem, last_name)
}

pub struct ReceiptPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    words: Box<dyn SumInWords>,
}

impl<S: Storage, C: ConfigProvider> ReceiptPipeline<S, C> {
    pub fn new(storage: S, config: C, words: Box<dyn SumInWords>) -> Self {
        Self {
            storage,
            config,
            words,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_dir().join(output_file_name(
            self.config.table_path(),
            &self.config.recipient().last_name,
        ))
    }

    fn build_row(
        &self,
        template: &ReceiptTemplate,
        line: usize,
        record: &Record,
    ) -> Result<(Element, f64)> {
        let date_column = self.config.date_column();
        let amount_column = self.config.amount_column();

        let date = record
            .get(date_column)
            .and_then(|value| value.to_receipt_date())
            .ok_or_else(|| ReceiptError::RecordFieldError {
                row: line,
                column: date_column.to_string(),
                reason: "is missing".to_string(),
            })?;

        let amount = match record.get(amount_column) {
            Some(value) => value.to_amount().map_err(|reason| ReceiptError::RecordFieldError {
                row: line,
                column: amount_column.to_string(),
                reason,
            })?,
            None => {
                return Err(ReceiptError::RecordFieldError {
                    row: line,
                    column: amount_column.to_string(),
                    reason: "is missing".to_string(),
                })
            }
        };

        let mut row = template.new_row(DATASET_ID)?;
        let fields = [
            (LINE_ID, line.to_string()),
            (DATE_ID, date),
            (KIND_ID, DONATION_KIND.to_string()),
            (WAIVER_ID, WAIVER.to_string()),
            (AMOUNT_ID, format_amount(amount)),
        ];
        for (id, text) in fields {
            let field = field_element(&row, id, &text);
            row.children.push(XMLNode::Element(field));
        }
        Ok((row, amount))
    }
}

impl<S: Storage, C: ConfigProvider> Pipeline for ReceiptPipeline<S, C> {
    fn prepare(&self) -> Result<()> {
        let table = self.config.table_path();
        if !self.storage.exists(table) {
            return Err(ReceiptError::MissingFile {
                kind: FileKind::Table,
                path: table.to_path_buf(),
            });
        }

        let template = self.config.template_path();
        if !self.storage.exists(template) {
            return Err(ReceiptError::MissingFile {
                kind: FileKind::Template,
                path: template.to_path_buf(),
            });
        }
        Ok(())
    }

    fn extract(&self) -> Result<Vec<Record>> {
        let path = self.config.table_path();
        let format = TableFormat::from_path(path);
        tracing::debug!("Reading table {} as {:?}", path.display(), format);

        let data = self.storage.read_file(path)?;
        TableLoader::new(self.config.csv_delimiter()).load(format, &data)
    }

    fn transform(&self, records: Vec<Record>) -> Result<PopulatedReceipt> {
        let template_path = self.config.template_path();
        tracing::debug!("Parsing template {}", template_path.display());
        let data = self.storage.read_file(template_path)?;
        let mut template = ReceiptTemplate::parse(&data, self.config.namespace())?;

        // 1. recipient
        let recipient = self.config.recipient().display();
        if !template.set_element_text(NAME_ID, &recipient) {
            tracing::warn!(
                "💡 Hinweis: Element mit ID '{}' nicht in der Vorlage gefunden.",
                NAME_ID
            );
        }

        // 2 + 3. rows are built completely before the dataset is touched
        let mut rows = Vec::with_capacity(records.len());
        let mut total = 0.0;
        for (index, record) in records.iter().enumerate() {
            let (row, amount) = self.build_row(&template, index + 1, record)?;
            total += amount;
            rows.push(row);
        }
        let row_count = rows.len();
        let removed = template.replace_rows(DATASET_ID, rows)?;
        tracing::debug!(
            "Replaced {} template rows with {} donation rows",
            removed,
            row_count
        );

        // 4. total
        template.require_element_text(TOTAL_ID, &format_amount(total))?;

        // 5. spelled-out total, best effort
        let mut words_written = false;
        if self.words.is_available() {
            match self.words.spell(total.trunc() as i64) {
                Some(words) => {
                    words_written = template.set_element_text(WORDS_ID, &words.to_uppercase());
                    if !words_written {
                        tracing::debug!("No '{}' element, skipping total in words", WORDS_ID);
                    }
                }
                None => tracing::debug!("Total {} cannot be spelled out", total),
            }
        }

        Ok(PopulatedReceipt {
            document: template,
            recipient,
            total,
            rows: row_count,
            words_written,
        })
    }

    fn load(&self, receipt: PopulatedReceipt) -> Result<RunSummary> {
        let output_path = self.output_path();
        let file_name = output_file_name(
            self.config.table_path(),
            &self.config.recipient().last_name,
        );

        let written = if self.config.dry_run() {
            tracing::info!("🔍 Dry run, not writing {}", output_path.display());
            false
        } else {
            let xml = receipt.document.to_bytes()?;
            tracing::debug!("Writing {} bytes to {}", xml.len(), output_path.display());
            self.storage.write_file(&file_name, &xml)?;
            true
        };

        Ok(RunSummary {
            output_path,
            recipient: receipt.recipient,
            total: format_amount(receipt.total),
            rows: receipt.rows,
            words_written: receipt.words_written,
            written,
        })
    }
}
