use crate::utils::error::{FileKind, ReceiptError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional receipt settings file. Every key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub columns: Option<ColumnsConfig>,
    pub template: Option<TemplateConfig>,
    pub csv: Option<CsvConfig>,
    pub output: Option<OutputConfig>,
    pub words: Option<WordsConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnsConfig {
    pub date: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub path: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvConfig {
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordsConfig {
    pub enabled: Option<bool>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ReceiptError::MissingFile {
                kind: FileKind::Config,
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReceiptError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReceiptError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn date_column(&self) -> Option<&str> {
        self.columns.as_ref()?.date.as_deref()
    }

    pub fn amount_column(&self) -> Option<&str> {
        self.columns.as_ref()?.amount.as_deref()
    }

    pub fn template_path(&self) -> Option<&str> {
        self.template.as_ref()?.path.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.template.as_ref()?.namespace.as_deref()
    }

    pub fn csv_delimiter(&self) -> Option<&str> {
        self.csv.as_ref()?.delimiter.as_deref()
    }

    pub fn output_directory(&self) -> Option<&str> {
        self.output.as_ref()?.directory.as_deref()
    }

    pub fn words_enabled(&self) -> Option<bool> {
        self.words.as_ref()?.enabled
    }

    pub fn words_language(&self) -> Option<&str> {
        self.words.as_ref()?.language.as_deref()
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(date) = self.date_column() {
            validation::validate_non_empty_string("columns.date", date)?;
        }
        if let Some(amount) = self.amount_column() {
            validation::validate_non_empty_string("columns.amount", amount)?;
        }
        if let Some(path) = self.template_path() {
            validation::validate_path("template.path", path)?;
        }
        if let Some(namespace) = self.namespace() {
            validation::validate_non_empty_string("template.namespace", namespace)?;
        }
        if let Some(delimiter) = self.csv_delimiter() {
            validation::validate_delimiter("csv.delimiter", delimiter)?;
        }
        if let Some(directory) = self.output_directory() {
            validation::validate_path("output.directory", directory)?;
        }
        Ok(())
    }
}
