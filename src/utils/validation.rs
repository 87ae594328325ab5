use crate::utils::error::{ReceiptError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// The csv reader takes a single byte, so anything beyond one ASCII character is rejected.
pub fn validate_delimiter(field_name: &str, value: &str) -> Result<u8> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Delimiter must be a single ASCII character other than a quote or newline"
                .to_string(),
        }),
    }
}

/// File names end up inside the output path, so path separators are not allowed.
pub fn validate_file_name_part(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;
    if value.contains(['/', '\\', '\0']) {
        return Err(ReceiptError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value is used in the output file name and cannot contain path separators"
                .to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("template.path", "vorlage.xml").is_ok());
        assert!(validate_path("template.path", "").is_err());
        assert!(validate_path("template.path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("csv.delimiter", ",").unwrap(), b',');
        assert_eq!(validate_delimiter("csv.delimiter", ";").unwrap(), b';');
        assert_eq!(validate_delimiter("csv.delimiter", "\t").unwrap(), b'\t');
        assert!(validate_delimiter("csv.delimiter", "").is_err());
        assert!(validate_delimiter("csv.delimiter", ";;").is_err());
        assert!(validate_delimiter("csv.delimiter", "§").is_err());
        assert!(validate_delimiter("csv.delimiter", "\"").is_err());
    }

    #[test]
    fn test_validate_file_name_part() {
        assert!(validate_file_name_part("last_name", "Mustermann").is_ok());
        assert!(validate_file_name_part("last_name", "  ").is_err());
        assert!(validate_file_name_part("last_name", "../etc").is_err());
    }
}
