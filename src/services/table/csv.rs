use std::io::Cursor;

use encoding_rs::WINDOWS_1252;
use polars::prelude::*;

use crate::error::AppError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Tokens read as missing, on top of empty fields.
const NULL_TOKENS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "#N/A", "None"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

#[derive(Debug)]
pub struct DecodedCsv {
    pub frame: DataFrame,
    pub encoding: TextEncoding,
}

impl DecodedCsv {
    pub fn notice(&self) -> Option<String> {
        match self.encoding {
            TextEncoding::Utf8 => None,
            TextEncoding::Latin1 => Some("Loaded CSV using Latin-1 encoding".to_string()),
        }
    }
}

/// Reads CSV bytes as UTF-8, retrying as Windows-1252 when they are not valid UTF-8.
pub fn read_with_fallback(bytes: &[u8]) -> Result<DecodedCsv, AppError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    match std::str::from_utf8(body) {
        Ok(_) => Ok(DecodedCsv {
            frame: read_utf8(body)?,
            encoding: TextEncoding::Utf8,
        }),
        Err(e) => {
            tracing::warn!("CSV is not valid UTF-8 ({}), retrying as Latin-1", e);
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(body);
            Ok(DecodedCsv {
                frame: read_utf8(text.as_bytes())?,
                encoding: TextEncoding::Latin1,
            })
        }
    }
}

/// Parses UTF-8 CSV text with a header row. Column types are inferred
/// from every row.
pub fn read_utf8(bytes: &[u8]) -> Result<DataFrame, AppError> {
    let null_values = NULL_TOKENS.iter().map(|token| token.to_string()).collect();

    let frame = CsvReader::new(Cursor::new(bytes))
        .has_header(true)
        .infer_schema(None)
        .with_null_values(Some(NullValues::AllColumns(null_values)))
        .finish()
        .map_err(|e| {
            tracing::error!("Failed to parse CSV: {}", e);
            AppError::FileRead(format!("Failed to parse CSV: {}", e))
        })?;

    Ok(empty_columns_as_float(frame)?)
}

/// Columns without a single value become `Float64`, so they count as
/// (empty) numeric columns rather than taking a text slot.
fn empty_columns_as_float(frame: DataFrame) -> PolarsResult<DataFrame> {
    if frame.height() == 0 {
        return Ok(frame);
    }

    let columns = frame
        .get_columns()
        .iter()
        .map(|series| {
            if series.null_count() == series.len() && series.dtype() != &DataType::Float64 {
                tracing::debug!("Column {} has no values, reading it as numeric", series.name());
                series.cast(&DataType::Float64)
            } else {
                Ok(series.clone())
            }
        })
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_input_needs_no_notice() {
        let decoded = read_with_fallback("name,score\nAnn,3\nBo,4\n".as_bytes()).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf8);
        assert!(decoded.notice().is_none());
        assert_eq!(decoded.frame.height(), 2);
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let decoded = read_with_fallback(b"\xEF\xBB\xBFname,score\nAnn,3\n").unwrap();
        assert_eq!(decoded.frame.get_column_names(), vec!["name", "score"]);
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "Café" encoded as Latin-1
        let bytes = b"city,visits\nCaf\xE9,2\nParis,5\n";
        let decoded = read_with_fallback(bytes).unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Latin1);
        assert_eq!(
            decoded.notice().as_deref(),
            Some("Loaded CSV using Latin-1 encoding")
        );
        let city = decoded.frame.column("city").unwrap().str().unwrap();
        assert_eq!(city.get(0), Some("Café"));
    }

    #[test]
    fn null_tokens_become_missing() {
        let frame = read_utf8(b"a,b\n1,x\nNA,\n3,N/A\n").unwrap();
        assert_eq!(frame.column("a").unwrap().null_count(), 1);
        assert_eq!(frame.column("b").unwrap().null_count(), 2);
    }

    #[test]
    fn late_floats_and_text_widen_the_column_type() {
        let mut text = String::from("qty,code\n");
        for i in 0..150 {
            text.push_str(&format!("{},{}\n", i, i));
        }
        text.push_str("2.5,unknown\n");

        let frame = read_utf8(text.as_bytes()).unwrap();
        assert_eq!(frame.height(), 151);
        assert_eq!(frame.column("qty").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("code").unwrap().dtype(), &DataType::String);
        let code = frame.column("code").unwrap().str().unwrap();
        assert_eq!(code.get(150), Some("unknown"));
    }

    #[test]
    fn column_without_values_is_numeric() {
        let frame = read_utf8(b"name,blank,team\nAda,,red\nBob,,blue\n").unwrap();
        assert_eq!(frame.column("name").unwrap().dtype(), &DataType::String);
        assert_eq!(frame.column("blank").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("blank").unwrap().null_count(), 2);
        assert_eq!(frame.column("team").unwrap().dtype(), &DataType::String);
    }
}
