// ============================================================
// CSV PARSER
// ============================================================
// Decode uploaded bytes with encoding fallback and split them into cells

use csv::{ReaderBuilder, StringRecord, Trim};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::domain::error::AppError;
use crate::domain::sales::TextEncoding;
use crate::shared::text::is_missing_marker;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row and raw cells of a delimited file.
///
/// Missing cells (NA markers, or short rows) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub records: Vec<Vec<Option<String>>>,
}

impl ParsedCsv {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All cells of one column, top to bottom
    pub fn column(&self, idx: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.records
            .iter()
            .map(move |record| record.get(idx).and_then(|cell| cell.as_deref()))
    }
}

/// CSV parser with encoding fallback
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode and parse raw upload bytes
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<(ParsedCsv, TextEncoding), AppError> {
        let (content, encoding) = Self::decode(bytes)?;
        let parsed = self.parse_content(&content)?;
        Ok((parsed, encoding))
    }

    /// Decode bytes with the first candidate encoding that accepts them
    pub fn decode(bytes: &[u8]) -> Result<(String, TextEncoding), AppError> {
        for encoding in TextEncoding::CANDIDATES {
            match Self::decode_with(encoding, bytes) {
                Some(content) => {
                    debug!(encoding = encoding.label(), bytes = bytes.len(), "Decoded upload");
                    return Ok((content, encoding));
                }
                None => debug!(encoding = encoding.label(), "Encoding rejected upload"),
            }
        }

        Err(AppError::EncodingError(
            "Could not read file with any of the supported encodings".to_string(),
        ))
    }

    fn decode_with(encoding: TextEncoding, bytes: &[u8]) -> Option<String> {
        match encoding {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                encoding_rs::UTF_8
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(Cow::into_owned)
            }
            // ISO-8859-1 maps every byte to the code point of the same value
            TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
                Some(encoding_rs::mem::decode_latin1(bytes).into_owned())
            }
            TextEncoding::Windows1252 => encoding_rs::WINDOWS_1252
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned),
        }
    }

    /// Parse CSV content from string
    pub fn parse_content(&self, content: &str) -> Result<ParsedCsv, AppError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::None)
            .flexible(true) // Short rows are padded, long rows rejected below
            .from_reader(content.as_bytes());

        let raw_headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if raw_headers.is_empty() || raw_headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::ParseError(
                "No columns to parse from file".to_string(),
            ));
        }

        let headers = Self::clean_headers(&raw_headers);
        let mut records = Vec::new();

        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            if record.len() > headers.len() {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(index as u64 + 2);
                return Err(AppError::ParseError(format!(
                    "Expected {} fields in line {}, saw {}",
                    headers.len(),
                    line,
                    record.len()
                )));
            }

            records.push(Self::parse_row(headers.len(), &record));
        }

        Ok(ParsedCsv { headers, records })
    }

    /// Trim header names and disambiguate duplicates with `.1`, `.2`, ...
    fn clean_headers(raw: &StringRecord) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::new();
        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut headers = Vec::with_capacity(raw.len());

        for header in raw.iter() {
            let base = header.trim().to_string();
            let mut name = base.clone();

            while used.contains(&name) {
                let counter = counters.entry(base.clone()).or_insert(0);
                *counter += 1;
                name = format!("{}.{}", base, counter);
            }

            used.insert(name.clone());
            headers.push(name);
        }

        headers
    }

    /// Parse a single CSV row
    fn parse_row(width: usize, record: &StringRecord) -> Vec<Option<String>> {
        (0..width)
            .map(|idx| match record.get(idx) {
                Some(value) if !is_missing_marker(value) => Some(value.to_string()),
                _ => None,
            })
            .collect()
    }
}
