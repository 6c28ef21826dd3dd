use std::collections::HashMap;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Text decoding
// ---------------------------------------------------------------------------

/// Decode an uploaded file: UTF-8 first, ISO-8859-1 otherwise.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback never fails.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.strip_prefix('\u{feff}').unwrap_or(s).to_string(),
        Err(_) => {
            log::debug!("Input is not valid UTF-8, decoding as ISO-8859-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Non-empty lines inspected by [`sniff_delimiter`].
const SNIFF_LINES: usize = 20;

/// Guess the field delimiter from the first non-empty lines.
///
/// Each candidate is scored by how many lines split into its most common
/// field count (2 or more). Instrument preambles such as a bare title line
/// therefore do not decide the outcome. Ties go to tab, then `;`, then `,`:
/// exports that use `;` as separator use `,` as decimal mark, so a line may
/// legitimately contain both.
pub fn sniff_delimiter(text: &str) -> u8 {
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let score = |delim: char| -> usize {
        let mut frequency: HashMap<usize, usize> = HashMap::new();
        for line in &lines {
            let fields = line.split(delim).count();
            if fields >= 2 {
                *frequency.entry(fields).or_default() += 1;
            }
        }
        frequency.into_values().max().unwrap_or(0)
    };

    let mut best = (b',', 0);
    for delim in [b',', b';', b'\t'] {
        let s = score(delim as char);
        if s > 0 && s >= best.1 {
            best = (delim, s);
        }
    }
    best.0
}

/// A cell interpreted as a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Invalid,
}

/// Parse a numeric cell, accepting a comma as decimal separator. `NaN` and
/// infinities are not measurements and count as invalid.
pub fn parse_cell(cell: &str) -> CellValue {
    let s = cell.trim();
    if s.is_empty() {
        return CellValue::Empty;
    }
    match s.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => CellValue::Number(v),
        _ => CellValue::Invalid,
    }
}

// ---------------------------------------------------------------------------
// RawTable – untyped cells as read from disk
// ---------------------------------------------------------------------------

/// A rectangular-ish grid of trimmed string cells. No row is interpreted
/// as a header here; loaders decide that.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parse delimited text. Rows may have differing lengths.
    pub fn parse(text: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(RawTable { rows })
    }

    /// Decode bytes, sniff the delimiter and parse.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = decode_text(bytes);
        let delimiter = sniff_delimiter(&text);
        Self::parse(&text, delimiter)
    }

    /// Decode bytes and parse with a known delimiter.
    pub fn from_bytes_with_delimiter(bytes: &[u8], delimiter: u8) -> Result<Self> {
        Self::parse(&decode_text(bytes), delimiter)
    }

    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        RawTable {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Cell at `(row, col)`, empty string when absent.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Remove rows whose cells are all empty, and columns empty in every row.
    pub fn drop_empty(&mut self) {
        self.rows.retain(|r| r.iter().any(|c| !c.is_empty()));
        self.drop_empty_columns(0);
    }

    /// Remove columns with no value below the first `skip` rows; header
    /// cells in those rows do not keep a column alive. Returns the number
    /// of columns removed.
    pub fn drop_empty_columns(&mut self, skip: usize) -> usize {
        let width = self.width();
        let keep: Vec<bool> = (0..width)
            .map(|col| {
                self.rows
                    .iter()
                    .skip(skip)
                    .any(|r| r.get(col).is_some_and(|c| !c.is_empty()))
            })
            .collect();
        let dropped = keep.iter().filter(|&&k| !k).count();
        if dropped == 0 {
            return 0;
        }
        for row in &mut self.rows {
            let mut col = 0;
            row.retain(|_| {
                let k = keep.get(col).copied().unwrap_or(false);
                col += 1;
                k
            });
        }
        dropped
    }
}
