//! Row normalizer - turns raw delimited lines into typed records.
//!
//! Rows that do not fit the layout are not errors: they come back as a [`SkipReason`] and
//! are counted in [`SkipStats`]. Numeric fields are coerced leniently and never validated;
//! well-formed numbers are the source file's responsibility.

use crate::errors::Result;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;
use tracing::trace;

/// GeoNames exports are tab separated.
pub const DEFAULT_DELIMITER: char = '\t';

/// Why a row was excluded from loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// First field starts with `#`
    Comment,
    /// One of the layout's leading title lines
    Header,
    /// Field count does not fit the layout
    FieldCount {
        /// Fields the layout expects
        expected: usize,
        /// Fields the row has
        found: usize,
    },
    /// Excluded by the configured language or country filter
    Filtered,
    /// Line is not valid UTF-8
    Encoding,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment => f.write_str("comment line"),
            Self::Header => f.write_str("header line"),
            Self::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            Self::Filtered => f.write_str("filtered out"),
            Self::Encoding => f.write_str("invalid UTF-8"),
        }
    }
}

/// Per-reason counts of skipped rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStats {
    pub comments: u64,
    pub headers: u64,
    pub field_count: u64,
    pub filtered: u64,
    pub encoding: u64,
}

impl SkipStats {
    /// Counts one skipped row.
    pub const fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Comment => self.comments += 1,
            SkipReason::Header => self.headers += 1,
            SkipReason::FieldCount { .. } => self.field_count += 1,
            SkipReason::Filtered => self.filtered += 1,
            SkipReason::Encoding => self.encoding += 1,
        }
    }

    /// Total rows skipped for any reason.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.comments + self.headers + self.field_count + self.filtered + self.encoding
    }
}

/// Fixed column layout of one GeoNames export.
pub trait RowLayout {
    /// Typed record produced from one row
    type Record;

    /// Number of source fields per row
    const FIELD_COUNT: usize;

    /// Leading title lines that carry no `#` marker
    const HEADER_LINES: usize = 0;

    /// Whether a row with `found` fields fits this layout.
    #[must_use]
    fn accepts(found: usize) -> bool {
        found == Self::FIELD_COUNT
    }

    /// Builds the record; `fields.len()` has already been checked with [`Self::accepts`].
    fn from_fields(fields: &[&str]) -> Self::Record;
}

/// Normalizes one raw line into a record of layout `L`.
///
/// Fields are split on `delimiter` exactly; whitespace inside fields is preserved.
///
/// # Errors
/// Returns the [`SkipReason`] when the line is a comment or has the wrong field count.
pub fn normalize<L: RowLayout>(
    raw_line: &str,
    delimiter: char,
) -> std::result::Result<L::Record, SkipReason> {
    let fields: Vec<&str> = raw_line.split(delimiter).collect();
    if fields.first().is_some_and(|first| first.starts_with('#')) {
        return Err(SkipReason::Comment);
    }
    if !L::accepts(fields.len()) {
        return Err(SkipReason::FieldCount {
            expected: L::FIELD_COUNT,
            found: fields.len(),
        });
    }
    Ok(L::from_fields(&fields))
}

/// Coerces a numeric field: integer parse, else truncated float, else 0.
#[must_use]
pub fn coerce_int(field: &str) -> i64 {
    let field = field.trim();
    field.parse::<i64>().unwrap_or_else(|_| {
        field
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map_or(0, |value| value.trunc() as i64)
    })
}

/// Like [`coerce_int`] but saturates into `i32`.
#[must_use]
pub fn coerce_i32(field: &str) -> i32 {
    let value = coerce_int(field);
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Coerces a decimal field, 0.0 when unparseable.
#[must_use]
pub fn coerce_float(field: &str) -> f64 {
    field.trim().parse::<f64>().unwrap_or(0.0)
}

/// GeoNames flags are `1` when set and empty otherwise.
#[must_use]
pub fn coerce_flag(field: &str) -> bool {
    field.trim() == "1"
}

/// Streams a delimited file line by line, yielding records or skip reasons.
///
/// Lines are split on `\n` as raw bytes; a line that is not valid UTF-8 is skipped as
/// [`SkipReason::Encoding`] instead of failing the whole file.
pub struct RowReader<L: RowLayout, R = BufReader<File>> {
    reader: R,
    buffer: Vec<u8>,
    delimiter: char,
    line_number: usize,
    _layout: PhantomData<L>,
}

impl<L: RowLayout> RowReader<L> {
    /// Opens `path` for streaming with the GeoNames tab delimiter.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?), DEFAULT_DELIMITER))
    }
}

impl<L: RowLayout, R: BufRead> RowReader<L, R> {
    /// Wraps any buffered reader.
    pub fn new(reader: R, delimiter: char) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            delimiter,
            line_number: 0,
            _layout: PhantomData,
        }
    }
}

impl<L: RowLayout, R: BufRead> Iterator for RowReader<L, R> {
    type Item = Result<std::result::Result<L::Record, SkipReason>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => return Some(Err(e.into())),
        }
        self.line_number += 1;

        if self.line_number <= L::HEADER_LINES {
            return Some(Ok(Err(SkipReason::Header)));
        }
        let mut raw = self.buffer.as_slice();
        if let Some(stripped) = raw.strip_suffix(b"\n") {
            raw = stripped.strip_suffix(b"\r").unwrap_or(stripped);
        }
        let row = match std::str::from_utf8(raw) {
            Ok(line) => normalize::<L>(line, self.delimiter),
            Err(_) => Err(SkipReason::Encoding),
        };
        if let Err(reason) = &row {
            trace!("Skipping line {}: {}", self.line_number, reason);
        }
        Some(Ok(row))
    }
}
