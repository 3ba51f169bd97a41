pub mod access;
pub mod boundary;
pub mod buckets;
pub mod color;
pub mod config;
pub mod datasets;
pub mod diseases;
pub mod export;
pub mod flow;
mod range;
pub mod ranking;
mod util;

pub use anyhow::{Context, Error};
use qu::ick_use::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use crate::{
    buckets::{AgeBracket, AgeBucket},
    color::{Palette, Rgb},
    config::Config,
    datasets::Datasets,
    diseases::{DiseaseRow, DiseaseTable},
    range::Range,
    ranking::{RankedRow, Ranking, SortKey},
    util::header,
};

pub type ArcStr = Arc<str>;
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

/// Sex of the counted patients. Disease tables carry one count column per sex.
///
/// Ordering is arbitrary.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Hash, Ord, PartialOrd)]
pub enum Sex {
    #[serde(rename = "male", alias = "남")]
    Male,
    #[serde(rename = "female", alias = "여")]
    Female,
}

impl Sex {
    /// The column header used in the published tables.
    pub fn korean_label(self) -> &'static str {
        match self {
            Sex::Male => "남",
            Sex::Female => "여",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("Male"),
            Sex::Female => f.write_str("Female"),
        }
    }
}

/// Parse a headed CSV, skipping rows that don't fit.
///
/// A row with fewer fields than the header, or one whose fields don't deserialize, is logged
/// and skipped so one corrupt line doesn't lose the whole table. Only a missing or unreadable
/// header is an error.
pub fn read_csv<T, R>(reader: R, source: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: io::Read,
{
    let mut rdr = csv_reader(reader);
    let headers = csv_headers(&mut rdr, source)?;
    let mut rows = Vec::new();
    for record in rdr.records() {
        let Some((record, line)) = checked_record(record, &headers, source) else {
            continue
        };
        match record.deserialize::<T>(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                event!(
                    Level::WARN,
                    "\"{}\" line {}: {}; skipping row",
                    source,
                    line,
                    e
                );
            }
        }
    }
    Ok(rows)
}

/// Open a file and parse it with [`read_csv`].
pub fn load_csv<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    fn inner<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
        let reader = io::BufReader::new(fs::File::open(path)?);
        read_csv(reader, &path.display().to_string())
    }
    let path = path.as_ref();
    inner(path).with_context(|| format!("while loading \"{}\"", path.display()))
}

pub(crate) fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// The header row, with any byte-order mark removed from the first column.
pub(crate) fn csv_headers<R: io::Read>(
    rdr: &mut csv::Reader<R>,
    source: &str,
) -> Result<csv::StringRecord> {
    let headers = rdr
        .headers()
        .with_context(|| format!("reading the header of \"{}\"", source))?;
    ensure!(!headers.is_empty(), "\"{}\" has no header row", source);
    Ok(headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim())
        .collect())
}

/// Unwraps a record with the line it starts on, logging and discarding it if it can't be read or
/// is short.
pub(crate) fn checked_record(
    record: csv::Result<csv::StringRecord>,
    headers: &csv::StringRecord,
    source: &str,
) -> Option<(csv::StringRecord, u64)> {
    let record = match record {
        Ok(record) => record,
        Err(e) => {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            event!(Level::WARN, "\"{}\" line {}: {}; skipping row", source, line, e);
            return None;
        }
    };
    // quoted fields can span lines, so take the line from the reader
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    if record.len() < headers.len() {
        event!(
            Level::WARN,
            "\"{}\" line {}: expected {} fields, found {}; skipping row",
            source,
            line,
            headers.len(),
            record.len()
        );
        return None;
    }
    Some((record, line))
}

/// Note: No protection from escaping the root directory.
pub fn asset_path(root: &Path, input: &Path) -> PathBuf {
    root.join(input)
}

pub fn file_exists(path: &Path) -> io::Result<bool> {
    util::path_exists(path)
}

pub fn check_extension(path: &Path, ext: &str) -> Result<()> {
    ensure!(
        matches!(path.extension(), Some(p) if p == ext),
        "filename should end with `.{}`",
        ext
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::{check_extension, checked_record, csv_headers, csv_reader, read_csv};
    use serde::Deserialize;
    use std::path::Path;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        a: String,
        b: u32,
    }

    #[test]
    fn short_and_bad_rows_are_skipped() {
        let input = "a,b\nx,1\ny\nz,notanumber\nw,4\n";
        let rows: Vec<Row> = read_csv(input.as_bytes(), "test").unwrap();
        assert_eq!(
            rows,
            vec![
                Row {
                    a: "x".into(),
                    b: 1
                },
                Row {
                    a: "w".into(),
                    b: 4
                },
            ]
        );
    }

    #[test]
    fn line_numbers_follow_multiline_fields() {
        let input = "a,b\n\"first\nsecond\",1\ny\nw,4\n";
        let mut rdr = csv_reader(input.as_bytes());
        let headers = csv_headers(&mut rdr, "test").unwrap();
        let lines = rdr
            .records()
            .filter_map(|record| checked_record(record, &headers, "test"))
            .map(|(record, line)| (record[0].to_string(), line))
            .collect::<Vec<_>>();
        // `y` on line 4 is short and dropped
        assert_eq!(lines, [("first\nsecond".to_string(), 2), ("w".to_string(), 5)]);
    }

    #[test]
    fn byte_order_mark() {
        let input = "\u{feff}a,b\nx,1\n";
        let rows: Vec<Row> = read_csv(input.as_bytes(), "test").unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_csv::<Row, _>("".as_bytes(), "test").is_err());
    }

    #[test]
    fn extensions() {
        assert!(check_extension(Path::new("out/flow.json"), "json").is_ok());
        assert!(check_extension(Path::new("out/flow.csv"), "json").is_err());
    }
}
