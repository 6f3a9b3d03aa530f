//! Streaming reader/writer for delimited archive exports.
//!
//! Inputs are tab- or comma-separated text files with a header row,
//! optionally gzip-compressed (by `.gz` extension). The delimiter can be
//! sniffed from the header line, tab preferred over comma.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::CuratorError;

#[derive(Debug)]
struct Header {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

/// One parsed row with access to its fields by column name.
#[derive(Debug, Clone)]
pub struct Row {
    header: Arc<Header>,
    values: csv::StringRecord,
}

impl Row {
    /// Trimmed value of the named column; empty string when the column is
    /// absent from this file's header or the row is short.
    pub fn field(&self, name: &str) -> &str {
        self.header
            .index
            .get(name)
            .and_then(|&position| self.values.get(position))
            .unwrap_or("")
            .trim()
    }

    /// Values in header order, padded with empty strings for short rows and
    /// truncated at the header width for long ones.
    pub fn values_padded(&self) -> Vec<&str> {
        (0..self.header.columns.len())
            .map(|position| self.values.get(position).unwrap_or(""))
            .collect()
    }
}

pub struct DelimitedReader {
    reader: csv::Reader<Box<dyn Read>>,
    header: Arc<Header>,
    delimiter: u8,
}

impl DelimitedReader {
    /// Opens a file and sniffs the delimiter from its header line.
    pub fn open(path: &Path) -> Result<Self, CuratorError> {
        Self::open_inner(path, None)
    }

    /// Opens a file with a fixed delimiter.
    pub fn open_with_delimiter(path: &Path, delimiter: u8) -> Result<Self, CuratorError> {
        Self::open_inner(path, Some(delimiter))
    }

    fn open_inner(path: &Path, delimiter: Option<u8>) -> Result<Self, CuratorError> {
        let raw = open_input(path)?;
        let mut buffered = BufReader::new(raw);

        let mut header_line = String::new();
        let read = buffered
            .read_line(&mut header_line)
            .map_err(|err| CuratorError::Malformed(format!("{}: {err}", path.display())))?;
        if read == 0 {
            return Err(CuratorError::EmptyInput(path.to_path_buf()));
        }
        let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&header_line));

        // Feed the already-consumed header line back in front of the stream.
        let chained: Box<dyn Read> =
            Box::new(io::Cursor::new(header_line.into_bytes()).chain(buffered));
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(chained);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|err| CuratorError::Malformed(format!("{}: {err}", path.display())))?
            .iter()
            .map(|value| value.trim().to_string())
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(position, name)| (name.clone(), position))
            .collect();

        Ok(Self {
            reader,
            header: Arc::new(Header { columns, index }),
            delimiter,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header.columns
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.index.contains_key(name)
    }

    /// Required columns absent from this file's header, in the order given.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect()
    }
}

impl Iterator for DelimitedReader {
    type Item = Result<Row, CuratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut record = csv::StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(true) => Some(Ok(Row {
                header: Arc::clone(&self.header),
                values: record,
            })),
            Ok(false) => None,
            Err(err) => Some(Err(CuratorError::Malformed(err.to_string()))),
        }
    }
}

pub struct DelimitedWriter {
    writer: csv::Writer<Box<dyn Write>>,
}

impl DelimitedWriter {
    /// Creates the output file (and any missing parent directories),
    /// gzip-compressing when the path ends in `.gz`.
    pub fn create(path: &Path, delimiter: u8) -> Result<Self, CuratorError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    CuratorError::Filesystem(format!("create {}: {err}", parent.display()))
                })?;
            }
        }
        let file = File::create(path).map_err(|err| {
            CuratorError::Filesystem(format!("create {}: {err}", path.display()))
        })?;
        let sink: Box<dyn Write> = if is_gz(path) {
            Box::new(GzEncoder::new(file, Compression::default()))
        } else {
            Box::new(file)
        };
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(sink);
        Ok(Self { writer })
    }

    pub fn write_record<I, T>(&mut self, record: I) -> Result<(), CuratorError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|err| CuratorError::Malformed(err.to_string()))
    }

    pub fn flush(&mut self) -> Result<(), CuratorError> {
        self.writer
            .flush()
            .map_err(|err| CuratorError::Filesystem(err.to_string()))
    }
}

pub fn sniff_delimiter(header_line: &str) -> u8 {
    if header_line.contains('\t') {
        b'\t'
    } else if header_line.contains(',') {
        b','
    } else {
        b'\t'
    }
}

fn open_input(path: &Path) -> Result<Box<dyn Read>, CuratorError> {
    let file = File::open(path)
        .map_err(|err| CuratorError::Filesystem(format!("open {}: {err}", path.display())))?;
    if is_gz(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn is_gz(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .map(|value| value.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn sniff_prefers_tab_over_comma() {
        assert_eq!(sniff_delimiter("a\tb,c\n"), b'\t');
        assert_eq!(sniff_delimiter("a,b,c\n"), b',');
        assert_eq!(sniff_delimiter("single_column\n"), b'\t');
    }

    #[test]
    fn reads_plain_tsv_with_sniffed_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.tsv");
        fs::write(&path, "run\tstudy\nERR1\tPRJ1\nERR2\tPRJ2\n").unwrap();

        let reader = DelimitedReader::open(&path).unwrap();
        assert_eq!(reader.delimiter(), b'\t');
        assert_eq!(reader.header(), ["run", "study"]);

        let rows: Vec<Row> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].field("run"), "ERR1");
        assert_eq!(rows[1].field("study"), "PRJ2");
        assert_eq!(rows[1].field("absent"), "");
    }

    #[test]
    fn reads_gzipped_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(b"Run,BioProject\nSRR1,PRJNA1\n")
            .unwrap();
        encoder.finish().unwrap();

        let reader = DelimitedReader::open(&path).unwrap();
        assert_eq!(reader.delimiter(), b',');
        let rows: Vec<Row> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("Run"), "SRR1");
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.tsv");
        fs::write(&path, "").unwrap();

        let err = DelimitedReader::open(&path).map(|_| ()).unwrap_err();
        assert!(matches!(err, CuratorError::EmptyInput(_)));
    }

    #[test]
    fn writer_roundtrips_through_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/slim.tsv.gz");

        let mut writer = DelimitedWriter::create(&path, b'\t').unwrap();
        writer.write_record(["run", "study"]).unwrap();
        writer.write_record(["ERR1", "PRJ1"]).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let reader = DelimitedReader::open(&path).unwrap();
        assert_eq!(reader.header(), ["run", "study"]);
        let rows: Vec<Row> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field("run"), "ERR1");
    }

    #[test]
    fn short_rows_are_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.tsv");
        fs::write(&path, "a\tb\tc\n1\t2\n").unwrap();

        let reader = DelimitedReader::open(&path).unwrap();
        let rows: Vec<Row> = reader.map(|row| row.unwrap()).collect();
        assert_eq!(rows[0].values_padded(), ["1", "2", ""]);
        assert_eq!(rows[0].field("c"), "");
    }
}
