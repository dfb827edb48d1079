//! Delimited source reading.
//!
//! Rows are yielded as plain string cells, without header handling: the
//! rule tree addresses columns by position. Every physical blank line is a
//! row of one empty cell, so row numbers match the file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};

use crate::error::{IngestError, Result};

/// Lazy sequence of source rows.
///
/// Owns the file handle; the handle is released when the iterator is
/// dropped. A fresh [`read_rows`] call is needed for every pass.
pub struct SourceRows {
    path: PathBuf,
    records: StringRecordsIntoIter<BlankLines<BufReader<File>>>,
    row: usize,
}

impl SourceRows {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for SourceRows {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.row += 1;
        let item = match record {
            Ok(record) => {
                let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
                if self.row == 1
                    && let Some(first) = cells.first_mut()
                    && let Some(stripped) = first.strip_prefix('\u{feff}')
                {
                    *first = stripped.to_string();
                }
                Ok(cells)
            }
            Err(err) => Err(IngestError::CsvParse {
                path: self.path.clone(),
                row: self.row,
                message: err.to_string(),
            }),
        };
        Some(item)
    }
}

/// Rewrites blank lines outside quoted fields to `""` so the csv reader
/// keeps them as rows instead of skipping them.
struct BlankLines<R> {
    inner: R,
    line: Vec<u8>,
    offset: usize,
    in_quotes: bool,
}

impl<R: BufRead> BlankLines<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            line: Vec::new(),
            offset: 0,
            in_quotes: false,
        }
    }

    fn fill_line(&mut self) -> io::Result<usize> {
        self.line.clear();
        self.offset = 0;
        let read = self.inner.read_until(b'\n', &mut self.line)?;
        if read == 0 {
            return Ok(0);
        }
        if !self.in_quotes && matches!(self.line.as_slice(), b"\n" | b"\r\n") {
            self.line = [b"\"\"".as_slice(), &self.line].concat();
        }
        // Escaped quotes come in pairs, so odd counts flip the state.
        let quotes = self.line.iter().filter(|&&byte| byte == b'"').count();
        if quotes % 2 == 1 {
            self.in_quotes = !self.in_quotes;
        }
        Ok(self.line.len())
    }
}

impl<R: BufRead> Read for BlankLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.offset == self.line.len() && self.fill_line()? == 0 {
            return Ok(0);
        }
        let pending = &self.line[self.offset..];
        let count = pending.len().min(buf.len());
        buf[..count].copy_from_slice(&pending[..count]);
        self.offset += count;
        Ok(count)
    }
}

/// Validate a delimiter and return its byte.
pub fn delimiter_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(IngestError::InvalidDelimiter {
            delimiter: delimiter.to_string(),
        }),
    }
}

fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> IngestError + '_ {
    move |source| IngestError::SourceRead {
        path: path.to_path_buf(),
        source,
    }
}

/// Reject UTF-16 sources, then rewind.
fn check_encoding(path: &Path, file: &mut File) -> Result<()> {
    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(read_error(path))?;
    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }
    file.seek(SeekFrom::Start(0)).map_err(read_error(path))?;
    Ok(())
}

/// Open `path` and iterate its rows split on `delimiter`.
///
/// Quoted fields follow the usual CSV rules; rows may have differing
/// lengths. A blank line yields `[""]`.
pub fn read_rows(path: &Path, delimiter: &str) -> Result<SourceRows> {
    let delimiter = delimiter_byte(delimiter)?;
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::SourceRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    check_encoding(path, &mut file)?;

    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(BlankLines::new(BufReader::new(file)));

    Ok(SourceRows {
        path: path.to_path_buf(),
        records: reader.into_records(),
        row: 0,
    })
}
