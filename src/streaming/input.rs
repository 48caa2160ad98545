//! Row-tokenizing reader over a decoded byte stream.

use super::buffers::DEFAULT_INPUT_BUFFER;
use super::encoding::{DecodingReader, InputEncoding};
use crate::table::{CsvError, Result, Row};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A streaming CSV reader in any supported input encoding.
///
/// Every row is returned as-is, including the header: header handling belongs
/// to the record processor and the table helpers. Rows must all have the same
/// width; a ragged row is a [`CsvError::Read`].
pub struct CsvReader<R: Read> {
    reader: csv::Reader<DecodingReader<R>>,
    record: csv::StringRecord,
    bom_detected: bool,
    rows_read: u64,
}

impl CsvReader<File> {
    /// Open a CSV file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P, encoding: InputEncoding) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file, encoding)
    }
}

impl<R: Read> CsvReader<R> {
    /// Create a reader from any byte source.
    ///
    /// For UTF-8 the first three bytes are inspected for a BOM before the
    /// tokenizer sees anything.
    pub fn new(input: R, encoding: InputEncoding) -> Result<Self> {
        Self::with_capacity(input, encoding, DEFAULT_INPUT_BUFFER)
    }

    /// Create a reader with a custom tokenizer buffer capacity.
    pub fn with_capacity(input: R, encoding: InputEncoding, capacity: usize) -> Result<Self> {
        let decoded = DecodingReader::new(input, encoding)?;
        let bom_detected = decoded.bom_detected();
        if bom_detected {
            tracing::debug!("utf-8 byte order mark detected on input");
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .buffer_capacity(capacity)
            .from_reader(decoded);

        Ok(Self {
            reader,
            record: csv::StringRecord::new(),
            bom_detected,
            rows_read: 0,
        })
    }

    /// Whether the input started with a UTF-8 BOM.
    pub fn bom_detected(&self) -> bool {
        self.bom_detected
    }

    /// Number of rows read so far, header included.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Read the next row, or `None` at end of input.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                Ok(Some(self.record.iter().map(str::to_owned).collect()))
            }
            Ok(false) => Ok(None),
            Err(e) => Err(CsvError::Read(e)),
        }
    }

    /// Iterate over the remaining rows.
    pub fn rows(&mut self) -> RowIter<'_, R> {
        RowIter { reader: self }
    }
}

/// Iterator over CSV rows.
pub struct RowIter<'a, R: Read> {
    reader: &'a mut CsvReader<R>,
}

impl<R: Read> Iterator for RowIter<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rows() {
        let mut reader = CsvReader::new(&b"a,b\n1,2\n"[..], InputEncoding::Utf8).unwrap();

        assert_eq!(reader.read_row().unwrap(), Some(vec!["a".into(), "b".into()]));
        assert_eq!(reader.read_row().unwrap(), Some(vec!["1".into(), "2".into()]));
        assert_eq!(reader.read_row().unwrap(), None);
        assert_eq!(reader.rows_read(), 2);
    }

    #[test]
    fn test_quoted_fields() {
        let mut reader =
            CsvReader::new(&b"\"a,b\",\"say \"\"hi\"\"\"\n"[..], InputEncoding::Utf8).unwrap();
        let row = reader.read_row().unwrap().unwrap();
        assert_eq!(row, vec!["a,b", "say \"hi\""]);
    }

    #[test]
    fn test_bom_is_not_part_of_first_field() {
        let mut reader =
            CsvReader::new(&b"\xEF\xBB\xBFid,name\n"[..], InputEncoding::Utf8).unwrap();
        assert!(reader.bom_detected());
        assert_eq!(reader.read_row().unwrap().unwrap()[0], "id");
    }

    #[test]
    fn test_ragged_row_error() {
        let mut reader = CsvReader::new(&b"a,b\n1,2\n3\n"[..], InputEncoding::Utf8).unwrap();
        let mut rows = reader.rows();

        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_ok());
        assert!(matches!(rows.next(), Some(Err(CsvError::Read(_)))));
    }

    #[test]
    fn test_invalid_utf8_is_read_error() {
        let mut reader = CsvReader::new(&b"a,\xFF\n"[..], InputEncoding::Utf8).unwrap();
        assert!(matches!(reader.read_row(), Err(CsvError::Read(_))));
    }

    #[test]
    fn test_shift_jis_rows() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("氏名,住所\n鈴木,東京\n");
        let mut reader = CsvReader::new(&encoded[..], InputEncoding::ShiftJis).unwrap();
        let rows = reader.rows().collect::<Result<Vec<_>>>().unwrap();

        assert_eq!(rows, vec![vec!["氏名", "住所"], vec!["鈴木", "東京"]]);
    }
}
