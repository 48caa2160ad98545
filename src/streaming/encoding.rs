//! Encoding gateway: byte-level transcoding between the supported encodings
//! and the UTF-8 the CSV tokenizer works on.
//!
//! Input side: [`DecodingReader`] strips a UTF-8 BOM (recording that it saw
//! one) or decodes Shift_JIS / EUC-JP into UTF-8. Output side:
//! [`EncodingWriter`] optionally emits a BOM and encodes UTF-8 back into the
//! target encoding.

use super::buffers::{DECODE_CHUNK, ENCODE_CHUNK};
use crate::table::CsvError;
use encoding_rs::{CoderResult, Decoder, Encoder, EncoderResult, Encoding};
use std::fmt;
use std::io::{self, Read, Write};
use std::str::FromStr;

/// The UTF-8 byte-order mark.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Encodings accepted for input streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputEncoding {
    #[default]
    Utf8,
    ShiftJis,
    EucJp,
}

impl InputEncoding {
    /// Name as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::ShiftJis => "sjis",
            Self::EucJp => "eucjp",
        }
    }

    pub fn encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 => encoding_rs::UTF_8,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::EucJp => encoding_rs::EUC_JP,
        }
    }
}

impl FromStr for InputEncoding {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "utf8" => Ok(Self::Utf8),
            "sjis" => Ok(Self::ShiftJis),
            "eucjp" => Ok(Self::EucJp),
            _ => Err(CsvError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encodings accepted for output streams. `Utf8Bom` forces a BOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    ShiftJis,
    EucJp,
}

impl OutputEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Utf8Bom => "utf8bom",
            Self::ShiftJis => "sjis",
            Self::EucJp => "eucjp",
        }
    }

    pub fn encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 | Self::Utf8Bom => encoding_rs::UTF_8,
            Self::ShiftJis => encoding_rs::SHIFT_JIS,
            Self::EucJp => encoding_rs::EUC_JP,
        }
    }

    /// True for the UTF-8 targets, the only ones a BOM applies to.
    pub fn is_utf8(self) -> bool {
        matches!(self, Self::Utf8 | Self::Utf8Bom)
    }
}

impl From<InputEncoding> for OutputEncoding {
    fn from(input: InputEncoding) -> Self {
        match input {
            InputEncoding::Utf8 => Self::Utf8,
            InputEncoding::ShiftJis => Self::ShiftJis,
            InputEncoding::EucJp => Self::EucJp,
        }
    }
}

impl FromStr for OutputEncoding {
    type Err = CsvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.to_ascii_lowercase().as_str() {
            "utf8bom" => Ok(Self::Utf8Bom),
            other => other.parse::<InputEncoding>().map(Self::from),
        };
        parsed.map_err(|_| CsvError::UnsupportedEncoding(s.to_string()))
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replays a few already-consumed bytes before reading on from the source.
struct Replay<R> {
    head: Vec<u8>,
    pos: usize,
    inner: R,
}

impl<R: Read> Read for Replay<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.head.len() {
            let n = (self.head.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.head[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        self.inner.read(buf)
    }
}

/// Reader yielding UTF-8 bytes from a source in any [`InputEncoding`].
pub struct DecodingReader<R: Read> {
    source: Replay<R>,
    /// `None` for UTF-8 input, which is passed through untouched.
    decoder: Option<Decoder>,
    bom_detected: bool,
    in_buf: Vec<u8>,
    in_pos: usize,
    in_len: usize,
    out_buf: Vec<u8>,
    out_pos: usize,
    out_len: usize,
    eof: bool,
    finished: bool,
    malformed: bool,
}

impl<R: Read> DecodingReader<R> {
    /// Wrap `inner`. For UTF-8 this peeks (and drops) a leading BOM.
    pub fn new(inner: R, encoding: InputEncoding) -> io::Result<Self> {
        let mut source = Replay {
            head: Vec::new(),
            pos: 0,
            inner,
        };
        let (decoder, bom_detected) = match encoding {
            InputEncoding::Utf8 => (None, peek_bom(&mut source)?),
            other => (
                Some(other.encoding().new_decoder_without_bom_handling()),
                false,
            ),
        };

        Ok(Self {
            source,
            decoder,
            bom_detected,
            in_buf: vec![0; DECODE_CHUNK],
            in_pos: 0,
            in_len: 0,
            out_buf: vec![0; DECODE_CHUNK * 2],
            out_pos: 0,
            out_len: 0,
            eof: false,
            finished: false,
            malformed: false,
        })
    }

    /// Whether a UTF-8 BOM was found (and removed) at the start of the input.
    pub fn bom_detected(&self) -> bool {
        self.bom_detected
    }
}

/// Read up to three bytes; keep them for replay unless they are exactly a BOM.
fn peek_bom<R: Read>(source: &mut Replay<R>) -> io::Result<bool> {
    let mut head = [0u8; 3];
    let mut filled = 0;
    while filled < head.len() {
        match source.inner.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if head[..filled] == UTF8_BOM {
        return Ok(true);
    }
    source.head = head[..filled].to_vec();
    Ok(false)
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(decoder) = self.decoder.as_mut() else {
            return self.source.read(buf);
        };

        loop {
            if self.out_pos < self.out_len {
                let n = (self.out_len - self.out_pos).min(buf.len());
                buf[..n].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }

            if self.in_pos == self.in_len && !self.eof {
                self.in_len = self.source.read(&mut self.in_buf)?;
                self.in_pos = 0;
                self.eof = self.in_len == 0;
            }

            let (result, read, written, had_errors) = decoder.decode_to_utf8(
                &self.in_buf[self.in_pos..self.in_len],
                &mut self.out_buf,
                self.eof,
            );
            self.in_pos += read;
            self.out_pos = 0;
            self.out_len = written;

            if had_errors && !self.malformed {
                self.malformed = true;
                tracing::warn!(
                    encoding = decoder.encoding().name(),
                    "input contains malformed byte sequences; replaced with U+FFFD"
                );
            }
            if self.eof && result == CoderResult::InputEmpty {
                self.finished = true;
            }
        }
    }
}

/// Writer encoding UTF-8 bytes into an [`OutputEncoding`], with optional BOM.
pub struct EncodingWriter<W: Write> {
    inner: W,
    /// `None` for UTF-8 output, which is passed through untouched.
    encoder: Option<Encoder>,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last write.
    pending: Vec<u8>,
    scratch: Vec<u8>,
    /// Set once encoding fails; every later write is refused.
    failed: bool,
}

impl<W: Write> EncodingWriter<W> {
    /// Wrap `inner`, writing the BOM immediately when `bom` is set and the
    /// target is UTF-8. The flag is ignored for other targets.
    pub fn new(mut inner: W, encoding: OutputEncoding, bom: bool) -> io::Result<Self> {
        let encoder = if encoding.is_utf8() {
            if bom || encoding == OutputEncoding::Utf8Bom {
                inner.write_all(&UTF8_BOM)?;
            }
            None
        } else {
            Some(encoding.encoding().new_encoder())
        };

        Ok(Self {
            inner,
            encoder,
            pending: Vec::new(),
            scratch: vec![0; ENCODE_CHUNK],
            failed: false,
        })
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for EncodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(encoder) = self.encoder.as_mut() else {
            return self.inner.write(buf);
        };

        if self.failed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "output encoding already failed",
            ));
        }

        self.pending.extend_from_slice(buf);
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                self.failed = true;
                self.pending.clear();
                return Err(io::Error::new(io::ErrorKind::InvalidData, e));
            }
        };
        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let (consumed, result) = encode_str(encoder, text, &mut self.scratch, &mut self.inner);

        // The encoded prefix is already in `inner`; a retry must not emit it again.
        if let Err(e) = result {
            self.failed = true;
            self.pending.clear();
            return Err(e);
        }
        self.pending.drain(..consumed);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Encode `text` into `out`, returning how many bytes of `text` were consumed
/// alongside the outcome.
fn encode_str<W: Write>(
    encoder: &mut Encoder,
    text: &str,
    scratch: &mut [u8],
    out: &mut W,
) -> (usize, io::Result<()>) {
    let mut consumed = 0;
    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(&text[consumed..], scratch, false);
        if let Err(e) = out.write_all(&scratch[..written]) {
            return (consumed, Err(e));
        }
        consumed += read;

        match result {
            EncoderResult::InputEmpty => return (consumed, Ok(())),
            EncoderResult::OutputFull => continue,
            EncoderResult::Unmappable(c) => {
                let err = io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "character {:?} cannot be represented in {}",
                        c,
                        encoder.encoding().name()
                    ),
                );
                return (consumed, Err(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(bytes: &[u8], encoding: InputEncoding) -> (String, bool) {
        let mut reader = DecodingReader::new(bytes, encoding).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        (out, reader.bom_detected())
    }

    #[test]
    fn test_parse_encoding_names() {
        assert_eq!("utf8".parse::<InputEncoding>().unwrap(), InputEncoding::Utf8);
        assert_eq!("sjis".parse::<InputEncoding>().unwrap(), InputEncoding::ShiftJis);
        assert_eq!("EUCJP".parse::<InputEncoding>().unwrap(), InputEncoding::EucJp);
        assert!("utf8bom".parse::<InputEncoding>().is_err());
        assert!("latin1".parse::<InputEncoding>().is_err());

        assert_eq!(
            "utf8bom".parse::<OutputEncoding>().unwrap(),
            OutputEncoding::Utf8Bom
        );
        assert_eq!("sjis".parse::<OutputEncoding>().unwrap(), OutputEncoding::ShiftJis);
        assert!(matches!(
            "cp1252".parse::<OutputEncoding>(),
            Err(CsvError::UnsupportedEncoding(name)) if name == "cp1252"
        ));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let (text, bom) = decode_all(b"\xEF\xBB\xBFa,b\n", InputEncoding::Utf8);
        assert!(bom);
        assert_eq!(text, "a,b\n");
    }

    #[test]
    fn test_utf8_without_bom_is_untouched() {
        let (text, bom) = decode_all(b"a,b\n", InputEncoding::Utf8);
        assert!(!bom);
        assert_eq!(text, "a,b\n");
    }

    #[test]
    fn test_short_utf8_input() {
        let (text, bom) = decode_all(b"a", InputEncoding::Utf8);
        assert!(!bom);
        assert_eq!(text, "a");

        let (text, bom) = decode_all(b"", InputEncoding::Utf8);
        assert!(!bom);
        assert_eq!(text, "");
    }

    #[test]
    fn test_bom_only_detected_for_utf8() {
        // In Shift_JIS these bytes are not a BOM and must not be dropped silently.
        let (text, bom) = decode_all(b"\xEF\xBB\xBFa", InputEncoding::ShiftJis);
        assert!(!bom);
        assert!(text.ends_with('a'));
    }

    #[test]
    fn test_decode_shift_jis() {
        let (encoded, _, _) = encoding_rs::SHIFT_JIS.encode("名前,年齢\n山田,30\n");
        let (text, _) = decode_all(&encoded, InputEncoding::ShiftJis);
        assert_eq!(text, "名前,年齢\n山田,30\n");
    }

    #[test]
    fn test_decode_euc_jp() {
        let (encoded, _, _) = encoding_rs::EUC_JP.encode("東京,大阪\n");
        let (text, _) = decode_all(&encoded, InputEncoding::EucJp);
        assert_eq!(text, "東京,大阪\n");
    }

    #[test]
    fn test_encode_shift_jis_split_writes() {
        let mut writer =
            EncodingWriter::new(Vec::new(), OutputEncoding::ShiftJis, true).unwrap();
        let bytes = "漢字,かな\n".as_bytes();
        // Split inside the first multi-byte character.
        writer.write_all(&bytes[..1]).unwrap();
        writer.write_all(&bytes[1..]).unwrap();
        writer.flush().unwrap();

        let (expected, _, _) = encoding_rs::SHIFT_JIS.encode("漢字,かな\n");
        assert_eq!(writer.into_inner(), expected.into_owned());
    }

    #[test]
    fn test_unmappable_character_is_error() {
        let mut writer = EncodingWriter::new(Vec::new(), OutputEncoding::EucJp, false).unwrap();
        let err = writer.write_all("😀".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_unmappable_poisons_writer() {
        let mut writer = EncodingWriter::new(Vec::new(), OutputEncoding::ShiftJis, false).unwrap();
        assert!(writer.write_all("ok\n🦀\n".as_bytes()).is_err());
        assert_eq!(writer.get_ref().as_slice(), b"ok\n");

        // A retry of the same bytes emits nothing more.
        assert!(writer.write_all("ok\n🦀\n".as_bytes()).is_err());
        assert!(writer.write_all(b"more\n").is_err());
        assert_eq!(writer.into_inner(), b"ok\n".to_vec());
    }

    /// Over 100 KB of mixed kanji and half-width katakana. The katakana run
    /// grows 1 byte to 3 when decoded, so a full input chunk overflows the
    /// decode buffer.
    fn large_japanese_text() -> String {
        let mut text = "ｱ".repeat(20_000);
        text.push('\n');
        for i in 0..30_000 {
            text.push_str(if i % 7 == 0 { "漢ｶ,\n" } else { "ｱ漢" });
        }
        text
    }

    #[test]
    fn test_large_shift_jis_decode() {
        let text = large_japanese_text();
        let (sjis, _, unmappable) = encoding_rs::SHIFT_JIS.encode(&text);
        assert!(!unmappable);
        assert!(sjis.len() > 100 * 1024);

        let mut reader = DecodingReader::new(&sjis[..], InputEncoding::ShiftJis).unwrap();
        let mut decoded = Vec::new();
        let mut buf = [0u8; 1021];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            decoded.extend_from_slice(&buf[..n]);
        }

        let (expected, _) = encoding_rs::SHIFT_JIS.decode_without_bom_handling(&sjis);
        assert_eq!(String::from_utf8(decoded).unwrap(), expected);
    }

    #[test]
    fn test_large_encode_in_odd_chunks() {
        let text = large_japanese_text();
        for encoding in [OutputEncoding::ShiftJis, OutputEncoding::EucJp] {
            let mut writer = EncodingWriter::new(Vec::new(), encoding, false).unwrap();
            // 4093 is prime, so chunk edges land inside multi-byte characters.
            for chunk in text.as_bytes().chunks(4093) {
                writer.write_all(chunk).unwrap();
            }
            writer.flush().unwrap();

            let (expected, _, _) = encoding.encoding().encode(&text);
            assert_eq!(writer.into_inner(), expected.into_owned(), "{encoding}");
        }
    }

    #[test]
    fn test_bom_written_for_utf8_targets() {
        let writer = EncodingWriter::new(Vec::new(), OutputEncoding::Utf8, true).unwrap();
        assert_eq!(writer.get_ref().as_slice(), &UTF8_BOM);

        let writer = EncodingWriter::new(Vec::new(), OutputEncoding::Utf8Bom, false).unwrap();
        assert_eq!(writer.get_ref().as_slice(), &UTF8_BOM);

        let writer = EncodingWriter::new(Vec::new(), OutputEncoding::Utf8, false).unwrap();
        assert!(writer.get_ref().is_empty());

        let writer = EncodingWriter::new(Vec::new(), OutputEncoding::ShiftJis, true).unwrap();
        assert!(writer.get_ref().is_empty());
    }
}
