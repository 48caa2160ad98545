//! Library-level pipeline tests: reader, stages, writer and encodings
//! wired together the way the binary wires them.

use csvops::column::resolve_set;
use csvops::commands::{sort_rows, DataType, EmptyHandling, SortKeyPolicy};
use csvops::config::IoOptions;
use csvops::prelude::*;
use csvops::{read_table, resolve};

fn options(input: &str, output: Option<&str>) -> IoOptions {
    IoOptions::new(input, output, true).unwrap()
}

/// Run `stages` over `input` with the given options and return the raw output.
fn process<S: RecordStages>(options: &IoOptions, input: &[u8], stages: &mut S) -> Result<Vec<u8>> {
    let mut reader = options.open_reader(input)?;
    let mut writer = options.open_writer(Vec::new(), reader.bom_detected())?;
    RecordProcessor::new(options.has_header).run(&mut reader, &mut writer, stages)?;
    writer.into_inner()
}

struct NoOp;

impl RecordStages for NoOp {
    fn record(&mut self, row: Row) -> Result<Option<Row>> {
        Ok(Some(row))
    }
}

struct DropAll;

impl RecordStages for DropAll {
    fn record(&mut self, _row: Row) -> Result<Option<Row>> {
        Ok(None)
    }
}

/// Upper-cases one column, resolved from the header or, without one, in
/// `pre_body`.
struct Upper {
    symbol: &'static str,
    column: Option<ResolvedColumn>,
}

impl RecordStages for Upper {
    fn header(&mut self, header: Row) -> Result<Row> {
        self.column = Some(resolve(self.symbol, Some(header.as_slice()))?);
        Ok(header)
    }

    fn pre_body(&mut self) -> Result<()> {
        if self.column.is_none() {
            self.column = Some(resolve(self.symbol, None)?);
        }
        Ok(())
    }

    fn record(&mut self, mut row: Row) -> Result<Option<Row>> {
        if let Some(index) = self.column.as_ref().and_then(ResolvedColumn::index) {
            if let Some(field) = row.get_mut(index) {
                *field = field.to_uppercase();
            }
        }
        Ok(Some(row))
    }
}

// =============================================================================
// Record processor
// =============================================================================

#[test]
fn test_noop_stage_is_byte_identical() {
    let input = b"id,note\n1,\"a, b\"\n2,\"say \"\"hi\"\"\"\n3,\"two\nlines\"\n";
    let out = process(&IoOptions::default(), input, &mut NoOp).unwrap();
    assert_eq!(out, input.to_vec());
}

#[test]
fn test_drop_all_leaves_header() {
    let out = process(&IoOptions::default(), b"a,b\n1,2\n3,4\n", &mut DropAll).unwrap();
    assert_eq!(out, b"a,b\n".to_vec());
}

#[test]
fn test_stage_resolves_by_name_and_index() {
    let mut stages = Upper {
        symbol: "name",
        column: None,
    };
    let out = process(&IoOptions::default(), b"id,name\n1,alice\n", &mut stages).unwrap();
    assert_eq!(out, b"id,name\n1,ALICE\n".to_vec());

    let headerless = IoOptions::new("utf8", None, false).unwrap();
    let mut stages = Upper {
        symbol: "1",
        column: None,
    };
    let out = process(&headerless, b"1,alice\n2,bob\n", &mut stages).unwrap();
    assert_eq!(out, b"1,ALICE\n2,BOB\n".to_vec());
}

#[test]
fn test_ragged_row_stops_before_output() {
    let options = IoOptions::default();
    let mut reader = options.open_reader(&b"a,b\n1,2\n3\n4,5\n"[..]).unwrap();
    let mut writer = options.open_writer(Vec::new(), false).unwrap();
    let err = RecordProcessor::new(true)
        .run(&mut reader, &mut writer, &mut NoOp)
        .unwrap_err();
    assert!(matches!(err, CsvError::Read(_)));
    assert_eq!(writer.into_inner().unwrap(), b"a,b\n1,2\n".to_vec());
}

// =============================================================================
// Encodings
// =============================================================================

#[test]
fn test_bom_round_trip() {
    let forced = options("utf8", Some("utf8bom"));
    let written = process(&forced, b"a,b\n1,2\n", &mut NoOp).unwrap();
    assert!(written.starts_with(&[0xEF, 0xBB, 0xBF]));

    let mut reader = CsvReader::new(written.as_slice(), InputEncoding::Utf8).unwrap();
    assert!(reader.bom_detected());
    let table = read_table(&mut reader, true).unwrap();
    assert_eq!(table.headers, Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
}

#[test]
fn test_sjis_round_trip() {
    let text = "名前,都市\n山田,東京\n";
    let (sjis, _, unmappable) = encoding_rs::SHIFT_JIS.encode(text);
    assert!(!unmappable);

    let out = process(&options("sjis", None), &sjis, &mut NoOp).unwrap();
    assert_eq!(out, sjis.to_vec());

    let out = process(&options("sjis", Some("utf8")), &sjis, &mut NoOp).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), text);
}

#[test]
fn test_eucjp_to_sjis() {
    let text = "名前\n山田\n";
    let (eucjp, _, _) = encoding_rs::EUC_JP.encode(text);
    let (sjis, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    let out = process(&options("eucjp", Some("sjis")), &eucjp, &mut NoOp).unwrap();
    assert_eq!(out, sjis.to_vec());
}

#[test]
fn test_unmappable_output_fails() {
    let opts = options("utf8", Some("sjis"));
    let mut sink = Vec::new();
    {
        let mut reader = opts.open_reader("a\nok\n😀\n".as_bytes()).unwrap();
        let mut writer = opts.open_writer(&mut sink, false).unwrap();
        let err = RecordProcessor::new(true)
            .run(&mut reader, &mut writer, &mut NoOp)
            .unwrap_err();
        assert!(matches!(err, CsvError::Write(_)));
        assert!(writer.flush().is_err());
    }
    // Rows before the failure are written exactly once, even after the
    // retried flush and the writer's drop.
    assert_eq!(sink, b"a\nok\n".to_vec());
}

// =============================================================================
// Column resolution and sorting
// =============================================================================

#[test]
fn test_resolve_set_keeps_first_occurrence() {
    let header = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let set = resolve_set(&["b", "0", "b"], Some(header.as_slice())).unwrap();
    let pairs: Vec<(&str, Option<usize>)> = set.iter().map(|c| (c.label(), c.index())).collect();
    assert_eq!(pairs, vec![("b", Some(1)), ("a", Some(0))]);
}

#[test]
fn test_sort_scenarios() {
    let column = resolve("0", None).unwrap();
    let keys = ["2", "10", "", "1"];
    let cases = [
        (DataType::Text, EmptyHandling::Natural, false, ["", "1", "10", "2"]),
        (DataType::Number, EmptyHandling::Last, false, ["1", "2", "10", ""]),
        (DataType::Number, EmptyHandling::First, true, ["", "10", "2", "1"]),
    ];
    for (data_type, empty, descending, expected) in cases {
        let rows: Vec<Row> = keys.iter().map(|k| vec![k.to_string()]).collect();
        let policy = SortKeyPolicy {
            data_type,
            empty,
            descending,
        };
        let sorted = sort_rows(rows, &column, &policy).unwrap();
        let got: Vec<&str> = sorted.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(got, expected, "{data_type} {empty} descending={descending}");
    }
}
