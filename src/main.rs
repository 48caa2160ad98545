//! csvops: encoding-aware CSV transformation utility
//!
//! Usage: csvops [OPTIONS] <COMMAND>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::fs::File;
use std::io::{self, Read, StdoutLock};
use std::path::PathBuf;
use std::process;

use csvops::commands::{
    CatCommand, DataType, EmptyHandling, FilterCommand, HeadersCommand, SelectCommand,
    SortCommand, SortKeyPolicy, UniqCommand,
};
use csvops::config::{parse_symbol_list, IoOptions};
use csvops::logging::init_logging;
use csvops::streaming::{CsvReader, CsvWriter};

#[derive(Parser)]
#[command(name = "csvops")]
#[command(version)]
#[command(about = "Encoding-aware CSV transformations: select, filter, sort, uniq and re-encode", long_about = None)]
struct Cli {
    /// Input encoding: utf8, sjis or eucjp
    #[arg(long, global = true, default_value = "utf8")]
    input_encoding: String,

    /// Output encoding: utf8, utf8bom, sjis or eucjp (default: same as input)
    #[arg(long, global = true)]
    output_encoding: Option<String>,

    /// Treat the first row as data rather than a header
    #[arg(long, global = true)]
    no_header: bool,

    /// Number of threads to use for sorting (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only)
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a CSV unchanged, converting its encoding
    Cat {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Keep only the given columns
    #[command(visible_alias = "col")]
    Select {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Colon-separated column names or numbers, e.g. name:2:city
        #[arg(short, long)]
        columns: String,
    },

    /// Keep rows whose column equals a value
    Filter {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Column name or number to test
        #[arg(short, long)]
        column: String,

        /// Value the column must equal
        #[arg(long)]
        value: String,

        /// Drop matching rows instead of keeping them
        #[arg(long)]
        invert: bool,
    },

    /// Sort rows by one column
    Sort {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Column name or number to sort by
        #[arg(short, long)]
        column: String,

        /// Comparison: text or number
        #[arg(long = "type", default_value = "text")]
        data_type: String,

        /// Placement of empty keys: natural, first or last
        #[arg(long, default_value = "natural")]
        empty: String,

        /// Sort in descending order
        #[arg(short, long)]
        descending: bool,
    },

    /// Drop rows whose key columns repeat an earlier row
    Uniq {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Colon-separated key columns (default: the whole row)
        #[arg(short, long)]
        columns: Option<String>,
    },

    /// List column numbers and names
    Headers {
        /// Input CSV file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = cli.verbosity.tracing_level_filter();
    if let Err(e) = init_logging(level, !cli.verbosity.is_present()) {
        eprintln!("Error: cannot initialize logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("cannot initialize thread pool")?;
    }

    let options = IoOptions::new(
        &cli.input_encoding,
        cli.output_encoding.as_deref(),
        !cli.no_header,
    )?;

    match cli.command {
        Commands::Cat { input } => run_cat(&options, input),
        Commands::Select { input, columns } => run_select(&options, input, &columns),
        Commands::Filter {
            input,
            column,
            value,
            invert,
        } => run_filter(&options, input, &column, value, invert),
        Commands::Sort {
            input,
            column,
            data_type,
            empty,
            descending,
        } => run_sort(&options, input, &column, &data_type, &empty, descending),
        Commands::Uniq { input, columns } => run_uniq(&options, input, columns.as_deref()),
        Commands::Headers { input } => run_headers(&options, input),
    }
}

/// Open the input file, or stdin when absent or `-`.
fn open_input(input: Option<PathBuf>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Wire the input and stdout through the configured encodings and run `f`.
fn with_streams<F>(options: &IoOptions, input: Option<PathBuf>, f: F) -> Result<()>
where
    F: FnOnce(
        &mut CsvReader<Box<dyn Read>>,
        &mut CsvWriter<StdoutLock<'static>>,
    ) -> csvops::Result<()>,
{
    let mut reader = options.open_reader(open_input(input)?)?;
    let mut writer = options.open_writer(io::stdout().lock(), reader.bom_detected())?;
    f(&mut reader, &mut writer)?;
    Ok(())
}

fn run_cat(options: &IoOptions, input: Option<PathBuf>) -> Result<()> {
    let cmd = CatCommand::new().with_header(options.has_header);
    with_streams(options, input, |reader, writer| cmd.run(reader, writer).map(drop))
        .context("cannot run cat command")
}

fn run_select(options: &IoOptions, input: Option<PathBuf>, columns: &str) -> Result<()> {
    let cmd = SelectCommand::new(parse_symbol_list(columns)?, options.has_header)?;
    with_streams(options, input, |reader, writer| cmd.run(reader, writer).map(drop))
        .context("cannot run select command")
}

fn run_filter(
    options: &IoOptions,
    input: Option<PathBuf>,
    column: &str,
    value: String,
    invert: bool,
) -> Result<()> {
    let cmd = FilterCommand::new(column, value, options.has_header)?.with_invert(invert);
    with_streams(options, input, |reader, writer| cmd.run(reader, writer).map(drop))
        .context("cannot run filter command")
}

fn run_sort(
    options: &IoOptions,
    input: Option<PathBuf>,
    column: &str,
    data_type: &str,
    empty: &str,
    descending: bool,
) -> Result<()> {
    let policy = SortKeyPolicy {
        data_type: data_type.parse::<DataType>()?,
        empty: empty.parse::<EmptyHandling>()?,
        descending,
    };
    let cmd = SortCommand::new(column, policy, options.has_header)?;
    with_streams(options, input, |reader, writer| cmd.run(reader, writer))
        .context("cannot run sort command")
}

fn run_uniq(options: &IoOptions, input: Option<PathBuf>, columns: Option<&str>) -> Result<()> {
    let columns = columns.map(parse_symbol_list).transpose()?.unwrap_or_default();
    let cmd = UniqCommand::new(columns, options.has_header)?;
    with_streams(options, input, |reader, writer| cmd.run(reader, writer))
        .context("cannot run uniq command")
}

fn run_headers(options: &IoOptions, input: Option<PathBuf>) -> Result<()> {
    let cmd = HeadersCommand::new().with_header(options.has_header);
    with_streams(options, input, |reader, writer| cmd.run(reader, writer))
        .context("cannot run headers command")
}
