use std::{
    error::Error as _,
    io::{self, BufWriter, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use inbatches::{config::DEFAULT_LIMIT, error::Error, Rows};
use tracing::{debug, info};

use crate::lines::LineBatch;

mod lines;


/// Prints a text file, reading it in batches of lines.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// The file to read.
    file: PathBuf,

    /// Lines requested per batch.
    #[arg(short, long, default_value_t = DEFAULT_LIMIT, value_parser = clap::value_parser!(u64).range(1..))]
    limit: u64,

    /// Prefix every line with its number.
    #[arg(short, long)]
    number: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Rows(#[from] Error<io::Error>),

    #[error("failed to write output")]
    Output(#[source] io::Error),
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing();

    match run(&args, BufWriter::new(io::stdout().lock())) {
        Ok(Summary { rows, batches }) => {
            eprintln!("{rows} rows in {batches} batches");
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!(?err, "command failed");
            eprint!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprint!(": {cause}");
                source = cause.source();
            }
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

/// What [`run`] read.
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    rows: u64,
    batches: u64,
}

/// Writes the lines of `args.file` to `out`, one batch at a time.
fn run<W: Write>(args: &Args, mut out: W) -> Result<Summary, CliError> {
    let mut rows = Rows::of(args.limit, |params| LineBatch::query(&args.file, params))?;

    let mut count = 0u64;
    while rows.advance() {
        let Some(line) = rows.row() else { continue };
        count += 1;
        let written = if args.number {
            writeln!(out, "{count:>6}\t{line}")
        } else {
            writeln!(out, "{line}")
        };
        written.map_err(CliError::Output)?;
    }
    out.flush().map_err(CliError::Output)?;

    let batches = rows.batches();
    rows.finish()?;
    info!(count, batches, "done");

    Ok(Summary {
        rows: count,
        batches,
    })
}

/// Sets up tracing subscriber.
fn setup_tracing() {
    use tracing_subscriber::{
        fmt::{format::FmtSpan, layer},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or("warn".into());
    let fmt_layer = layer()
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
