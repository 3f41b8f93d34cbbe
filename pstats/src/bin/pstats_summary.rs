//! Summarise results from rsyslog impstats in JSON format.

use std::path::PathBuf;

use clap::Parser;
use pstats::{
    config::{self, Options},
    stream::{self, Input, Output},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[clap(
    version,
    about = "Process results from rsyslog impstats in JSON format.",
    long_about = None,
    after_help = "Summarised output is added at the end. The default is to print a timestamp for every stat (flattened) format."
)]
struct Args {
    /// impstats log to read, `-` for stdin
    #[clap(short, long = "input-rsyslog-pstats-file", default_value = "-")]
    input: Input,

    /// where to write the summary, `-` for stdout
    #[clap(short, long = "output-summary-json-file", default_value = "-")]
    output: Output,

    /// show overall statistics grouped per metric in the 'agg_stats' key
    #[clap(short, long)]
    aggregate_stats: bool,

    /// list the metric values within the 'agg_stats' key
    #[clap(short = 'v', long)]
    show_values: bool,

    /// show zero or null values within the 'agg_stats' key
    #[clap(short = '0', long)]
    show_zero_values: bool,

    /// output an 'original_stats' key that includes the original stats, always shows zero values
    #[clap(short = 's', long)]
    original_stats: bool,

    /// group stats per timestamp and don't flatten output
    #[clap(short, long)]
    no_flatten: bool,

    /// YAML file providing default options
    #[clap(long)]
    config_path: Option<PathBuf>,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            aggregate_stats: self.aggregate_stats,
            show_values: self.show_values,
            show_zero_values: self.show_zero_values,
            original_stats: self.original_stats,
            no_flatten: self.no_flatten,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Failed to load options: {0}")]
    Config(#[from] config::Error),
    #[error(transparent)]
    Stream(#[from] stream::Error),
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .finish()
        .init();

    let args = Args::parse();
    info!("Starting pstats-summary {}", env!("CARGO_PKG_VERSION"));

    let mut options = args.options();
    if let Some(config_path) = &args.config_path {
        options = Options::load(config_path)?.merge(options);
    }

    if let Err(err) = stream::summarise(&args.input, &args.output, &options) {
        error!("{err}");
        return Err(err.into());
    }
    Ok(())
}
