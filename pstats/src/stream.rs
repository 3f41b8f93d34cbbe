//! Input and output endpoints of a summary run.
//!
//! Both ends are either a named file or a standard stream, selected with
//! `-`. Handles are owned by the function using them and closed when it
//! returns, error or not. The output file is only created once the report
//! is complete, a failed run leaves no output file behind.

use std::{
    fmt,
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
    str::FromStr,
};

use pstats_capture::{parse, timeline::Timeline};
use tracing::{error, info};

use crate::{
    config::Options,
    report::{self, Report, Style},
};

/// Argument selecting a standard stream instead of a file.
pub const STANDARD_STREAM: &str = "-";

/// Errors produced by a summary run
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Opening the input failed
    #[error("Failed to open {path:?}: {source}")]
    Open {
        /// Input path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// Creating the output failed
    #[error("Failed to create {path:?}: {source}")]
    Create {
        /// Output path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// Reading the input failed
    #[error(transparent)]
    Parse(#[from] parse::Error),
    /// Building or writing the report failed
    #[error(transparent)]
    Report(#[from] report::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where impstats lines are read from.
pub enum Input {
    /// Standard input
    Stdin,
    /// A named file
    File(PathBuf),
}

impl Input {
    /// Name used for the input in messages.
    #[must_use]
    pub fn source_name(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }

    /// Read the whole input into a [`Timeline`].
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or read, or does not
    /// hold impstats lines. See [`parse::read`].
    pub fn read(&self) -> Result<Timeline, Error> {
        let source_name = self.source_name();
        let timeline = match self {
            Input::Stdin => parse::read(io::stdin().lock(), &source_name)?,
            Input::File(path) => {
                let file = File::open(path).map_err(|source| Error::Open {
                    path: path.clone(),
                    source: Box::new(source),
                })?;
                parse::read(BufReader::new(file), &source_name)?
            }
        };
        Ok(timeline)
    }
}

impl FromStr for Input {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err("input path must not be empty".to_string());
        }
        Ok(if input == STANDARD_STREAM {
            Input::Stdin
        } else {
            Input::File(PathBuf::from(input))
        })
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where the summary is written to.
pub enum Output {
    /// Standard output, pretty printed
    Stdout,
    /// A named file, compact
    File(PathBuf),
}

impl Output {
    /// Layout used for this destination.
    #[must_use]
    pub fn style(&self) -> Style {
        match self {
            Output::Stdout => Style::Pretty,
            Output::File(_) => Style::Compact,
        }
    }

    /// Write `report` to this destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be created or written. A file
    /// that was created but could not be fully written is removed.
    pub fn write(&self, report: &Report<'_>) -> Result<(), Error> {
        match self {
            Output::Stdout => report.write(io::stdout().lock(), self.style())?,
            Output::File(path) => {
                let file = File::create(path).map_err(|source| Error::Create {
                    path: path.clone(),
                    source: Box::new(source),
                })?;
                if let Err(err) = report.write(BufWriter::new(file), self.style()) {
                    remove_partial(path);
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }
}

fn remove_partial(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        error!("Failed to remove partial output {}: {err}", path.display());
    }
}

impl FromStr for Output {
    type Err = String;

    fn from_str(output: &str) -> Result<Self, Self::Err> {
        if output.is_empty() {
            return Err("output path must not be empty".to_string());
        }
        Ok(if output == STANDARD_STREAM {
            Output::Stdout
        } else {
            Output::File(PathBuf::from(output))
        })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => f.write_str("<stdout>"),
            Output::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Read `input`, summarise it according to `options` and write the result
/// to `output`.
///
/// # Errors
///
/// Returns an error if any stage fails. Nothing is written in that case.
pub fn summarise(input: &Input, output: &Output, options: &Options) -> Result<(), Error> {
    info!("Summarising {input} into {output} with {options:?}");
    let timeline = input.read()?;
    let report = Report::build(&timeline, options)?;
    output.write(&report)?;
    info!("Summary written to {output}");
    Ok(())
}
