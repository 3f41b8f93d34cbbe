//! Options controlling what the summary contains.
//!
//! Options come from two places: an optional YAML file and command line
//! flags. The file supplies defaults, a flag given on the command line always
//! switches its option on. Both forms are plain booleans so merging is a
//! field-wise OR.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

/// Errors produced by [`Options`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Error reading config file
    #[error("Failed to read config file {path:?}: {source}")]
    ReadFile {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
/// What goes into the summary.
pub struct Options {
    /// Emit per metric statistics under `agg_stats`, along with the start,
    /// end and runtime of the whole input.
    pub aggregate_stats: bool,
    /// Include each metric's non-zero values in its statistics.
    pub show_values: bool,
    /// Include zero values as well, and report the non-zero statistics as
    /// `null` rather than omitting them for metrics that never left zero.
    pub show_zero_values: bool,
    /// Echo the parsed input under `original_stats`.
    pub original_stats: bool,
    /// Group the `original_stats` echo by timestamp instead of emitting one
    /// record per observation.
    pub no_flatten: bool,
}

impl Options {
    /// Parse options from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or names an unknown
    /// option.
    pub fn from_yaml(contents: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not hold valid
    /// options.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        Self::from_yaml(&contents)
    }

    /// Combine two option sets, an option is on if either side has it on.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            aggregate_stats: self.aggregate_stats || other.aggregate_stats,
            show_values: self.show_values || other.show_values,
            show_zero_values: self.show_zero_values || other.show_zero_values,
            original_stats: self.original_stats || other.original_stats,
            no_flatten: self.no_flatten || other.no_flatten,
        }
    }
}
