//! Summaries of rsyslog impstats logs.
//!
//! This library supports the `pstats-summary` binary. A log is read into a
//! [`pstats_capture::timeline::Timeline`], re-partitioned per source and
//! metric by [`group`], reduced to per-metric statistics by [`aggregate`] and
//! emitted as a single JSON document by [`report`].

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::pedantic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
#![deny(clippy::dbg_macro)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod aggregate;
pub mod config;
pub mod group;
pub mod report;
pub mod stream;
