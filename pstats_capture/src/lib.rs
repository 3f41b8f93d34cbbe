//! Crate regarding rsyslog's impstats log files
//!
//! rsyslog periodically writes its internal counters as one JSON object per
//! line, prefixed with a fixed width date header and, optionally, a `@cee:`
//! tag. This crate turns such a stream into an ordered [`timeline::Timeline`]
//! of observations; grouping and aggregation live in the `pstats` crate.

#![deny(clippy::all)]
#![deny(clippy::cargo)]
#![deny(clippy::perf)]
#![deny(clippy::suspicious)]
#![deny(clippy::complexity)]
#![deny(unused_extern_crates)]
#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions)]

pub mod parse;
pub mod timeline;
pub mod value;
