//! Sweep: drives a sort benchmark over variants, dataset sizes and core
//! counts while measuring runtime and energy.
//!
//! The benchmark is an external program. It is compiled once per (variant,
//! dataset size), wrapped in an energy tool (`perf stat` or `turbostat`),
//! pinned to cores or a NUMA node, and its output is parsed for the runtime
//! and energy markers. Results are written as CSV files that the `evaluation`
//! crate reads.
#![recursion_limit = "1024"]
#![deny(missing_docs)]

extern crate average;
extern crate csv;
#[macro_use]
extern crate error_chain;
extern crate evaluation;
#[macro_use]
extern crate itertools;
extern crate libc;
#[macro_use]
extern crate log;
extern crate num_cpus;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;

#[allow(missing_docs)]
pub mod errors;

pub mod command;
pub mod compile;
pub mod host;
pub mod meter;
pub mod orchestrator;
pub mod output;
pub mod parse;
pub mod schedule;
pub mod setting;

pub use command::{Invocation, Launcher, Pinning, SystemLauncher};
pub use meter::{EnergyMeter, Perf, Turbostat};
pub use orchestrator::{PinnedSummary, Sweep, SweepResult};
pub use setting::{Setting, Toolchain};
