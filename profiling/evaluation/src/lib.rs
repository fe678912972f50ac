//! Loading, aggregation and charting of benchmark results.
//!
//! Result files are collected on many hosts and merged here: hostnames are
//! mapped to hardware labels (`machines`), files are discovered and
//! concatenated (`loader`), energy samples are reduced and joined with
//! runtimes (`energy`), scaling charts get their reference series
//! (`scaling`), and everything ends up as a `chart::Chart`.

#![recursion_limit = "1024"]
#![deny(missing_docs)]

extern crate chrono;
extern crate csv;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
extern crate flate2;
extern crate itertools;
extern crate libc;
#[macro_use]
extern crate log;
extern crate regex;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate toml;
extern crate xz2;

#[allow(missing_docs)]
pub mod errors;

pub mod chart;
pub mod energy;
pub mod helper;
pub mod loader;
pub mod logger;
pub mod machines;
pub mod record;
pub mod scaling;

pub use chart::{Chart, GnuplotRenderer, Panel, Render, Series};
pub use energy::{AggregatedRecord, Baselines, EnergyMedian, aggregate_energy, join_runtime_energy};
pub use machines::MachineMap;
pub use record::{EnergyRecord, Phase, PointerChasingRecord, PrefetchRecord, RuntimeRecord};
pub use scaling::ScalingPoint;
