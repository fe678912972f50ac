//! Pointer-chasing results: runtime per access over the chased array size, one
//! chart per vendor group.
extern crate average;
#[macro_use]
extern crate error_chain;
extern crate evaluation;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate regex;
extern crate structopt;

use average::{Estimate, Mean};
use evaluation::chart::{Chart, GnuplotRenderer, Panel, Render, Series};
use evaluation::errors::*;
use evaluation::helper::{self, POINTER_CHASING_ACCESSES};
use evaluation::{loader, logger, MachineMap, PointerChasingRecord};
use itertools::Itertools;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use structopt::StructOpt;

/// Arrays above this size are listed in the summary.
const SUMMARY_MIN_BYTES: u64 = 16_000_000_000;

/// Only every n-th size keeps its tic label.
const TIC_STRIDE: usize = 6;

#[derive(StructOpt, Debug)]
#[structopt(name = "pointer_chasing", about = "Chart pointer-chasing runtimes")]
struct Opt {
    /// Directory holding the benchmark's `.csv` files.
    #[structopt(short = "d", long = "dir", default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Hostname to hardware label mapping; also lists the vendor groups.
    #[structopt(short = "m", long = "machines", default_value = "Machines.toml",
                parse(from_os_str))]
    machines: PathBuf,

    /// Where charts are written.
    #[structopt(short = "o", long = "out", default_value = ".", parse(from_os_str))]
    out: PathBuf,

    /// Run gnuplot on the generated scripts.
    #[structopt(short = "r", long = "render")]
    render: bool,
}

/// A measurement with its derived columns.
struct Access {
    machine: String,
    element_count: u64,
    size_in_bytes: u64,
    runtime_ns_per_element: f64,
}

impl<'a> From<&'a PointerChasingRecord> for Access {
    fn from(r: &'a PointerChasingRecord) -> Self {
        Access {
            machine: r.machine.clone(),
            element_count: r.element_count,
            size_in_bytes: r.size_in_bytes,
            runtime_ns_per_element: helper::runtime_per_element(r.runtime_ns, POINTER_CHASING_ACCESSES),
        }
    }
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let machines = MachineMap::init_or_default(&opt.machines)?;
    let paths = loader::discover(&opt.dir, &Regex::new(r"\.csv$")?)?;
    let records: Vec<PointerChasingRecord> = loader::load_all(&paths[..], &machines)?;
    let accesses = records.iter().map(Access::from).collect::<Vec<_>>();

    let renderer = GnuplotRenderer::new(&opt.out, opt.render);
    for keyword in machines.groups() {
        let group = accesses
            .iter()
            .filter(|a| a.machine.contains(keyword.as_str()))
            .collect::<Vec<_>>();
        if group.is_empty() {
            debug!("no machine matches {}", keyword);
            continue;
        }

        renderer.render(&group_chart(keyword, &group))?;

        println!("{}", keyword);
        for (machine, element_count, size, mean) in large_sizes(&group) {
            println!("{:<50} {:>14} {:>14} {:>10.3}", machine, element_count, size, mean);
        }
    }
    Ok(())
}

// Sizes are categorical on the x axis, ordered by bytes.
fn group_chart(keyword: &str, group: &[&Access]) -> Chart {
    let sizes = group
        .iter()
        .map(|a| a.size_in_bytes)
        .unique()
        .sorted()
        .collect::<Vec<_>>();
    let position = sizes
        .iter()
        .enumerate()
        .map(|(i, &s)| (s, i as f64))
        .collect::<BTreeMap<_, _>>();

    let mut chart = Chart::new(
        &format!("result_{}", keyword.replace(' ', "_")),
        "Data Size",
        "Runtime per element (ns)",
    );
    chart.title = keyword.to_string();
    chart.x_tics = sizes
        .iter()
        .enumerate()
        .filter(|&(i, _)| i % TIC_STRIDE == 0)
        .map(|(i, &s)| (i as f64, helper::size_label(s)))
        .collect();

    let series = group
        .iter()
        .map(|a| ((a.machine.clone(), a.size_in_bytes), a.runtime_ns_per_element))
        .into_group_map()
        .into_iter()
        .map(|((machine, size), values)| (machine, (position[&size], mean(&values))))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(machine, points)| Series::sorted(machine, points))
        .collect();
    chart.panels.push(Panel {
        title: String::new(),
        series: series,
    });
    chart
}

// Mean runtime per (machine, element count, size) above the summary threshold,
// fastest first.
fn large_sizes(group: &[&Access]) -> Vec<(String, u64, u64, f64)> {
    group
        .iter()
        .filter(|a| a.size_in_bytes > SUMMARY_MIN_BYTES)
        .map(|a| ((a.machine.clone(), a.element_count, a.size_in_bytes), a.runtime_ns_per_element))
        .into_group_map()
        .into_iter()
        .map(|((machine, count, size), values)| (machine, count, size, mean(&values)))
        .sorted_by(|a, b| a.3.partial_cmp(&b.3).unwrap_or(Ordering::Equal))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    let mut m = Mean::new();
    for &v in values {
        m.add(v);
    }
    m.mean()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(machine: &str, bytes: u64, ns: f64) -> Access {
        Access {
            machine: machine.to_string(),
            element_count: bytes / 8,
            size_in_bytes: bytes,
            runtime_ns_per_element: ns,
        }
    }

    #[test]
    fn summary_is_sorted_and_filtered() {
        let accesses = vec![
            access("AMD EPYC 7742 (cx17)", 32_000_000_000, 120.0),
            access("AMD EPYC 7742 (cx17)", 32_000_000_000, 100.0),
            access("AMD EPYC 7742 (cx18)", 32_000_000_000, 90.0),
            access("AMD EPYC 7742 (cx18)", 1024, 2.0),
        ];
        let group = accesses.iter().collect::<Vec<_>>();
        let summary = large_sizes(&group);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].0, "AMD EPYC 7742 (cx18)");
        assert_eq!(summary[1].3, 110.0);
    }

    #[test]
    fn every_sixth_size_is_labelled() {
        let accesses = (0..13)
            .map(|i| access("Apple M2 Max", 1024 << i, 1.0))
            .collect::<Vec<_>>();
        let group = accesses.iter().collect::<Vec<_>>();
        let chart = group_chart("Apple", &group);
        assert_eq!(chart.name, "result_Apple");
        let tics = chart.x_tics.iter().map(|t| t.0).collect::<Vec<_>>();
        assert_eq!(tics, vec![0.0, 6.0, 12.0]);
        assert_eq!(chart.x_tics[0].1, "1 KiB");
        assert_eq!(chart.panels[0].series[0].points.len(), 13);
    }
}
