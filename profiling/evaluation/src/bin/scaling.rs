//! Charts sorting throughput over cores, with the sequential sort stretched to
//! a flat line and an idealized linearly scaling parallel sort for reference.
#[macro_use]
extern crate error_chain;
extern crate evaluation;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate regex;
extern crate structopt;

use evaluation::chart::{self, Chart, GnuplotRenderer, Panel, Render, Series};
use evaluation::errors::*;
use evaluation::scaling::{self, ScalingPoint, CORE_LIMITS};
use evaluation::{helper, loader, logger, MachineMap, RuntimeRecord};
use itertools::Itertools;
use regex::Regex;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "scaling", about = "Chart parallel scaling of the sort variants")]
struct Opt {
    /// Directory holding `results__<host>.csv` files.
    #[structopt(short = "d", long = "dir", default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Hostname to hardware label mapping.
    #[structopt(short = "m", long = "machines", default_value = "Machines.toml",
                parse(from_os_str))]
    machines: PathBuf,

    /// Where charts are written.
    #[structopt(short = "o", long = "out", default_value = ".", parse(from_os_str))]
    out: PathBuf,

    /// Variant measured on a single core only.
    #[structopt(long = "sequential", default_value = "Sequential std::sort")]
    sequential: String,

    /// Variant the linear projection is derived from.
    #[structopt(long = "parallel", default_value = "Parallel std::sort")]
    parallel: String,

    /// Run gnuplot on the generated scripts.
    #[structopt(short = "r", long = "render")]
    render: bool,
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let machines = MachineMap::init_or_default(&opt.machines)?;
    let pattern = Regex::new(r"^results__(?P<host>.+?)(?:__\d+)?\.csv(?:\.xz|\.gz)?$")?;
    let files = loader::discover_by_host(&opt.dir, &pattern)?;
    if files.is_empty() {
        bail!(ErrorKind::EmptyDataset(format!("{:?}", opt.dir)));
    }

    let renderer = GnuplotRenderer::new(&opt.out, opt.render);
    let timestamp = helper::timestamp();

    for (host, paths) in &files {
        let label = machines.label(host).unwrap_or(host).to_string();
        let records: Vec<RuntimeRecord> = loader::load_all(&paths[..], &machines)?;
        let measured = records.iter().map(ScalingPoint::from).collect::<Vec<_>>();
        let points = scaling::with_derived_series(measured, &opt.sequential, &opt.parallel);

        let sizes = points.iter().map(|p| p.dataset_size).unique().sorted().collect::<Vec<_>>();
        for &size in &sizes {
            let of_size = points
                .iter()
                .filter(|p| p.dataset_size == size)
                .cloned()
                .collect::<Vec<_>>();
            let mut single = Chart::new(
                &chart::artifact_name("out", host, &size.to_string(), timestamp),
                "Cores",
                "Million Tuples sorted per Second",
            );
            single.title = format!("{}: {}", label, helper::dataset_size_name(size, helper::SORT_ELEMENT_BYTES));
            single.panels.push(Panel {
                title: String::new(),
                series: throughput_series(&of_size),
            });
            renderer.render(&single)?;
        }

        for &(name, limit) in CORE_LIMITS.iter() {
            let limited = scaling::within_limit(&points, limit);
            let mut faceted = Chart::new(
                &chart::artifact_name("sorting", host, name, timestamp),
                "Cores",
                "Million Tuples sorted per Second",
            );
            faceted.title = label.clone();
            faceted.columns = sizes.len();
            faceted.panels = sizes
                .iter()
                .map(|&size| {
                    let of_size = limited
                        .iter()
                        .filter(|p| p.dataset_size == size)
                        .cloned()
                        .collect::<Vec<_>>();
                    Panel {
                        title: helper::dataset_size_name(size, helper::SORT_ELEMENT_BYTES),
                        series: throughput_series(&of_size),
                    }
                })
                .collect();
            if faceted.is_empty() {
                info!("{}: nothing to draw within {}", host, name);
                continue;
            }
            renderer.render(&faceted)?;
        }
    }
    Ok(())
}

// One series per variant, throughput over cores.
fn throughput_series(points: &[ScalingPoint]) -> Vec<Series> {
    points
        .iter()
        .map(|p| (p.variant.clone(), (p.core_count as f64, p.million_items_per_s())))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(variant, points)| Series::sorted(variant, points))
        .collect()
}
