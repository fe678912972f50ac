//! Chart description and rendering.
//!
//! A `Chart` is a grid of panels, each holding named line series. Rendering
//! goes through the `Render` trait; `GnuplotRenderer` writes a data file and a
//! gnuplot script next to each other and, if asked to, runs `gnuplot` on the
//! script to produce the PDF.

use errors::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// One line of a panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend entry.
    pub name: String,

    /// `(x, y)` pairs, drawn in order.
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Series with points sorted by x.
    pub fn sorted(name: String, mut points: Vec<(f64, f64)>) -> Series {
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(::std::cmp::Ordering::Equal));
        Series {
            name: name,
            points: points,
        }
    }
}

/// One plot area.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Panel {
    /// Title above the panel.
    pub title: String,

    /// Lines in the panel.
    pub series: Vec<Series>,
}

/// A set of panels sharing axis labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// File stem of every artifact.
    pub name: String,

    /// Title of the whole chart.
    pub title: String,

    /// X axis label.
    pub x_label: String,

    /// Y axis label.
    pub y_label: String,

    /// Use a base-2 logarithmic x axis.
    pub log2_x: bool,

    /// Custom x tics as `(position, label)`.
    pub x_tics: Vec<(f64, String)>,

    /// Panels per row.
    pub columns: usize,

    /// The panels, row by row.
    pub panels: Vec<Panel>,
}

impl Chart {
    /// An empty single-column chart.
    pub fn new(name: &str, x_label: &str, y_label: &str) -> Chart {
        Chart {
            name: name.to_string(),
            title: String::new(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            log2_x: false,
            x_tics: Vec::new(),
            columns: 1,
            panels: Vec::new(),
        }
    }

    /// Rows needed to lay out all panels.
    pub fn rows(&self) -> usize {
        let columns = ::std::cmp::max(1, self.columns);
        (self.panels.len() + columns - 1) / columns
    }

    /// Whether any panel has something to draw.
    pub fn is_empty(&self) -> bool {
        self.panels
            .iter()
            .all(|p| p.series.iter().all(|s| s.points.is_empty()))
    }
}

/// Name of a rendered artifact: `<kind>__<host>__<part>__<timestamp>`.
pub fn artifact_name(kind: &str, host: &str, part: &str, timestamp: i64) -> String {
    format!("{}__{}__{}__{}", kind, host, part, timestamp)
}

/// Turns a chart into files.
pub trait Render {
    /// Renders `chart`, returning the path of the main artifact.
    fn render(&self, chart: &Chart) -> Result<PathBuf>;
}

/// Renders through gnuplot scripts.
#[derive(Debug, Clone)]
pub struct GnuplotRenderer {
    /// Directory all files go to.
    pub out_dir: PathBuf,

    /// Run gnuplot after writing the script.
    pub invoke: bool,

    /// The gnuplot executable.
    pub program: String,
}

impl GnuplotRenderer {
    /// Renderer writing to `out_dir`.
    pub fn new<P: AsRef<Path>>(out_dir: P, invoke: bool) -> GnuplotRenderer {
        GnuplotRenderer {
            out_dir: out_dir.as_ref().to_path_buf(),
            invoke: invoke,
            program: "gnuplot".to_string(),
        }
    }

    fn write_data<W: Write>(&self, chart: &Chart, out: &mut W) -> Result<()> {
        for panel in &chart.panels {
            for series in &panel.series {
                writeln!(out, "# {} / {}", panel.title, series.name)?;
                for &(x, y) in &series.points {
                    writeln!(out, "{} {}", x, y)?;
                }
                // gnuplot separates index blocks with two blank lines
                writeln!(out)?;
                writeln!(out)?;
            }
        }
        Ok(())
    }

    fn write_script<W: Write>(&self, chart: &Chart, data: &Path, pdf: &Path, out: &mut W) -> Result<()> {
        let columns = ::std::cmp::max(1, chart.columns);
        let rows = ::std::cmp::max(1, chart.rows());
        writeln!(
            out,
            "set terminal pdfcairo enhanced size {}in,{}in",
            5 * columns,
            4 * rows
        )?;
        writeln!(out, "set output '{}'", quote(&pdf.to_string_lossy()))?;
        writeln!(out, "set key outside bottom center horizontal")?;
        writeln!(out, "set grid")?;
        writeln!(out, "set xlabel '{}'", quote(&chart.x_label))?;
        writeln!(out, "set ylabel '{}'", quote(&chart.y_label))?;
        if chart.log2_x {
            writeln!(out, "set logscale x 2")?;
        }
        if !chart.x_tics.is_empty() {
            let tics = chart
                .x_tics
                .iter()
                .map(|&(x, ref label)| format!("'{}' {}", quote(label), x))
                .collect::<Vec<_>>();
            writeln!(out, "set xtics rotate by 45 right ({})", tics.join(", "))?;
        }
        writeln!(
            out,
            "set multiplot layout {},{} title '{}'",
            rows,
            columns,
            quote(&chart.title)
        )?;

        let data = quote(&data.to_string_lossy());
        let mut index = 0;
        for panel in &chart.panels {
            writeln!(out, "set title '{}'", quote(&panel.title))?;
            let plots = panel
                .series
                .iter()
                .map(|series| {
                    let plot = format!(
                        "'{}' index {} using 1:2 with linespoints title '{}'",
                        data,
                        index,
                        quote(&series.name)
                    );
                    index += 1;
                    plot
                })
                .collect::<Vec<_>>();
            if plots.is_empty() {
                writeln!(out, "set multiplot next")?;
            } else {
                writeln!(out, "plot {}", plots.join(", \\\n     "))?;
            }
        }
        writeln!(out, "unset multiplot")?;
        Ok(())
    }
}

impl Render for GnuplotRenderer {
    fn render(&self, chart: &Chart) -> Result<PathBuf> {
        let data = self.out_dir.join(format!("{}.dat", chart.name));
        let script = self.out_dir.join(format!("{}.gp", chart.name));
        let pdf = self.out_dir.join(format!("{}.pdf", chart.name));
        fs::create_dir_all(&self.out_dir)
            .chain_err(|| format!("failed to create {:?}", self.out_dir))?;

        let mut out = BufWriter::new(File::create(&data)
            .chain_err(|| format!("failed to create {:?}", data))?);
        self.write_data(chart, &mut out)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(&script)
            .chain_err(|| format!("failed to create {:?}", script))?);
        self.write_script(chart, &data, &pdf, &mut out)?;
        out.flush()?;

        if !self.invoke {
            info!("wrote {:?}", script);
            return Ok(script);
        }

        debug!("{} {:?}", self.program, script);
        let status = Command::new(&self.program)
            .arg(&script)
            .status()
            .chain_err(|| ErrorKind::Render(format!("cannot run {}", self.program)))?;
        if !status.success() {
            bail!(ErrorKind::Render(format!("{} failed on {:?}: {}", self.program, script, status)));
        }
        info!("rendered {:?}", pdf);
        Ok(pdf)
    }
}

// gnuplot single-quoted strings escape a quote by doubling it.
fn quote(text: &str) -> String {
    text.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn chart() -> Chart {
        let mut chart = Chart::new("sorting__test", "Cores", "Million Tuples sorted per Second");
        chart.title = "nemea's sorts".to_string();
        chart.columns = 2;
        chart.panels.push(Panel {
            title: "250 Million Items (1 GB)".to_string(),
            series: vec![
                Series::sorted("Parallel std::sort".to_string(), vec![(4.0, 80.0), (1.0, 25.0)]),
                Series::sorted("Sequential std::sort".to_string(), vec![(1.0, 20.0)]),
            ],
        });
        chart.panels.push(Panel {
            title: "4000 Million Items (16 GB)".to_string(),
            series: vec![Series::sorted("Parallel std::sort".to_string(), vec![(1.0, 18.0)])],
        });
        chart
    }

    #[test]
    fn layout() {
        let mut c = chart();
        assert_eq!(c.rows(), 1);
        c.columns = 1;
        assert_eq!(c.rows(), 2);
        assert!(!c.is_empty());
        assert!(Chart::new("x", "a", "b").is_empty());
        assert_eq!(artifact_name("sorting", "nemea", "4cores", 17), "sorting__nemea__4cores__17");
    }

    #[test]
    fn writes_script_and_data() {
        let dir = env::temp_dir().join(format!("evaluation-chart-{}", ::std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let renderer = GnuplotRenderer::new(&dir, false);
        let script = renderer.render(&chart()).unwrap();
        assert_eq!(script, dir.join("sorting__test.gp"));

        let mut text = String::new();
        File::open(&script).unwrap().read_to_string(&mut text).unwrap();
        assert!(text.contains("set multiplot layout 1,2 title 'nemea''s sorts'"));
        assert!(text.contains("index 2 using 1:2"));
        assert!(!text.contains("logscale"));

        let mut data = String::new();
        File::open(dir.join("sorting__test.dat"))
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();
        let first_block = data.split("\n\n\n").next().unwrap();
        assert_eq!(
            first_block.lines().skip(1).collect::<Vec<_>>(),
            vec!["1 25", "4 80"]
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn creates_missing_out_dir() {
        let root = env::temp_dir().join(format!("evaluation-chart-out-{}", ::std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let renderer = GnuplotRenderer::new(root.join("charts"), false);
        let script = renderer.render(&chart()).unwrap();
        assert!(script.exists());
        assert!(root.join("charts").join("sorting__test.dat").exists());
        fs::remove_dir_all(&root).unwrap();
    }
}
