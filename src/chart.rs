// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Grouped bar chart of the report, drawn by gnuplot.
//!
//! [`ChartSpec`] is a plain description of the chart: one series per metric,
//! each shifted sideways inside a revision's group so that the bars sit next
//! to each other and the whole group is centred on the revision's tick.
//! [`Gnuplot`] turns the description into a script plus one data file per
//! series in a temporary directory and runs gnuplot on it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use tempfile::TempDir;

use crate::error::ChartError;
use crate::parse::MetricType;
use crate::reduce::ReducedSnapshot;

pub const PALETTE: [&str; 10] = [
    "#00cc00", "#00ffff", "#ff00ff", "#0033ff", "#ff3333", "#ffff00", "#ffff33", "#33ff33",
    "#3300ff", "#3366ff",
];

/// Fraction of a tick slot shared by all bars of one revision.
const GROUP_WIDTH: f64 = 0.7;

pub const DEFAULT_OUTPUT: &str = "bench.png";

#[derive(Clone, Debug, PartialEq)]
pub struct ChartOptions {
    pub bar_width: Option<f64>,
    pub y_max: Option<f64>,
    pub output: PathBuf,
    /// Values are ratios rather than timings.
    pub normalized: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            bar_width: None,
            y_max: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            normalized: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub label: String,
    /// `None` when the revision has no result for this metric.
    pub value: Option<f64>,
    pub annotation: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub title: String,
    pub offset: f64,
    pub color: &'static str,
    /// Only one series prints the revision labels on the x axis.
    pub tick_labels: bool,
    pub points: Vec<Point>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChartSpec {
    pub series: Vec<Series>,
    pub bar_width: f64,
    pub y_max: Option<f64>,
    pub normalized: bool,
    pub output: PathBuf,
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl ChartSpec {
    pub fn build(metrics: &[MetricType], snapshots: &[ReducedSnapshot], options: &ChartOptions) -> ChartSpec {
        let count = metrics.len();
        let bar_width = options
            .bar_width
            .unwrap_or(GROUP_WIDTH / count.max(1) as f64);
        let first_offset = -((count as f64 - 1.0) / 2.0) * bar_width;

        let series = metrics
            .iter()
            .enumerate()
            .map(|(idx, metric)| Series {
                title: metric.to_string(),
                offset: first_offset + idx as f64 * bar_width,
                color: PALETTE[idx % PALETTE.len()],
                tick_labels: idx == count / 2,
                points: snapshots
                    .iter()
                    .map(|s| {
                        let trial = s.get(metric);
                        Point {
                            label: s.label.clone(),
                            value: trial.map(|t| t.value),
                            annotation: trial.map(|t| t.annotation.clone()).unwrap_or_default(),
                        }
                    })
                    .collect(),
            })
            .collect();

        ChartSpec {
            series,
            bar_width,
            y_max: options.y_max,
            normalized: options.normalized,
            output: options.output.clone(),
        }
    }

    /// One line per revision: quoted label, value, annotation. Missing
    /// values are drawn as zero-height bars to keep the rows aligned.
    pub fn write_data<W: Write>(series: &Series, out: &mut W) -> io::Result<()> {
        for point in &series.points {
            writeln!(
                out,
                "{}\t{}\t{}",
                quote(&point.label),
                point.value.unwrap_or(0.0),
                point.annotation
            )?;
        }
        Ok(())
    }

    /// The gnuplot script, reading series `i` from `data_files[i]`.
    pub fn script(&self, data_files: &[PathBuf]) -> String {
        let (y_label, y_tics) = if self.normalized {
            ("ratio", "auto")
        } else {
            ("sec", "5")
        };
        let mut lines = vec![
            "set terminal png small size 600,800".to_string(),
            format!("set output {}", quote(&self.output.to_string_lossy())),
            format!("set ylabel {}", quote(y_label)),
            format!("set ytics {y_tics}"),
            "set mytics 5".to_string(),
            "set grid y".to_string(),
            "set xtics auto font \"DejaVuSansMono,8\"".to_string(),
            "set xtics rotate by -90".to_string(),
            "set style data boxes".to_string(),
            "set style fill solid 0.2".to_string(),
            format!("set boxwidth {} relative", self.bar_width - 0.01),
        ];
        if let Some(y_max) = self.y_max {
            lines.push(format!("set yrange [0:{y_max}]"));
        }

        let plots: Vec<String> = self
            .series
            .iter()
            .zip(data_files)
            .map(|(series, file)| {
                let ticks = if series.tick_labels { ":xticlabels(1)" } else { "" };
                format!(
                    "{} using ($0+{}):2{ticks} title {} lc rgb {} fs solid 0.5",
                    quote(&file.to_string_lossy()),
                    series.offset,
                    quote(&series.title),
                    quote(series.color)
                )
            })
            .collect();
        lines.push(format!("plot {}", plots.join(", ")));

        let mut script = lines.join("\n");
        script.push('\n');
        script
    }
}

/// Runs gnuplot over a [`ChartSpec`].
#[derive(Clone, Debug)]
pub struct Gnuplot {
    program: String,
}

impl Default for Gnuplot {
    fn default() -> Self {
        Gnuplot {
            program: "gnuplot".to_string(),
        }
    }
}

impl Gnuplot {
    pub fn with_program(program: impl Into<String>) -> Self {
        Gnuplot {
            program: program.into(),
        }
    }

    /// Write the script and data files into `dir`, returning the script path.
    pub fn prepare(&self, spec: &ChartSpec, dir: &Path) -> Result<PathBuf, ChartError> {
        let mut data_files = Vec::with_capacity(spec.series.len());
        for (idx, series) in spec.series.iter().enumerate() {
            let path = dir.join(format!("{idx}.data"));
            let mut file = BufWriter::new(File::create(&path)?);
            ChartSpec::write_data(series, &mut file)?;
            file.flush()?;
            data_files.push(path);
        }
        let script = dir.join("graph.gnuplot");
        fs::write(&script, spec.script(&data_files))?;
        Ok(script)
    }

    /// Blocks until gnuplot exits. The temporary files are removed afterwards.
    pub fn render(&self, spec: &ChartSpec) -> Result<(), ChartError> {
        let tmp_dir = TempDir::new()?;
        let script = self.prepare(spec, tmp_dir.path())?;

        debug!("running {} {}", self.program, script.display());
        let output = Command::new(&self.program)
            .arg(&script)
            .output()
            .map_err(|source| ChartError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ChartError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!("chart written to {}", spec.output.display());
        Ok(())
    }
}
