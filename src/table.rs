// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::{self, Write};

use colored::Colorize;

use crate::filter::Aliases;
use crate::parse::{MetricType, Trial};
use crate::reduce::ReducedSnapshot;

const LABEL_WIDTH: usize = 15;
const CELL_WIDTH: usize = 8;
const SEPARATOR_WIDTH: usize = 80;
const NOT_APPLICABLE: &str = "n/a";

pub const REGRESSION_THRESHOLD: f64 = 1.02;
pub const IMPROVEMENT_THRESHOLD: f64 = 0.98;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellMode {
    /// The recorded value text.
    Raw,
    /// Value as a percentage, flagged against the fixed thresholds.
    Ratio,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellFlag {
    Regression,
    Improvement,
    Neutral,
}

impl CellFlag {
    pub fn for_ratio(ratio: f64) -> CellFlag {
        if ratio > REGRESSION_THRESHOLD {
            CellFlag::Regression
        } else if ratio < IMPROVEMENT_THRESHOLD {
            CellFlag::Improvement
        } else {
            CellFlag::Neutral
        }
    }
}

fn clip(s: &str, len: usize) -> String {
    s.chars().take(len).collect()
}

pub struct TableRenderer<'a> {
    metrics: &'a [MetricType],
    aliases: &'a Aliases,
    mode: CellMode,
    color: bool,
}

impl<'a> TableRenderer<'a> {
    pub fn new(metrics: &'a [MetricType], aliases: &'a Aliases, mode: CellMode, color: bool) -> Self {
        TableRenderer {
            metrics,
            aliases,
            mode,
            color,
        }
    }

    pub fn render<W: Write>(&self, out: &mut W, snapshots: &[ReducedSnapshot]) -> io::Result<()> {
        writeln!(out, "{}", self.header())?;

        let mut separator_done = false;
        for snapshot in snapshots {
            if !separator_done && snapshot.is_pinned() {
                let line = "-".repeat(SEPARATOR_WIDTH);
                if self.color {
                    writeln!(out, "{}", line.blue())?;
                } else {
                    writeln!(out, "{line}")?;
                }
                separator_done = true;
            }
            writeln!(out, "{}", self.row(snapshot))?;
        }
        out.flush()
    }

    fn header(&self) -> String {
        let names: Vec<String> = self
            .metrics
            .iter()
            .map(|m| {
                let name = format!("{:>CELL_WIDTH$}", clip(self.aliases.display_name(m), CELL_WIDTH));
                if self.color {
                    name.yellow().to_string()
                } else {
                    name
                }
            })
            .collect();
        format!("{}{}", " ".repeat(LABEL_WIDTH + 2), names.join(" "))
    }

    fn row(&self, snapshot: &ReducedSnapshot) -> String {
        let cells: Vec<String> = self
            .metrics
            .iter()
            .map(|m| self.cell(snapshot.get(m)))
            .collect();
        format!(
            "{:<LABEL_WIDTH$} :{}",
            clip(&snapshot.label, LABEL_WIDTH),
            cells.join(" ")
        )
    }

    fn cell(&self, trial: Option<&Trial>) -> String {
        let Some(trial) = trial else {
            return format!("{NOT_APPLICABLE:>CELL_WIDTH$}");
        };
        match self.mode {
            CellMode::Raw => format!("{:>CELL_WIDTH$}", clip(&trial.raw, CELL_WIDTH)),
            CellMode::Ratio => {
                let text = format!("{:>CELL_WIDTH$}", format!("{:.2}%", trial.value * 100.0));
                if !self.color {
                    return text;
                }
                match CellFlag::for_ratio(trial.value) {
                    CellFlag::Regression => text.red().to_string(),
                    CellFlag::Improvement => text.blue().to_string(),
                    CellFlag::Neutral => text,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_lines;
    use crate::reduce::{normalize_all, reduce_all};
    use pretty_assertions::assert_eq;

    fn render(
        metrics: &[MetricType],
        snapshots: &[ReducedSnapshot],
        mode: CellMode,
        color: bool,
    ) -> String {
        let aliases = Aliases::builtin();
        let mut out = Vec::new();
        TableRenderer::new(metrics, &aliases, mode, color)
            .render(&mut out, snapshots)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn sample() -> (Vec<MetricType>, Vec<ReducedSnapshot>) {
        let log = parse_lines(
            [
                "REVISIONMARKER r1",
                "RESULT BasicWrite:Mem 1.50 ok",
                "RESULT BasicWrite:Mem 1.20 ok",
                "RESULT Custom:LongName 12.345678901 ok",
                "REVISIONMARKER r2-with-a-very-long-label",
                "RESULT BasicWrite:Mem 2.00 ok",
                "REVISIONMARKER @tc",
                "RESULT BasicWrite:Mem 1.25 ok",
            ],
            false,
        )
        .unwrap();
        (log.metric_types, reduce_all(&log.snapshots))
    }

    #[test]
    fn raw_table_layout() {
        let (metrics, snapshots) = sample();
        let sep = "-".repeat(80);

        let expected = [
            "                      bwm Custom:L",
            "r1              :    1.20 12.34567",
            "r2-with-a-very- :    2.00      n/a",
            sep.as_str(),
            "@tc             :    1.25      n/a",
            "",
        ]
        .join("\n");
        assert_eq!(render(&metrics, &snapshots, CellMode::Raw, false), expected);
    }

    #[test]
    fn ratio_table_layout() {
        let (metrics, snapshots) = sample();
        let normalized = normalize_all(&snapshots[0], &snapshots);
        let sep = "-".repeat(80);

        let expected = [
            "                      bwm Custom:L",
            "r1              : 100.00%  100.00%",
            "r2-with-a-very- :  60.00%      n/a",
            sep.as_str(),
            "@tc             :  96.00%      n/a",
            "",
        ]
        .join("\n");
        assert_eq!(render(&metrics, &normalized, CellMode::Ratio, false), expected);
    }

    #[test]
    fn separator_only_once() {
        let (metrics, mut snapshots) = sample();
        let mut second = snapshots[2].clone();
        second.label = "@old".to_string();
        snapshots.push(second);

        let out = render(&metrics, &snapshots, CellMode::Raw, false);
        assert_eq!(out.lines().filter(|l| l.starts_with("----")).count(), 1);
    }

    #[test]
    fn no_separator_without_pinned() {
        let (metrics, snapshots) = sample();
        let out = render(&metrics, &snapshots[..2], CellMode::Raw, false);
        assert!(!out.contains("----"));
    }

    #[test]
    fn thresholds() {
        assert_eq!(CellFlag::for_ratio(0.60), CellFlag::Improvement);
        assert_eq!(CellFlag::for_ratio(0.98), CellFlag::Neutral);
        assert_eq!(CellFlag::for_ratio(1.0), CellFlag::Neutral);
        assert_eq!(CellFlag::for_ratio(1.02), CellFlag::Neutral);
        assert_eq!(CellFlag::for_ratio(1.03), CellFlag::Regression);
    }

    #[test]
    fn colored_cells_keep_text() {
        colored::control::set_override(true);
        let (metrics, snapshots) = sample();
        let normalized = normalize_all(&snapshots[0], &snapshots);

        let out = render(&metrics, &normalized, CellMode::Ratio, true);
        assert!(out.contains(&"  60.00%".blue().to_string()));
        assert!(out.contains("100.00%"));
    }
}
