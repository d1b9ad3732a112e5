// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Turn benchmark result logs into comparison tables and bar charts.
//!
//! The pipeline runs strictly in order: parse the log, pick the metric
//! columns, reduce every metric to its best trial, set pinned revisions
//! aside, keep the most recent window, optionally divide everything by a
//! baseline revision, then render. [`build_report`] does everything that can
//! fail before a single line of output is written.

pub mod chart;
pub mod config;
pub mod error;
pub mod filter;
pub mod parse;
pub mod reduce;
pub mod table;
pub mod window;

use std::io::{self, Write};

use log::debug;
use regex::Regex;

use crate::chart::{ChartOptions, ChartSpec};
use crate::config::Config;
use crate::error::{QueryError, RunError};
use crate::filter::{Aliases, compile_patterns, select_metrics};
use crate::parse::{MetricType, ParsedLog, read_log};
use crate::reduce::{ReducedSnapshot, find_baseline, normalize_all, reduce_all};
use crate::table::{CellMode, TableRenderer};
use crate::window::{limit_window, split_pinned};

/// A fully computed report, ready to be rendered.
#[derive(Clone, Debug)]
pub struct Report {
    pub metrics: Vec<MetricType>,
    /// Rows in display order: recent revisions, then pinned ones.
    pub snapshots: Vec<ReducedSnapshot>,
    /// Label of the revision everything was divided by.
    pub baseline: Option<String>,
    pub mode: CellMode,
    pub aliases: Aliases,
}

pub fn build_report(config: &Config, log: ParsedLog) -> Result<Report, QueryError> {
    let aliases = Aliases::builtin();
    let patterns = compile_patterns(&config.patterns)?;
    let metrics = select_metrics(&log.metric_types, &patterns, &aliases)?;

    let (chronological, pinned) = split_pinned(reduce_all(&log.snapshots));
    let total = chronological.len();
    let mut snapshots = limit_window(chronological, config.limit);
    debug!(
        "showing {} of {} revisions, {} pinned",
        snapshots.len(),
        total,
        pinned.len()
    );
    let recent = snapshots.len();
    snapshots.extend(pinned);

    let mut baseline = None;
    if let Some(pattern) = &config.rel_to {
        let regex = Regex::new(pattern).map_err(|source| QueryError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        let base = find_baseline(&snapshots, &regex)
            .ok_or_else(|| QueryError::BaselineNotFound(pattern.clone()))?;
        baseline = Some(base.label.clone());
        snapshots = normalize_all(base, &snapshots);
    }

    if !config.include_pinned {
        snapshots.truncate(recent);
    }

    Ok(Report {
        metrics,
        snapshots,
        baseline,
        mode: if config.percent {
            CellMode::Ratio
        } else {
            CellMode::Raw
        },
        aliases,
    })
}

/// Read the configured log, build the report and print its table to `out`.
///
/// Nothing is written unless the whole report could be built. The report is
/// returned so the caller can still chart it.
pub fn run<W: Write>(config: &Config, out: &mut W) -> Result<Report, RunError> {
    let log = read_log(&config.log_path, config.strict)?;
    let report = build_report(config, log)?;
    report.write_table(out, config.color)?;
    Ok(report)
}

impl Report {
    /// The baseline notice, if any, followed by the table.
    pub fn write_table<W: Write>(&self, out: &mut W, color: bool) -> io::Result<()> {
        if let Some(label) = &self.baseline {
            writeln!(out, "displaying benchresults relative to \"{label}\"")?;
        }
        TableRenderer::new(&self.metrics, &self.aliases, self.mode, color).render(out, &self.snapshots)
    }

    pub fn chart(&self, options: &ChartOptions) -> ChartSpec {
        ChartSpec::build(&self.metrics, &self.snapshots, options)
    }
}
