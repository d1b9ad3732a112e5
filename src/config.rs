// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::Command;

use clap::{Parser, ValueEnum};

use crate::chart::{ChartOptions, DEFAULT_OUTPUT};
use crate::window::DEFAULT_LIMIT;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(name = "perf-query")]
#[command(about = "Compare benchmark results across revisions", long_about = None)]
pub struct Args {
    /// Host whose `benchresult.<host>` log is read [default: this machine]
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Read this log file instead of `benchresult.<host>`
    #[arg(short = 'l', long = "log", conflicts_with = "host")]
    pub log: Option<PathBuf>,

    /// Number of most recent revisions to show
    #[arg(short = 'n', long = "limit", default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Show results relative to the first revision whose label matches this pattern
    #[arg(short = 'r', long = "rel-to")]
    pub rel_to: Option<String>,

    /// Show cells as percentages (on by default with --rel-to)
    #[arg(
        long = "percent",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub percent: Option<bool>,

    /// Don't show pinned (`@`) revisions after the recent ones
    #[arg(long = "nospec")]
    pub nospec: bool,

    /// Fixed upper bound of the chart's y axis
    #[arg(long = "max-height")]
    pub max_height: Option<f64>,

    /// Width of a single bar in the chart [default: 0.7 / number of metrics]
    #[arg(long = "bar-width")]
    pub bar_width: Option<f64>,

    /// Where gnuplot writes the chart
    #[arg(long = "chart-output", default_value = DEFAULT_OUTPUT)]
    pub chart_output: PathBuf,

    /// Only print the table
    #[arg(long = "no-chart")]
    pub no_chart: bool,

    /// Fail on result values that aren't numbers instead of counting them as zero
    #[arg(long = "strict")]
    pub strict: bool,

    /// When to color the table
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print debug logs
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Metric types to show, as regular expressions matched against names and aliases
    pub patterns: Vec<String>,
}

/// Everything a report run needs, resolved once from the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub log_path: PathBuf,
    pub limit: usize,
    pub rel_to: Option<String>,
    pub percent: bool,
    pub include_pinned: bool,
    pub patterns: Vec<String>,
    pub strict: bool,
    pub color: bool,
    /// `None` when no chart should be drawn.
    pub chart: Option<ChartOptions>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_path: PathBuf::from("benchresult.localhost"),
            limit: DEFAULT_LIMIT,
            rel_to: None,
            percent: false,
            include_pinned: true,
            patterns: Vec::new(),
            strict: false,
            color: false,
            chart: None,
        }
    }
}

impl Config {
    pub fn from_args(args: &Args) -> Config {
        let log_path = match (&args.log, &args.host) {
            (Some(path), _) => path.clone(),
            (None, Some(host)) => log_path_for(host),
            (None, None) => log_path_for(&local_hostname()),
        };
        let color = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        };
        let chart = (!args.no_chart).then(|| ChartOptions {
            bar_width: args.bar_width,
            y_max: args.max_height,
            output: args.chart_output.clone(),
            normalized: args.rel_to.is_some(),
        });

        Config {
            log_path,
            limit: args.limit,
            rel_to: args.rel_to.clone(),
            percent: args.percent.unwrap_or(args.rel_to.is_some()),
            include_pinned: !args.nospec,
            patterns: args.patterns.clone(),
            strict: args.strict,
            color,
            chart,
        }
    }
}

pub fn log_path_for(host: &str) -> PathBuf {
    PathBuf::from(format!("benchresult.{host}"))
}

/// `HOSTNAME` if set, else whatever `hostname` prints.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            Command::new("hostname")
                .output()
                .ok()
                .filter(|out| out.status.success())
                .and_then(|out| String::from_utf8(out.stdout).ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| "localhost".to_string())
}

fn is_false(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

/// Rewrite `key=value` options into long flags, e.g. `limit=3` into
/// `--limit=3`, so old invocations keep working. Unknown keys are left alone
/// and end up as metric patterns.
pub fn expand_legacy_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut expanded = Vec::new();
    let mut rest_positional = false;
    for (idx, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if idx == 0 || rest_positional {
            expanded.push(arg);
            continue;
        }
        if arg == "--" {
            rest_positional = true;
            expanded.push(arg);
            continue;
        }
        let rewritten = arg
            .to_str()
            .and_then(|s| s.split_once('='))
            .and_then(|(key, value)| match key {
                "host" => Some(format!("--host={value}")),
                "limit" => Some(format!("--limit={value}")),
                "rel_to" => Some(format!("--rel-to={value}")),
                "percent" => Some(format!("--percent={}", !is_false(value))),
                "nospec" => Some("--nospec".to_string()),
                "maxh" => Some(format!("--max-height={value}")),
                "barw" => Some(format!("--bar-width={value}")),
                _ => None,
            });
        expanded.push(rewritten.map(OsString::from).unwrap_or(arg));
    }
    expanded
}
