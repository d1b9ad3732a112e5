// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use clap::Parser;
use color_eyre::eyre::Result;
use log::warn;
use std::io;
use std::process;

use perf_query::chart::Gnuplot;
use perf_query::config::{Args, Config, expand_legacy_args};
use perf_query::error::RunError;
use perf_query::run;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse_from(expand_legacy_args(std::env::args_os()));

    let log_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = Config::from_args(&args);
    colored::control::set_override(config.color);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let report = match run(&config, &mut out) {
        Ok(report) => report,
        Err(RunError::Query(e)) => {
            eprintln!("E {e}");
            process::exit(1);
        }
        Err(RunError::Output(e)) if e.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
        Err(RunError::Output(e)) => return Err(e.into()),
    };
    drop(out);

    if let Some(options) = &config.chart {
        // The table is already printed at this point.
        if let Err(e) = Gnuplot::default().render(&report.chart(options)) {
            warn!("chart not drawn: {e}");
        }
    }
    Ok(())
}
