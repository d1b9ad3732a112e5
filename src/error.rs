// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Conditions that stop a report before anything is printed.
///
/// Each of these is shown to the user as a single `E <message>` line.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("no valid benchmark type specified")]
    NoMetricTypes,

    #[error("no benchshot matching \"{0}\" found")]
    BaselineNotFound(String),

    #[error("invalid pattern \"{pattern}\": {}", regex_reason(.source))]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("line {line}: can't parse result value `{text}`")]
    UnparseableValue { line: usize, text: String },

    #[error("can't read {}: {source}", .path.display())]
    ReadLog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Run failures: either the report could not be built or stdout went away.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Output(#[from] io::Error),
}

/// Last line of a regex error, without the caret diagram above it.
fn regex_reason(err: &regex::Error) -> String {
    let text = err.to_string();
    let last = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    last.strip_prefix("error: ").unwrap_or(last).to_string()
}

/// Plotting failures. The table has already been written when these happen,
/// so callers only log them.
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("can't write chart files: {0}")]
    Io(#[from] io::Error),

    #[error("can't run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}
