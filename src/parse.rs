// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Reading `benchresult.<host>` logs into per-revision snapshots.
//!
//! The log is line oriented. Only two records matter:
//!
//! ```text
//! REVISIONMARKER <revision-label>
//! RESULT <metric-type> <value> <free text>
//! ```
//!
//! Everything else (session banners, comments, program chatter) is skipped so
//! that the harness can keep adding lines without breaking old reports.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::QueryError;

/// Keywords that open a snapshot. Older logs were written with `HGREV`, the
/// harness itself writes `REV`.
const REVISION_KEYWORDS: [&str; 3] = ["REVISIONMARKER", "HGREV", "REV"];
const RESULT_KEYWORD: &str = "RESULT";

/// Labels starting with this are pinned reference points.
pub const PINNED_PREFIX: char = '@';

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricType(String);

impl MetricType {
    pub fn new(name: impl Into<String>) -> Self {
        MetricType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetricType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded result for a metric.
#[derive(Clone, Debug, PartialEq)]
pub struct Trial {
    pub value: f64,
    /// The value exactly as it was written in the log.
    pub raw: String,
    pub annotation: String,
}

impl Trial {
    pub fn new(value: f64, raw: impl Into<String>, annotation: impl Into<String>) -> Self {
        Trial {
            value,
            raw: raw.into(),
            annotation: annotation.into(),
        }
    }
}

/// Raw trials of one benchmark session.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub label: String,
    pub trials: BTreeMap<MetricType, Vec<Trial>>,
}

impl Snapshot {
    pub fn new(label: impl Into<String>) -> Self {
        Snapshot {
            label: label.into(),
            trials: BTreeMap::new(),
        }
    }

    pub fn is_pinned(&self) -> bool {
        is_pinned_label(&self.label)
    }
}

pub fn is_pinned_label(label: &str) -> bool {
    label.starts_with(PINNED_PREFIX)
}

/// What a single log line means to the parser.
#[derive(Debug, PartialEq, Eq)]
pub enum LogLine<'a> {
    Revision(&'a str),
    Result {
        metric: &'a str,
        value: &'a str,
        annotation: &'a str,
    },
    Ignored,
}

impl<'a> LogLine<'a> {
    pub fn classify(line: &'a str) -> LogLine<'a> {
        let line = line.trim_end();
        let Some((keyword, rest)) = line.split_once(char::is_whitespace) else {
            return LogLine::Ignored;
        };
        let rest = rest.trim_start();

        if REVISION_KEYWORDS.contains(&keyword) {
            if rest.is_empty() {
                return LogLine::Ignored;
            }
            return LogLine::Revision(rest);
        }
        if keyword != RESULT_KEYWORD {
            return LogLine::Ignored;
        }

        let Some((metric, rest)) = rest.split_once(char::is_whitespace) else {
            return LogLine::Ignored;
        };
        let rest = rest.trim_start();
        let (value, annotation) = match rest.split_once(char::is_whitespace) {
            Some((value, annotation)) => (value, annotation.trim_start()),
            None => (rest, ""),
        };
        if value.is_empty() {
            return LogLine::Ignored;
        }
        LogLine::Result {
            metric,
            value,
            annotation,
        }
    }
}

/// Everything a log contains, in the order it was first seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLog {
    pub snapshots: Vec<Snapshot>,
    pub metric_types: Vec<MetricType>,
}

/// Incremental parser; feed it lines with [`LogParser::push_line`].
#[derive(Debug, Default)]
pub struct LogParser {
    strict: bool,
    log: ParsedLog,
    by_label: HashMap<String, usize>,
    current: Option<usize>,
    line_no: usize,
    dropped: usize,
}

impl LogParser {
    pub fn new(strict: bool) -> Self {
        LogParser {
            strict,
            ..Default::default()
        }
    }

    pub fn push_line(&mut self, line: &str) -> Result<(), QueryError> {
        self.line_no += 1;
        match LogLine::classify(line) {
            LogLine::Revision(label) => {
                let idx = match self.by_label.get(label) {
                    Some(&idx) => idx,
                    None => {
                        let idx = self.log.snapshots.len();
                        self.log.snapshots.push(Snapshot::new(label));
                        self.by_label.insert(label.to_string(), idx);
                        idx
                    }
                };
                self.current = Some(idx);
            }
            LogLine::Result {
                metric,
                value,
                annotation,
            } => {
                let Some(idx) = self.current else {
                    self.dropped += 1;
                    return Ok(());
                };
                let parsed = match value.parse::<f64>() {
                    Ok(v) if v.is_finite() => v,
                    _ if self.strict => {
                        return Err(QueryError::UnparseableValue {
                            line: self.line_no,
                            text: value.to_string(),
                        });
                    }
                    _ => 0.0,
                };
                if !self.log.metric_types.iter().any(|t| t.as_str() == metric) {
                    self.log.metric_types.push(MetricType::new(metric));
                }
                self.log.snapshots[idx]
                    .trials
                    .entry(MetricType::new(metric))
                    .or_default()
                    .push(Trial::new(parsed, value, annotation));
            }
            LogLine::Ignored => {}
        }
        Ok(())
    }

    pub fn finish(self) -> ParsedLog {
        debug!(
            "parsed {} lines: {} snapshots, {} metric types, {} orphan results dropped",
            self.line_no,
            self.log.snapshots.len(),
            self.log.metric_types.len(),
            self.dropped
        );
        self.log
    }
}

pub fn parse_lines<I, S>(lines: I, strict: bool) -> Result<ParsedLog, QueryError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = LogParser::new(strict);
    for line in lines {
        parser.push_line(line.as_ref())?;
    }
    Ok(parser.finish())
}

/// Read and parse a whole log file. Invalid UTF-8 is replaced rather than
/// rejected, the same way unknown lines are.
pub fn read_log(path: &Path, strict: bool) -> Result<ParsedLog, QueryError> {
    debug!("reading {}", path.display());
    let bytes = fs::read(path).map_err(|source| QueryError::ReadLog {
        path: path.to_path_buf(),
        source,
    })?;
    parse_lines(String::from_utf8_lossy(&bytes).lines(), strict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn classify_recognizes_both_records() {
        assert_eq!(
            LogLine::classify("REVISIONMARKER r1"),
            LogLine::Revision("r1")
        );
        assert_eq!(LogLine::classify("HGREV 42:abc"), LogLine::Revision("42:abc"));
        assert_eq!(LogLine::classify("REV @tc"), LogLine::Revision("@tc"));
        assert_eq!(
            LogLine::classify("RESULT\tBasicWrite:Mem\t1.50\tsec 1000 ops"),
            LogLine::Result {
                metric: "BasicWrite:Mem",
                value: "1.50",
                annotation: "sec 1000 ops",
            }
        );
        assert_eq!(
            LogLine::classify("RESULT BasicWrite:Mem 1.50"),
            LogLine::Result {
                metric: "BasicWrite:Mem",
                value: "1.50",
                annotation: "",
            }
        );
    }

    #[test]
    fn classify_ignores_everything_else() {
        for line in [
            "",
            "### bench session start 01/02/12 10:00:00",
            "RESULT",
            "RESULT BasicWrite:Mem",
            "REVISIONMARKER",
            "REVISIONMARKER   ",
            " RESULT BasicWrite:Mem 1.0 indented",
            "RESULTS BasicWrite:Mem 1.0 x",
        ] {
            assert_eq!(LogLine::classify(line), LogLine::Ignored, "{line:?}");
        }
    }

    #[test]
    fn results_append_to_current_snapshot() {
        let log = parse_lines(
            [
                "REVISIONMARKER r1",
                "RESULT BasicWrite:Mem 1.50 ok",
                "RESULT RandWrite:Mem 3.00 ok",
                "RESULT BasicWrite:Mem 1.20 ok",
                "REVISIONMARKER r2",
                "RESULT BasicWrite:Mem 2.00 ok",
            ],
            false,
        )
        .unwrap();

        assert_eq!(log.snapshots.len(), 2);
        assert_eq!(
            log.metric_types,
            vec![MetricType::new("BasicWrite:Mem"), MetricType::new("RandWrite:Mem")]
        );
        let r1 = &log.snapshots[0];
        assert_eq!(r1.label, "r1");
        assert_eq!(
            r1.trials["BasicWrite:Mem"],
            vec![Trial::new(1.5, "1.50", "ok"), Trial::new(1.2, "1.20", "ok")]
        );
        assert_eq!(log.snapshots[1].trials["BasicWrite:Mem"].len(), 1);
    }

    #[test]
    fn repeated_label_resumes_snapshot() {
        let log = parse_lines(
            [
                "REV r1",
                "RESULT a 1 x",
                "REV r2",
                "RESULT a 2 x",
                "REV r1",
                "RESULT a 3 y",
            ],
            false,
        )
        .unwrap();

        let labels: Vec<_> = log.snapshots.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["r1", "r2"]);
        assert_eq!(log.snapshots[0].trials["a"].len(), 2);
        assert_eq!(log.snapshots[0].trials["a"][1].annotation, "y");
    }

    #[test]
    fn result_before_any_revision_is_dropped() {
        let log = parse_lines(["RESULT a 1 x", "REV r1", "RESULT b 2 x"], false).unwrap();

        assert_eq!(log.metric_types, vec![MetricType::new("b")]);
        assert_eq!(log.snapshots.len(), 1);
        assert!(!log.snapshots[0].trials.contains_key("a"));
    }

    #[test]
    fn garbled_value_is_zero_but_keeps_text() {
        let log = parse_lines(["REV r1", "RESULT a 1.2.3 oops"], false).unwrap();

        assert_eq!(
            log.snapshots[0].trials["a"],
            vec![Trial::new(0.0, "1.2.3", "oops")]
        );
    }

    #[test]
    fn non_finite_values_are_garbled() {
        let log = parse_lines(["REV r1", "RESULT a NaN x", "RESULT a inf y", "RESULT a 1.0 z"], false).unwrap();

        assert_eq!(
            log.snapshots[0].trials["a"],
            vec![
                Trial::new(0.0, "NaN", "x"),
                Trial::new(0.0, "inf", "y"),
                Trial::new(1.0, "1.0", "z"),
            ]
        );

        let err = parse_lines(["REV r1", "RESULT a -infinity x"], true).unwrap_err();
        assert_eq!(err.to_string(), "line 2: can't parse result value `-infinity`");
    }

    #[test]
    fn strict_mode_rejects_garbled_value() {
        let err = parse_lines(["REV r1", "RESULT a 1 ok", "RESULT a x1 oops"], true).unwrap_err();

        match err {
            QueryError::UnparseableValue { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "x1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pinned_labels() {
        assert!(Snapshot::new("@tc").is_pinned());
        assert!(!Snapshot::new("r@1").is_pinned());
    }

    #[test]
    fn read_log_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchresult.test");
        fs::write(&path, b"REV r1\nRESULT a 1.0 \xff\xfe\n").unwrap();

        let log = read_log(&path, false).unwrap();
        assert_eq!(log.snapshots[0].trials["a"][0].value, 1.0);
    }

    #[test]
    fn read_log_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_log(&dir.path().join("nope"), false).unwrap_err();
        assert!(matches!(err, QueryError::ReadLog { .. }));
    }
}
