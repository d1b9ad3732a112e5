// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Short names for the standard workloads and metric selection by pattern.

use std::collections::HashMap;

use regex::Regex;

use crate::error::QueryError;
use crate::parse::MetricType;

const BUILTIN_ALIASES: [(&str, &str); 18] = [
    ("bwm", "BasicWrite:Mem"),
    ("bws", "BasicWrite:SSD"),
    ("bwr", "BasicWrite:RAID"),
    ("bwss", "BasicWrite:SSDSync"),
    ("bwrs", "BasicWrite:RAIDSync"),
    ("rwm", "RandWrite:Mem"),
    ("rws", "RandWrite:SSD"),
    ("rwr", "RandWrite:RAID"),
    ("rwss", "RandWrite:SSDSync"),
    ("rwrs", "RandWrite:RAIDSync"),
    ("brm", "BasicRead:Mem"),
    ("brs", "BasicRead:SSD"),
    ("brr", "BasicRead:RAID"),
    ("swm", "SmallWrite:Mem"),
    ("sws", "SmallWrite:SSD"),
    ("swr", "SmallWrite:RAID"),
    ("swss", "SmallWrite:SSDSync"),
    ("swrs", "SmallWrite:RAIDSync"),
];

/// Alias lookup by canonical metric name. Aliases only affect display and
/// matching, never identity.
#[derive(Clone, Debug, Default)]
pub struct Aliases {
    to_alias: HashMap<String, String>,
}

impl Aliases {
    pub fn builtin() -> Self {
        let mut aliases = Aliases::default();
        for (alias, metric) in BUILTIN_ALIASES {
            aliases.insert(alias, metric);
        }
        aliases
    }

    pub fn insert(&mut self, alias: &str, metric: &str) {
        self.to_alias.insert(metric.to_string(), alias.to_string());
    }

    pub fn alias_of(&self, metric: &MetricType) -> Option<&str> {
        self.to_alias.get(metric.as_str()).map(String::as_str)
    }

    /// Alias if there is one, the full name otherwise.
    pub fn display_name<'a>(&'a self, metric: &'a MetricType) -> &'a str {
        self.alias_of(metric).unwrap_or(metric.as_str())
    }
}

pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, QueryError> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).map_err(|source| QueryError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}

/// Whether `metric` or its alias matches any of `patterns`.
pub fn matches(metric: &MetricType, alias: Option<&str>, patterns: &[Regex]) -> bool {
    patterns
        .iter()
        .any(|p| p.is_match(metric.as_str()) || alias.is_some_and(|a| p.is_match(a)))
}

/// Metric types selected by `patterns`, in discovery order. No patterns
/// selects everything; selecting nothing is an error.
pub fn select_metrics(
    metrics: &[MetricType],
    patterns: &[Regex],
    aliases: &Aliases,
) -> Result<Vec<MetricType>, QueryError> {
    let selected: Vec<MetricType> = if patterns.is_empty() {
        metrics.to_vec()
    } else {
        metrics
            .iter()
            .filter(|m| matches(m, aliases.alias_of(m), patterns))
            .cloned()
            .collect()
    };
    if selected.is_empty() {
        return Err(QueryError::NoMetricTypes);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics(names: &[&str]) -> Vec<MetricType> {
        names.iter().map(|n| MetricType::new(*n)).collect()
    }

    #[test]
    fn aliases_shorten_known_metrics() {
        let aliases = Aliases::builtin();
        let bwm = MetricType::new("BasicWrite:Mem");

        assert_eq!(aliases.alias_of(&bwm), Some("bwm"));
        assert_eq!(aliases.display_name(&bwm), "bwm");
        assert_eq!(aliases.display_name(&MetricType::new("Custom:X")), "Custom:X");
    }

    #[test]
    fn alias_pattern_selects_metric() {
        let all = metrics(&["BasicWrite:Mem", "RandWrite:Mem", "BasicRead:SSD"]);
        let patterns = compile_patterns(&["bwm"]).unwrap();

        let selected = select_metrics(&all, &patterns, &Aliases::builtin()).unwrap();
        assert_eq!(selected, metrics(&["BasicWrite:Mem"]));
    }

    #[test]
    fn alias_pattern_with_single_metric() {
        let all = metrics(&["BasicWrite:Mem"]);
        let patterns = compile_patterns(&["bwm"]).unwrap();

        assert_eq!(
            select_metrics(&all, &patterns, &Aliases::builtin()).unwrap(),
            all
        );
    }

    #[test]
    fn patterns_are_ored_and_keep_discovery_order() {
        let all = metrics(&["SmallWrite:SSD", "BasicWrite:Mem", "RandWrite:Mem"]);
        let patterns = compile_patterns(&["Mem$", "^sws"]).unwrap();

        assert_eq!(
            select_metrics(&all, &patterns, &Aliases::builtin()).unwrap(),
            all
        );
    }

    #[test]
    fn no_patterns_keeps_everything() {
        let all = metrics(&["a", "b"]);
        assert_eq!(select_metrics(&all, &[], &Aliases::builtin()).unwrap(), all);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let all = metrics(&["BasicWrite:Mem"]);
        let patterns = compile_patterns(&["nothing"]).unwrap();

        assert!(matches!(
            select_metrics(&all, &patterns, &Aliases::builtin()),
            Err(QueryError::NoMetricTypes)
        ));
        assert!(matches!(
            select_metrics(&[], &[], &Aliases::builtin()),
            Err(QueryError::NoMetricTypes)
        ));
    }

    #[test]
    fn bad_regex_is_reported() {
        let err = compile_patterns(&["(unclosed"]).unwrap_err();
        assert!(err.to_string().starts_with("invalid pattern \"(unclosed\""));
    }
}
