// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::BTreeMap;

use log::debug;
use regex::Regex;

use crate::parse::{MetricType, Snapshot, Trial, is_pinned_label};

/// Best trial per metric for one snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ReducedSnapshot {
    pub label: String,
    pub best: BTreeMap<MetricType, Trial>,
}

impl ReducedSnapshot {
    pub fn is_pinned(&self) -> bool {
        is_pinned_label(&self.label)
    }

    pub fn get(&self, metric: &MetricType) -> Option<&Trial> {
        self.best.get(metric)
    }
}

impl From<&ReducedSnapshot> for Snapshot {
    fn from(reduced: &ReducedSnapshot) -> Snapshot {
        Snapshot {
            label: reduced.label.clone(),
            trials: reduced
                .best
                .iter()
                .map(|(metric, trial)| (metric.clone(), vec![trial.clone()]))
                .collect(),
        }
    }
}

/// Keep the lowest value of every metric. On ties the trial recorded first
/// wins, so its annotation is the one shown.
pub fn reduce(snapshot: &Snapshot) -> ReducedSnapshot {
    let best = snapshot
        .trials
        .iter()
        .filter_map(|(metric, trials)| {
            let first = trials.first()?;
            let best = trials[1..]
                .iter()
                .fold(first, |best, t| if t.value < best.value { t } else { best });
            Some((metric.clone(), best.clone()))
        })
        .collect();
    ReducedSnapshot {
        label: snapshot.label.clone(),
        best,
    }
}

pub fn reduce_all(snapshots: &[Snapshot]) -> Vec<ReducedSnapshot> {
    snapshots.iter().map(reduce).collect()
}

/// First snapshot whose label matches `pattern` anywhere.
pub fn find_baseline<'a, I>(snapshots: I, pattern: &Regex) -> Option<&'a ReducedSnapshot>
where
    I: IntoIterator<Item = &'a ReducedSnapshot>,
{
    snapshots.into_iter().find(|s| pattern.is_match(&s.label))
}

/// Express `target` as speed ratios against `baseline`: `baseline / target`
/// per metric. Metrics the baseline lacks are dropped, annotations cleared.
pub fn normalize(baseline: &ReducedSnapshot, target: &ReducedSnapshot) -> ReducedSnapshot {
    let best = target
        .best
        .iter()
        .filter_map(|(metric, trial)| {
            let base = baseline.best.get(metric)?;
            let ratio = base.value / trial.value;
            Some((metric.clone(), Trial::new(ratio, format!("{ratio:.6}"), "")))
        })
        .collect();
    ReducedSnapshot {
        label: target.label.clone(),
        best,
    }
}

pub fn normalize_all(baseline: &ReducedSnapshot, targets: &[ReducedSnapshot]) -> Vec<ReducedSnapshot> {
    debug!(
        "normalizing {} snapshots against {}",
        targets.len(),
        baseline.label
    );
    targets.iter().map(|t| normalize(baseline, t)).collect()
}
