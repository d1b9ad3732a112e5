// Copyright (c) 2025 the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::reduce::ReducedSnapshot;

pub const DEFAULT_LIMIT: usize = 5;

/// Split into `(chronological, pinned)`, keeping the order of both.
pub fn split_pinned(snapshots: Vec<ReducedSnapshot>) -> (Vec<ReducedSnapshot>, Vec<ReducedSnapshot>) {
    snapshots.into_iter().partition(|s| !s.is_pinned())
}

/// The most recent `limit` snapshots, oldest first.
pub fn limit_window<T>(mut snapshots: Vec<T>, limit: usize) -> Vec<T> {
    let skip = snapshots.len().saturating_sub(limit);
    snapshots.drain(..skip);
    snapshots
}
