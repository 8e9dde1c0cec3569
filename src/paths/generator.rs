// pathopt: path-indexed traffic-engineering optimization
// Copyright (C) 2024 The pathopt developers
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Candidate path enumeration.
//!
//! Enumeration walks all simple paths between source and sink (depth-first,
//! deterministic per run) up to a hop cutoff. Each raw path is *first*
//! expanded by the optional modifier and *then* filtered by the predicate
//! (modify-then-validate), so predicates may inspect annotations the
//! modifier added, such as middlebox waypoint sets.

use itertools::Itertools;
use log::{debug, trace};
use petgraph::algo::all_simple_paths;

use super::{Path, Pptc};
use crate::error::Error;
use crate::topology::{NodeId, Topology};
use crate::traffic::TrafficMatrix;

/// The canonical "always true" predicate: accepts every candidate path.
pub fn null_predicate(_: &Path, _: &Topology) -> bool {
    true
}

/// Accepts only paths annotated with at least one middlebox waypoint.
pub fn has_middlebox_predicate(path: &Path, _: &Topology) -> bool {
    path.has_middleboxes()
}

/// Path modifier that expands a raw path into one annotated variant per
/// combination of exactly `k` middlebox-capable nodes on it. Paths with
/// fewer than `k` middlebox-capable nodes produce no variants.
pub fn mbox_modifier(k: usize) -> impl Fn(&Path, &Topology) -> Vec<Path> {
    move |path, topo| {
        let capable: Vec<NodeId> = path
            .nodes()
            .iter()
            .copied()
            .filter(|n| topo.is_middlebox(*n))
            .collect();
        capable
            .into_iter()
            .combinations(k)
            .map(|combo| path.clone().with_middleboxes(combo))
            .collect()
    }
}

/// Enumerate candidate paths from `src` to `dst`.
///
/// All simple paths of at most `cutoff` hops are enumerated depth-first. If
/// a `modifier` is given, each raw path is expanded into zero or more
/// candidates; every candidate (modified or raw) must then be accepted by
/// `predicate`. Enumeration stops once `max_paths` accepted candidates have
/// been produced. Neither the topology nor any caller state is mutated, so
/// independent (src, dst) pairs can be generated concurrently.
///
/// Fails with [`Error::NoPaths`] if no accepted candidate exists; use
/// [`generate_paths_tolerant`] to get an empty list instead.
pub fn generate_paths(
    topo: &Topology,
    src: NodeId,
    dst: NodeId,
    predicate: impl Fn(&Path, &Topology) -> bool,
    cutoff: usize,
    max_paths: Option<usize>,
    modifier: Option<&dyn Fn(&Path, &Topology) -> Vec<Path>>,
) -> Result<Vec<Path>, Error> {
    let paths = generate_paths_tolerant(topo, src, dst, predicate, cutoff, max_paths, modifier);
    if paths.is_empty() {
        Err(Error::NoPaths { src, dst })
    } else {
        Ok(paths)
    }
}

/// Like [`generate_paths`], but an empty result is returned as an empty
/// list instead of an error.
pub fn generate_paths_tolerant(
    topo: &Topology,
    src: NodeId,
    dst: NodeId,
    predicate: impl Fn(&Path, &Topology) -> bool,
    cutoff: usize,
    max_paths: Option<usize>,
    modifier: Option<&dyn Fn(&Path, &Topology) -> Vec<Path>>,
) -> Vec<Path> {
    let limit = max_paths.unwrap_or(usize::MAX);
    let mut accepted = Vec::new();
    if src == dst || cutoff == 0 || limit == 0 {
        return accepted;
    }

    // max_intermediate_nodes: a path of h hops has h - 1 intermediate nodes.
    let raw_paths =
        all_simple_paths::<Vec<NodeId>, _>(topo.graph(), src, dst, 0, Some(cutoff - 1));

    'outer: for nodes in raw_paths {
        let raw = Path::new(nodes);
        trace!("candidate path {raw}");
        let candidates = match modifier {
            Some(f) => f(&raw, topo),
            None => vec![raw],
        };
        for candidate in candidates {
            if predicate(&candidate, topo) {
                accepted.push(candidate);
                if accepted.len() >= limit {
                    break 'outer;
                }
            }
        }
    }

    debug!(
        "generated {} paths from {} to {} (cutoff {cutoff})",
        accepted.len(),
        src.index(),
        dst.index()
    );
    accepted
}

/// Generate candidate paths for every class of a traffic matrix, producing
/// the paths-per-traffic-class mapping. Any class without an accepted path
/// fails the whole call with [`Error::NoPaths`].
pub fn generate_paths_per_class(
    topo: &Topology,
    tm: &TrafficMatrix,
    predicate: impl Fn(&Path, &Topology) -> bool,
    cutoff: usize,
    max_paths: Option<usize>,
    modifier: Option<&dyn Fn(&Path, &Topology) -> Vec<Path>>,
) -> Result<Pptc, Error> {
    let mut pptc = Pptc::new();
    for tc in tm.classes() {
        let paths = generate_paths(
            topo,
            tc.src,
            tc.dst,
            &predicate,
            cutoff,
            max_paths,
            modifier,
        )?;
        pptc.insert(tc.clone(), paths);
    }
    Ok(pptc)
}
