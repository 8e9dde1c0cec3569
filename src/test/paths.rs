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

use std::str::FromStr;

use pretty_assertions_sorted::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_log::test;

use super::diamond;
use crate::error::Error;
use crate::paths::{
    generate_paths, generate_paths_per_class, generate_paths_tolerant, has_middlebox_predicate,
    mbox_modifier, null_predicate, select_k_shortest, select_random, Path, Pptc, SelectStrategy,
};
use crate::topology::Topology;
use crate::traffic::{all_ie_pairs, TrafficClass, TrafficMatrix};

#[test]
fn diamond_enumeration() {
    let (topo, a, b, c, d) = diamond();
    let paths = generate_paths(&topo, a, d, null_predicate, 4, None, None).unwrap();
    assert_eq!(paths.len(), 2);
    for p in &paths {
        assert_eq!(p.source(), a);
        assert_eq!(p.sink(), d);
        assert_eq!(p.hops(), 2);
    }
    assert!(paths.contains(&Path::new(vec![a, b, d])));
    assert!(paths.contains(&Path::new(vec![a, c, d])));
}

#[test]
fn cutoff_excludes_long_paths() {
    let topo = Topology::chain(4);
    let nodes: Vec<_> = topo.nodes().collect();
    // 0 -> 3 needs three hops; a cutoff of two leaves nothing.
    assert!(matches!(
        generate_paths(&topo, nodes[0], nodes[3], null_predicate, 2, None, None),
        Err(Error::NoPaths { .. })
    ));
    assert!(generate_paths_tolerant(&topo, nodes[0], nodes[3], null_predicate, 2, None, None)
        .is_empty());
    let paths =
        generate_paths(&topo, nodes[0], nodes[3], null_predicate, 3, None, None).unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].hops(), 3);
}

#[test]
fn same_source_and_sink_yields_nothing() {
    let topo = Topology::complete(3);
    let nodes: Vec<_> = topo.nodes().collect();
    assert!(
        generate_paths_tolerant(&topo, nodes[0], nodes[0], null_predicate, 4, None, None)
            .is_empty()
    );
}

#[test]
fn max_paths_stops_enumeration() {
    let topo = Topology::complete(4);
    let nodes: Vec<_> = topo.nodes().collect();
    let paths =
        generate_paths(&topo, nodes[0], nodes[3], null_predicate, 4, Some(2), None).unwrap();
    assert_eq!(paths.len(), 2);
}

#[test]
fn mbox_modifier_annotates_paths() {
    let (mut topo, a, b, c, d) = diamond();
    topo.set_middlebox(b, true);
    topo.set_middlebox(c, true);
    let modifier = mbox_modifier(1);
    let paths = generate_paths(
        &topo,
        a,
        d,
        has_middlebox_predicate,
        4,
        None,
        Some(&modifier),
    )
    .unwrap();
    // each raw path has exactly one middlebox-capable node, so exactly one
    // annotated variant each
    assert_eq!(paths.len(), 2);
    for p in &paths {
        assert!(p.has_middleboxes());
        assert_eq!(p.middleboxes().len(), 1);
    }
    let via_b = paths.iter().find(|p| p.contains(b)).unwrap();
    assert!(via_b.uses_node(b));
    assert!(!via_b.uses_node(a));
    assert!(!via_b.uses_node(d));
}

#[test]
fn mbox_modifier_without_capable_nodes_rejects_all() {
    let (topo, a, _, _, d) = diamond();
    let modifier = mbox_modifier(1);
    assert!(matches!(
        generate_paths(&topo, a, d, has_middlebox_predicate, 4, None, Some(&modifier)),
        Err(Error::NoPaths { .. })
    ));
}

#[test]
fn per_class_generation() {
    let (topo, a, b, _, d) = diamond();
    let tm: TrafficMatrix = [
        TrafficClass::new(0, "ad", a, d),
        TrafficClass::new(1, "ab", a, b),
    ]
    .into_iter()
    .collect();
    let pptc = generate_paths_per_class(&topo, &tm, null_predicate, 4, None, None).unwrap();
    assert_eq!(pptc.len(), 2);
    assert_eq!(pptc.total_paths(), 3);
}

#[test]
fn k_shortest_keeps_the_short_ones() {
    let topo = Topology::complete(4);
    let nodes: Vec<_> = topo.nodes().collect();
    let tc = TrafficClass::new(0, "t", nodes[0], nodes[3]);
    let all = generate_paths(&topo, nodes[0], nodes[3], null_predicate, 4, None, None).unwrap();
    assert!(all.len() > 1);
    let mut pptc = Pptc::new();
    pptc.insert(tc.clone(), all);
    let selected = select_k_shortest(&pptc, 1);
    let kept = selected.get(&tc).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].hops(), 1);
}

#[test]
fn random_selection_is_a_subsequence() {
    let topo = Topology::complete(5);
    let nodes: Vec<_> = topo.nodes().collect();
    let tc = TrafficClass::new(0, "t", nodes[0], nodes[4]);
    let all = generate_paths(&topo, nodes[0], nodes[4], null_predicate, 5, None, None).unwrap();
    let mut pptc = Pptc::new();
    pptc.insert(tc.clone(), all.clone());

    let mut rng = StdRng::seed_from_u64(42);
    let selected = select_random(&pptc, 3, &mut rng);
    let kept = selected.get(&tc).unwrap();
    assert_eq!(kept.len(), 3);
    // surviving paths keep their original relative order
    let positions: Vec<_> = kept
        .iter()
        .map(|p| all.iter().position(|q| q == p).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    // asking for more than available keeps everything
    let mut rng = StdRng::seed_from_u64(42);
    let selected = select_random(&pptc, 1000, &mut rng);
    assert_eq!(selected.get(&tc).unwrap().len(), all.len());
}

#[test]
fn random_selection_is_reproducible_for_a_seed() {
    let topo = Topology::complete(5);
    let nodes: Vec<_> = topo.nodes().collect();
    let tc = TrafficClass::new(0, "t", nodes[0], nodes[4]);
    let all = generate_paths(&topo, nodes[0], nodes[4], null_predicate, 5, None, None).unwrap();
    assert!(all.len() > 3);
    let mut pptc = Pptc::new();
    pptc.insert(tc.clone(), all);

    let mut rng = StdRng::seed_from_u64(7);
    let first = select_random(&pptc, 3, &mut rng);
    let mut rng = StdRng::seed_from_u64(7);
    let second = select_random(&pptc, 3, &mut rng);
    assert_eq!(first.get(&tc).unwrap(), second.get(&tc).unwrap());
}

#[test]
fn strategy_parsing() {
    assert_eq!(
        SelectStrategy::from_str("random").unwrap(),
        SelectStrategy::Random
    );
    assert_eq!(
        SelectStrategy::from_str("K-Shortest").unwrap(),
        SelectStrategy::KShortest
    );
    assert!(matches!(
        SelectStrategy::from_str("bogus"),
        Err(Error::UnknownStrategy(_))
    ));
}

#[test]
fn path_links_and_display() {
    let (_, a, b, _, d) = diamond();
    let path = Path::new(vec![a, b, d]);
    let links: Vec<_> = path.links().collect();
    assert_eq!(links, vec![(a, b), (b, d)]);
    assert!(path.traverses((a, b)));
    assert!(!path.traverses((b, a)));
    assert_eq!(path.to_string(), "0 -> 1 -> 3");
    let annotated = path.with_middleboxes([b]);
    assert_eq!(annotated.to_string(), "0 -> [1] -> 3");
}

#[test]
fn default_cutoff_scales_with_diameter() {
    let topo = Topology::chain(5);
    assert_eq!(topo.diameter(), 4);
    assert_eq!(topo.default_cutoff(), 6);
    assert_eq!(Topology::new().default_cutoff(), 1);
}

#[test]
fn ie_pairs_of_a_complete_topology() {
    let topo = Topology::complete(3);
    let nodes: Vec<_> = topo.nodes().collect();
    let pairs = all_ie_pairs(&topo);
    assert_eq!(
        pairs,
        vec![
            (nodes[0], nodes[1]),
            (nodes[0], nodes[2]),
            (nodes[1], nodes[0]),
            (nodes[1], nodes[2]),
            (nodes[2], nodes[0]),
            (nodes[2], nodes[1]),
        ]
    );
}
