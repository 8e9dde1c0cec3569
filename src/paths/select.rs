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

//! Reduction of an oversupply of candidate paths to a bounded working set.
//!
//! Both strategies return a *new* mapping; the input pptc is never mutated.
//! The random strategy takes the RNG as an argument, so a seeded
//! [`rand::rngs::StdRng`] makes the selection reproducible.

use std::str::FromStr;

use rand::seq::index::sample;
use rand::Rng;

use super::Pptc;
use crate::error::Error;

/// Strategy used to pick a bounded subset of candidate paths per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectStrategy {
    /// Uniform random sample without replacement.
    Random,
    /// The `count` shortest candidates by hop count, ties broken by
    /// generation order.
    KShortest,
}

impl FromStr for SelectStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "k-shortest" | "kshortest" | "shortest" => Ok(Self::KShortest),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// Select at most `count` paths per class using the given strategy.
pub fn select(pptc: &Pptc, count: usize, strategy: SelectStrategy, rng: &mut impl Rng) -> Pptc {
    match strategy {
        SelectStrategy::Random => select_random(pptc, count, rng),
        SelectStrategy::KShortest => select_k_shortest(pptc, count),
    }
}

/// Uniform random sample of `min(count, available)` distinct paths per
/// class. Surviving paths keep their original relative order, so the
/// positional variable index stays deterministic for a fixed seed.
pub fn select_random(pptc: &Pptc, count: usize, rng: &mut impl Rng) -> Pptc {
    pptc.iter()
        .map(|(tc, paths)| {
            let take = count.min(paths.len());
            let mut picked = sample(rng, paths.len(), take).into_vec();
            picked.sort_unstable();
            let selected = picked.into_iter().map(|i| paths[i].clone()).collect();
            (tc.clone(), selected)
        })
        .collect()
}

/// The `min(count, available)` shortest paths per class, ascending by hop
/// count; ties keep the original generation order (stable sort).
pub fn select_k_shortest(pptc: &Pptc, count: usize) -> Pptc {
    pptc.iter()
        .map(|(tc, paths)| {
            let mut sorted = paths.clone();
            sorted.sort_by_key(|p| p.hops());
            sorted.truncate(count);
            (tc.clone(), sorted)
        })
        .collect()
}
